pub mod event;
pub mod ports;
pub mod save;
pub mod step;
pub mod world;
