pub mod ai;
pub mod ghost;
pub mod maze;
pub mod mode;
pub mod nav;
pub mod player;
pub mod rules;
pub mod tile;
pub mod timer;
