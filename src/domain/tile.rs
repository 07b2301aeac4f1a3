/// Tile kinds and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Tile {
    #[default]
    Empty,
    Wall,
    Pellet,
    PowerPellet,
    GhostDoor, // only ghosts may cross, and only as eyes
    Tunnel,    // walkable; slows ghosts
}

impl Tile {
    /// Layout symbol → tile. `None` for anything the maze format doesn't know.
    pub fn from_symbol(c: char) -> Option<Tile> {
        match c {
            ' ' => Some(Tile::Empty),
            '#' => Some(Tile::Wall),
            '.' => Some(Tile::Pellet),
            'o' => Some(Tile::PowerPellet),
            '-' => Some(Tile::GhostDoor),
            'T' => Some(Tile::Tunnel),
            _ => None,
        }
    }

    pub fn is_wall(self) -> bool {
        matches!(self, Tile::Wall)
    }

    /// Does this tile still carry something edible?
    pub fn is_pellet(self) -> bool {
        matches!(self, Tile::Pellet | Tile::PowerPellet)
    }

    pub fn is_door(self) -> bool {
        matches!(self, Tile::GhostDoor)
    }

    pub fn is_tunnel(self) -> bool {
        matches!(self, Tile::Tunnel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_cover_every_kind() {
        let kinds: Vec<Tile> = " #.o-T".chars().filter_map(Tile::from_symbol).collect();
        assert_eq!(kinds, vec![
            Tile::Empty, Tile::Wall, Tile::Pellet,
            Tile::PowerPellet, Tile::GhostDoor, Tile::Tunnel,
        ]);
        assert_eq!(Tile::from_symbol('x'), None);
    }

    #[test]
    fn pellet_kinds() {
        assert!(Tile::Pellet.is_pellet());
        assert!(Tile::PowerPellet.is_pellet());
        assert!(!Tile::Tunnel.is_pellet());
    }
}
