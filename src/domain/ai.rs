/// Ghost AI: where each ghost wants to go this tick.
///
/// Targeting is a pure function of the ghost, the player, and the reference
/// ghost (Blinky). Motion then steers greedily toward the returned tile,
/// see `Ghost::choose_direction`.
///
/// ┌────────────┬──────────────────────────────────────────────────────────┐
/// │ Mode       │ Target                                                   │
/// ├────────────┼──────────────────────────────────────────────────────────┤
/// │ Scatter    │ personality's corner                                     │
/// │ Frightened │ player's tile (steering inverts, so the ghost flees)     │
/// │ Eyes       │ the tile above the door                                  │
/// │ Chase      │ Blinky: player's tile                                    │
/// │            │ Pinky:  4 ahead of the player                            │
/// │            │ Inky:   Blinky + 2 × (2 ahead of the player − Blinky)    │
/// │            │ Clyde:  player's tile if farther than 8, else his corner │
/// └────────────┴──────────────────────────────────────────────────────────┘
///
/// "Ahead" keeps the arcade overflow: facing up also shifts the point the
/// same number of tiles to the left.

use super::ghost::{Ghost, GhostState, Personality, EYES_TARGET};
use super::nav::{Direction, TilePos};
use super::player::Player;

/// Clyde's shyness radius, in tiles.
const CLYDE_RADIUS: i32 = 8;

pub fn target(ghost: &Ghost, player: &Player, reference: Option<&Ghost>) -> TilePos {
    match ghost.state {
        GhostState::ReturningEyes(_) => EYES_TARGET,
        GhostState::Home(_) => ghost.tile(),
        GhostState::Frightened { .. } => player.tile(),
        GhostState::Scattering => ghost.personality.scatter_corner(),
        GhostState::Chasing => chase_target(ghost, player, reference),
    }
}

fn chase_target(ghost: &Ghost, player: &Player, reference: Option<&Ghost>) -> TilePos {
    let p = player.tile();
    match ghost.personality {
        Personality::Blinky => p,
        Personality::Pinky => ahead(p, player.dir, 4),
        Personality::Inky => match reference {
            Some(blinky) => {
                let pivot = ahead(p, player.dir, 2);
                let r = blinky.tile();
                TilePos::new(2 * pivot.x - r.x, 2 * pivot.y - r.y)
            }
            // No Blinky yet: pursue directly.
            None => p,
        },
        Personality::Clyde => {
            if ghost.tile().dist_sq(p) > CLYDE_RADIUS * CLYDE_RADIUS {
                p
            } else {
                ghost.personality.scatter_corner()
            }
        }
    }
}

fn ahead(from: TilePos, facing: Direction, n: i32) -> TilePos {
    let t = from.step(facing, n);
    if facing == Direction::Up {
        t.step(Direction::Left, n)
    } else {
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::nav::Position;

    fn player_at(x: i32, y: i32, dir: Direction) -> Player {
        let mut p = Player::new();
        p.pos = Position::of_tile(TilePos::new(x, y));
        p.dir = dir;
        p
    }

    fn chasing(who: Personality, x: i32, y: i32) -> Ghost {
        let mut g = Ghost::new(who);
        g.state = GhostState::Chasing;
        g.pos = Position::of_tile(TilePos::new(x, y));
        g
    }

    #[test]
    fn blinky_goes_straight_for_the_player() {
        let g = chasing(Personality::Blinky, 1, 1);
        let p = player_at(10, 10, Direction::Left);
        assert_eq!(target(&g, &p, None), TilePos::new(10, 10));
    }

    #[test]
    fn pinky_aims_four_ahead_with_overflow() {
        let g = chasing(Personality::Pinky, 1, 1);
        assert_eq!(target(&g, &player_at(10, 10, Direction::Right), None), TilePos::new(14, 10));
        assert_eq!(target(&g, &player_at(10, 10, Direction::Down), None), TilePos::new(10, 14));
        assert_eq!(target(&g, &player_at(10, 10, Direction::Up), None), TilePos::new(6, 6));
    }

    #[test]
    fn inky_doubles_the_vector_from_blinky() {
        let inky = chasing(Personality::Inky, 1, 1);
        let blinky = chasing(Personality::Blinky, 8, 10);
        // Pivot is (12,10); Blinky→pivot is (+4,0); doubled lands at (16,10).
        let p = player_at(10, 10, Direction::Right);
        assert_eq!(target(&inky, &p, Some(&blinky)), TilePos::new(16, 10));

        // Facing up: pivot (8,8), vector (0,-2), target (8,6).
        let p = player_at(10, 10, Direction::Up);
        assert_eq!(target(&inky, &p, Some(&blinky)), TilePos::new(8, 6));
    }

    #[test]
    fn inky_without_blinky_pursues_directly() {
        let inky = chasing(Personality::Inky, 1, 1);
        let p = player_at(10, 10, Direction::Right);
        assert_eq!(target(&inky, &p, None), TilePos::new(10, 10));
    }

    #[test]
    fn clyde_backs_off_at_eight_tiles() {
        let p = player_at(10, 20, Direction::Left);
        let corner = Personality::Clyde.scatter_corner();

        let far = chasing(Personality::Clyde, 10, 11); // 9 tiles
        assert_eq!(target(&far, &p, None), TilePos::new(10, 20));

        let edge = chasing(Personality::Clyde, 10, 12); // exactly 8
        assert_eq!(target(&edge, &p, None), corner);

        let near = chasing(Personality::Clyde, 10, 17);
        assert_eq!(target(&near, &p, None), corner);
    }

    #[test]
    fn mode_overrides_personality() {
        let p = player_at(10, 10, Direction::Right);

        let mut g = chasing(Personality::Pinky, 3, 3);
        g.state = GhostState::Scattering;
        assert_eq!(target(&g, &p, None), TilePos::new(2, 0));

        g.state = GhostState::Frightened { blinking: false };
        assert_eq!(target(&g, &p, None), TilePos::new(10, 10));

        g.send_home();
        assert_eq!(target(&g, &p, None), EYES_TARGET);
    }
}
