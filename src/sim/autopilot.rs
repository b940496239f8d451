//! Demo-mode player
//!
//! Jumps as soon as an obstacle is about to enter the hit zone. Used by the
//! headless runner and the attract screen.

use super::state::{Entity, EntityKind, Player};
use crate::consts::*;

/// True when a jump issued now clears the nearest incoming obstacle.
///
/// `step_ms` is how often the caller polls; the lookahead covers two polls so
/// a fast obstacle cannot skip past the trigger between calls.
pub fn should_jump(player: &Player, entities: &[Entity], step_ms: u64) -> bool {
    if player.jumping {
        return false;
    }

    let hit_front = PLAYER_X + PLAYER_WIDTH - HIT_MARGIN;
    let hit_back = PLAYER_X + HIT_MARGIN;

    entities
        .iter()
        .filter(|e| e.kind == EntityKind::Obstacle)
        .any(|e| {
            let lead = e.vel_x.abs() * (step_ms * 2) as f32 + 1.0;
            e.right_edge() > hit_back && e.pos.x <= hit_front + lead
        })
}
