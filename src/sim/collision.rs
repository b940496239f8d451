//! Collision detection for scrolling entities
//!
//! Everything is an axis-aligned box. Obstacle checks shrink the player box by
//! a forgiveness margin so grazing contact does not count; collectibles use the
//! exact box.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::Entity;

/// Axis-aligned bounding box (y grows upward from the floor)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn from_bottom_left(pos: Vec2, size: Vec2) -> Self {
        Self {
            min: pos,
            max: pos + size,
        }
    }

    /// Shrink every side by `margin`
    pub fn inset(&self, margin: f32) -> Self {
        Self {
            min: self.min + Vec2::splat(margin),
            max: self.max - Vec2::splat(margin),
        }
    }

    /// Strict overlap; boxes that only share an edge do not touch
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

/// Outcome of one sweep over a live entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepVerdict {
    /// Box overlaps the player; fire the collision callback
    Touching,
    /// Trailing edge left the field
    Offscreen,
}

/// Check one entity against the player box.
///
/// Returns `None` while the entity should keep scrolling. Contact is tested
/// before the off-screen threshold so an entity can never produce both.
pub fn sweep_entity(entity: &Entity, player: &Aabb, hit_margin: f32) -> Option<SweepVerdict> {
    let player = if entity.kind.is_collectible() {
        *player
    } else {
        player.inset(hit_margin)
    };

    if player.overlaps(&entity.bounds()) {
        Some(SweepVerdict::Touching)
    } else if entity.is_offscreen() {
        Some(SweepVerdict::Offscreen)
    } else {
        None
    }
}
