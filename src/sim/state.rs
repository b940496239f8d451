//! Run state and core simulation types
//!
//! Everything the presentation layer needs to draw a frame lives here.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use crate::consts::*;
use crate::tuning::Tuning;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Start screen, nothing scheduled
    #[default]
    Idle,
    /// Commuting through the three timed stages
    Running,
    /// Arrived at the office; waiting for the overtime jumps
    OfficeReached,
    /// Endless mode with ramping difficulty
    Overtime,
    /// Run over, state frozen for the results screen
    Ended,
}

impl GamePhase {
    /// Spawning, collisions and the jump action only happen in these phases
    pub fn is_active(self) -> bool {
        matches!(self, GamePhase::Running | GamePhase::Overtime)
    }
}

/// The three legs of the commute
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    Street = 1,
    Subway = 2,
    Downtown = 3,
}

impl Stage {
    pub fn number(self) -> u8 {
        self as u8
    }

    /// Banner text shown when the stage begins
    pub fn label(self) -> &'static str {
        match self {
            Stage::Street => "STREET",
            Stage::Subway => "🚇 ENTERING SUBWAY",
            Stage::Downtown => "🌇 BACK TO STREETS",
        }
    }

    pub fn is_underground(self) -> bool {
        self == Stage::Subway
    }
}

/// Spawned thing kinds. Everything except `Obstacle` is a collectible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Obstacle,
    Moon,
    Coffee,
    Laptop,
    /// Rare extra life, at most one per stage
    Jasmine,
}

impl EntityKind {
    pub fn is_collectible(self) -> bool {
        self != EntityKind::Obstacle
    }
}

pub type EntityId = u32;

/// Why an entity left the field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalReason {
    /// Obstacle touched the player
    Hit,
    /// Collectible picked up
    Collected,
    /// Trailing edge passed the left threshold
    Offscreen,
    /// Run left the active phases (office, end, restart)
    RunInactive,
}

/// An obstacle or collectible scrolling toward the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    /// Virtual time of creation (ms)
    pub spawned_at_ms: u64,
    /// Bottom-left corner
    pub pos: Vec2,
    pub size: Vec2,
    /// Horizontal velocity in px/ms (negative = leftward), fixed at spawn
    pub vel_x: f32,
    /// Cosmetic variant index (obstacle glyph)
    pub variant: u8,
}

impl Entity {
    pub fn bounds(&self) -> Aabb {
        Aabb::from_bottom_left(self.pos, self.size)
    }

    pub fn right_edge(&self) -> f32 {
        self.pos.x + self.size.x
    }

    /// Move by `dt_ms` worth of velocity
    pub fn advance(&mut self, dt_ms: u64) {
        self.pos.x += self.vel_x * dt_ms as f32;
    }

    pub fn is_offscreen(&self) -> bool {
        self.right_edge() < OFFSCREEN_X
    }
}

/// Horizontal speed (px/ms) for an entity of `width` crossing the field in `speed_ms`
pub fn velocity_for(width: f32, speed_ms: u32) -> f32 {
    let travel = VIEWPORT_WIDTH + width - OFFSCREEN_X;
    -travel / speed_ms.max(1) as f32
}

/// The runner
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Player {
    /// Inside the fixed jump window
    pub jumping: bool,
    /// Laptop glow (cosmetic)
    pub buffed: bool,
}

impl Player {
    pub fn bottom(&self) -> f32 {
        if self.jumping { JUMP_Y } else { GROUND_Y }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_bottom_left(
            Vec2::new(PLAYER_X, self.bottom()),
            Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT),
        )
    }
}

/// All counters of a run. Owned and mutated by `Game` only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub lives: u32,
    pub moons: u32,
    pub coffee_count: u32,
    pub laptop_count: u32,
    pub elapsed_seconds: u32,
    pub stage: Stage,
    pub reached_office: bool,
    pub overtime_active: bool,
    pub jumps_since_office: u32,
    pub obstacle_speed_ms: u32,
    pub spawn_rate_ms: u32,
    pub power_up_active: bool,
    pub invulnerable: bool,
    /// Stages that already produced their Jasmine
    pub jasmine_collected_per_stage: BTreeSet<Stage>,
}

impl RunState {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            lives: tuning.starting_lives,
            moons: 0,
            coffee_count: 0,
            laptop_count: 0,
            elapsed_seconds: 0,
            stage: Stage::Street,
            reached_office: false,
            overtime_active: false,
            jumps_since_office: 0,
            obstacle_speed_ms: tuning.start_obstacle_speed_ms,
            spawn_rate_ms: tuning.start_spawn_rate_ms,
            power_up_active: false,
            invulnerable: false,
            jasmine_collected_per_stage: BTreeSet::new(),
        }
    }

    pub fn stats(&self) -> RunStats {
        RunStats {
            moons: self.moons,
            coffee: self.coffee_count,
            laptops: self.laptop_count,
            elapsed_seconds: self.elapsed_seconds,
            lives: self.lives,
        }
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new(&Tuning::default())
    }
}

/// Final numbers for the results screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub moons: u32,
    pub coffee: u32,
    pub laptops: u32,
    pub elapsed_seconds: u32,
    pub lives: u32,
}

impl RunStats {
    /// Results screen title and message
    pub fn headline(was_overtime: bool) -> (&'static str, &'static str) {
        if was_overtime {
            ("💥 Overtime Ended!", "Amazing effort in overtime!")
        } else {
            ("🎯 Mission Complete!", "Congratulations on reaching the office!")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_velocity_crosses_field_in_speed() {
        let vel = velocity_for(OBSTACLE_SIZE, 3000);
        let mut entity = Entity {
            id: 1,
            kind: EntityKind::Obstacle,
            spawned_at_ms: 0,
            pos: Vec2::new(VIEWPORT_WIDTH, GROUND_Y),
            size: Vec2::splat(OBSTACLE_SIZE),
            vel_x: vel,
            variant: 0,
        };
        entity.advance(2990);
        assert!(!entity.is_offscreen());
        entity.advance(20);
        assert!(entity.is_offscreen());
    }

    #[test]
    fn test_player_box_follows_jump() {
        let mut player = Player::default();
        assert_eq!(player.bounds().min.y, GROUND_Y);
        player.jumping = true;
        assert_eq!(player.bounds().min.y, JUMP_Y);
        assert_eq!(player.bounds().max.y, JUMP_Y + PLAYER_HEIGHT);
    }

    #[test]
    fn test_fresh_run_defaults() {
        let state = RunState::default();
        assert_eq!(state.stage, Stage::Street);
        assert_eq!(state.obstacle_speed_ms, 3000);
        assert_eq!(state.spawn_rate_ms, 2000);
        assert_eq!(state.lives, 0);
        assert!(state.jasmine_collected_per_stage.is_empty());
    }
}
