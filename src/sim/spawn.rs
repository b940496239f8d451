//! Obstacle and collectible spawning
//!
//! Two independent repeating schedules. Whenever the run's speed or spawn rate
//! changes the pair is torn down and re-armed at the new period; entities that
//! are already on the field keep the velocity they were given.

use std::collections::BTreeSet;

use glam::Vec2;

use super::state::{Entity, EntityId, EntityKind, Stage, velocity_for};
use super::timers::{Scheduler, TimerId, TimerKind};
use crate::consts::*;
use crate::tuning::Tuning;

/// Handles for the two spawn timers
#[derive(Debug, Clone, Default)]
pub struct Spawner {
    obstacle: Option<TimerId>,
    collectible: Option<TimerId>,
}

impl Spawner {
    /// Arm both schedules. Any previous pair is cancelled first.
    pub fn start(&mut self, sched: &mut Scheduler, spawn_rate_ms: u32, collectible_offset_ms: u32) {
        self.stop(sched);
        let rate = u64::from(spawn_rate_ms);
        self.obstacle = Some(sched.repeating(TimerKind::SpawnObstacle, rate));
        self.collectible = Some(sched.repeating(
            TimerKind::SpawnCollectible,
            rate + u64::from(collectible_offset_ms),
        ));
    }

    pub fn stop(&mut self, sched: &mut Scheduler) {
        sched.cancel_slot(&mut self.obstacle);
        sched.cancel_slot(&mut self.collectible);
    }

    pub fn is_running(&self) -> bool {
        self.obstacle.is_some() || self.collectible.is_some()
    }

    /// Forget the handles without touching the scheduler (after `Scheduler::clear`)
    pub fn reset(&mut self) {
        self.obstacle = None;
        self.collectible = None;
    }
}

/// Pick a collectible kind for a uniform draw `r` in [0, 1).
///
/// Jasmine is only possible while `stage` has not produced one yet; picking
/// it marks the stage consumed.
pub fn select_collectible(
    r: f64,
    stage: Stage,
    jasmine_stages: &mut BTreeSet<Stage>,
    tuning: &Tuning,
) -> EntityKind {
    if r < tuning.jasmine_chance && !jasmine_stages.contains(&stage) {
        jasmine_stages.insert(stage);
        EntityKind::Jasmine
    } else if r < tuning.moon_below {
        EntityKind::Moon
    } else if r < tuning.coffee_below {
        EntityKind::Coffee
    } else {
        EntityKind::Laptop
    }
}

pub fn make_obstacle(id: EntityId, now_ms: u64, speed_ms: u32, variant: u8) -> Entity {
    Entity {
        id,
        kind: EntityKind::Obstacle,
        spawned_at_ms: now_ms,
        pos: Vec2::new(VIEWPORT_WIDTH, GROUND_Y),
        size: Vec2::splat(OBSTACLE_SIZE),
        vel_x: velocity_for(OBSTACLE_SIZE, speed_ms),
        variant: variant % OBSTACLE_VARIANTS,
    }
}

/// `lane` in [0, 1) picks the height band
pub fn make_collectible(
    id: EntityId,
    kind: EntityKind,
    now_ms: u64,
    speed_ms: u32,
    lane: f32,
) -> Entity {
    Entity {
        id,
        kind,
        spawned_at_ms: now_ms,
        pos: Vec2::new(
            VIEWPORT_WIDTH,
            COLLECTIBLE_MIN_Y + lane.clamp(0.0, 1.0) * COLLECTIBLE_Y_RANGE,
        ),
        size: Vec2::splat(COLLECTIBLE_SIZE),
        vel_x: velocity_for(COLLECTIBLE_SIZE, speed_ms),
        variant: 0,
    }
}
