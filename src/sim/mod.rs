//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Virtual millisecond clock only (see `timers::Scheduler`)
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod collision;
pub mod events;
pub mod machine;
pub mod spawn;
pub mod state;
pub mod timers;

#[cfg(test)]
mod tests;

pub use autopilot::should_jump;
pub use collision::{Aabb, SweepVerdict, sweep_entity};
pub use events::{BannerTiming, GameEvent, SoundEvent};
pub use machine::{Game, RunEnd};
pub use spawn::{Spawner, select_collectible};
pub use state::{
    Entity, EntityId, EntityKind, GamePhase, Player, RemovalReason, RunState, RunStats, Stage,
    velocity_for,
};
pub use timers::{Fired, Scheduler, TimerId, TimerKind};
