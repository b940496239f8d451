//! Outbound notifications for the presentation layer
//!
//! The simulation never calls into rendering or audio directly; it queues
//! events that the front end drains after each `Game::advance`.

use serde::Serialize;

use super::state::{Entity, EntityId, RemovalReason, RunState, RunStats, Stage};

/// Sound cues, one per gameplay moment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SoundEvent {
    Jump,
    /// Moon collected
    Collect,
    Coffee,
    Laptop,
    Jasmine,
    Crash,
    /// Office reached
    Victory,
    Overtime,
}

/// Fire-and-forget messages to the front end
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    /// Counters changed
    DisplayUpdate { state: RunState },
    StageChanged { stage: Stage, label: &'static str },
    EntitySpawned { entity: Entity },
    EntityRemoved { id: EntityId, reason: RemovalReason },
    Sound { sound: SoundEvent },
    PlayerJumped,
    PlayerLanded,
    InvulnerabilityChanged { active: bool },
    /// Laptop glow on/off
    PlayerBuffChanged { active: bool },
    OfficeReached { prompt: &'static str },
    OvertimeStarted { banner: &'static str },
    RunEnded { stats: RunStats, was_overtime: bool },
}

pub const OFFICE_PROMPT: &str = "Press JUMP twice for OVERTIME MODE!";
pub const OVERTIME_BANNER: &str = "OVERTIME!";

/// When a banner appears and how long it stays, in ms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BannerTiming {
    pub delay_ms: u32,
    pub lifetime_ms: u32,
}

impl GameEvent {
    /// Banner text and timing for events that put one on screen
    pub fn banner(&self) -> Option<(&'static str, BannerTiming)> {
        match self {
            // The first street stage starts silently
            GameEvent::StageChanged { stage, label } if stage.number() > 1 => Some((
                *label,
                BannerTiming {
                    delay_ms: 0,
                    lifetime_ms: 2000,
                },
            )),
            // Waits for the building to slide in
            GameEvent::OfficeReached { prompt } => Some((
                *prompt,
                BannerTiming {
                    delay_ms: 1500,
                    lifetime_ms: 2000,
                },
            )),
            GameEvent::OvertimeStarted { banner } => Some((
                *banner,
                BannerTiming {
                    delay_ms: 0,
                    lifetime_ms: 3000,
                },
            )),
            _ => None,
        }
    }
}
