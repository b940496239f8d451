//! Data-driven game balance
//!
//! Every number that shapes a run. Defaults reproduce the shipped game; a JSON
//! document can override any subset of fields.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be greater than zero")]
    NonPositive { field: &'static str },
    #[error("stage times must increase: subway {subway}s, downtown {downtown}s, office {office}s")]
    StageOrder { subway: u32, downtown: u32, office: u32 },
    #[error("collectible thresholds must satisfy 0 <= jasmine <= moon <= coffee <= 1")]
    Probability,
    #[error("power-up speed factor must be in (0, 1], got {0}")]
    Factor(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Run start ===
    pub starting_lives: u32,
    pub start_obstacle_speed_ms: u32,
    pub start_spawn_rate_ms: u32,
    /// Collectibles spawn this much slower than obstacles
    pub collectible_spawn_offset_ms: u32,

    // === Stage clock (seconds) ===
    pub subway_at_secs: u32,
    pub downtown_at_secs: u32,
    pub office_at_secs: u32,

    // === Overtime ===
    pub overtime_jumps: u32,
    pub overtime_obstacle_speed_ms: u32,
    pub overtime_spawn_rate_ms: u32,
    pub ramp_interval_ms: u32,
    pub ramp_step_ms: u32,
    pub ramp_floor_ms: u32,

    // === Player ===
    pub jump_ms: u32,
    pub invulnerability_ms: u32,

    // === Power-ups ===
    pub power_up_factor: f64,
    pub power_up_ms: u32,
    pub laptop_buff_ms: u32,

    // === Collectible odds (cumulative thresholds on r in [0, 1)) ===
    pub jasmine_chance: f64,
    pub moon_below: f64,
    pub coffee_below: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            starting_lives: 0,
            start_obstacle_speed_ms: 3000,
            start_spawn_rate_ms: 2000,
            collectible_spawn_offset_ms: 500,

            subway_at_secs: 30,
            downtown_at_secs: 60,
            office_at_secs: 90,

            overtime_jumps: 2,
            overtime_obstacle_speed_ms: 2000,
            overtime_spawn_rate_ms: 1500,
            ramp_interval_ms: 5000,
            ramp_step_ms: 100,
            ramp_floor_ms: 800,

            jump_ms: 600,
            invulnerability_ms: 1500,

            power_up_factor: 0.6,
            power_up_ms: 3000,
            laptop_buff_ms: 3000,

            jasmine_chance: 0.15,
            moon_below: 0.50,
            coffee_below: 0.75,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON override and validate it
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        let periods = [
            ("start_obstacle_speed_ms", self.start_obstacle_speed_ms),
            ("start_spawn_rate_ms", self.start_spawn_rate_ms),
            ("overtime_obstacle_speed_ms", self.overtime_obstacle_speed_ms),
            ("overtime_spawn_rate_ms", self.overtime_spawn_rate_ms),
            ("ramp_interval_ms", self.ramp_interval_ms),
            ("ramp_floor_ms", self.ramp_floor_ms),
            ("jump_ms", self.jump_ms),
            ("power_up_ms", self.power_up_ms),
            ("overtime_jumps", self.overtime_jumps),
        ];
        if let Some((field, _)) = periods.iter().find(|(_, v)| *v == 0) {
            return Err(TuningError::NonPositive { field: *field });
        }

        if !(0 < self.subway_at_secs
            && self.subway_at_secs < self.downtown_at_secs
            && self.downtown_at_secs < self.office_at_secs)
        {
            return Err(TuningError::StageOrder {
                subway: self.subway_at_secs,
                downtown: self.downtown_at_secs,
                office: self.office_at_secs,
            });
        }

        let ordered = 0.0 <= self.jasmine_chance
            && self.jasmine_chance <= self.moon_below
            && self.moon_below <= self.coffee_below
            && self.coffee_below <= 1.0;
        if !ordered {
            return Err(TuningError::Probability);
        }

        if !(self.power_up_factor > 0.0 && self.power_up_factor <= 1.0) {
            return Err(TuningError::Factor(self.power_up_factor));
        }

        Ok(())
    }
}
