//! Game state machine
//!
//! `Game` owns the run: counters, live entities, the timer queue and the RNG.
//! Timers, the sweep pass and the two inbound commands are the only things
//! that mutate it. Phases:
//!
//! ```text
//! Idle -> Running -> OfficeReached -> Overtime -> Ended
//!            \______________________________/^
//! ```

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use super::autopilot::should_jump;
use super::collision::{SweepVerdict, sweep_entity};
use super::events::{GameEvent, OFFICE_PROMPT, OVERTIME_BANNER, SoundEvent};
use super::spawn::{Spawner, make_collectible, make_obstacle, select_collectible};
use super::state::{
    Entity, EntityId, EntityKind, GamePhase, Player, RemovalReason, RunState, RunStats, Stage,
};
use super::timers::{Fired, Scheduler, TimerId, TimerKind};
use crate::consts::*;
use crate::tuning::Tuning;

/// How the last run finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunEnd {
    pub stats: RunStats,
    pub was_overtime: bool,
}

pub struct Game {
    tuning: Tuning,
    seed: u64,
    rng: Pcg32,
    sched: Scheduler,
    phase: GamePhase,
    state: RunState,
    player: Player,
    /// Live entities, ascending id
    entities: Vec<Entity>,
    events: Vec<GameEvent>,
    next_id: EntityId,

    spawner: Spawner,
    clock: Option<TimerId>,
    sweep: Option<TimerId>,
    ramp: Option<TimerId>,
    jump: Option<TimerId>,
    power_up: Option<TimerId>,
    invulnerability: Option<TimerId>,
    buff: Option<TimerId>,

    /// Obstacle speed saved when the power-up kicked in
    power_up_restore_ms: Option<u32>,
    last_end: Option<RunEnd>,
}

impl Game {
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        let state = RunState::new(&tuning);
        Self {
            tuning,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            sched: Scheduler::new(),
            phase: GamePhase::Idle,
            state,
            player: Player::default(),
            entities: Vec::new(),
            events: Vec::new(),
            next_id: 1,
            spawner: Spawner::default(),
            clock: None,
            sweep: None,
            ramp: None,
            jump: None,
            power_up: None,
            invulnerability: None,
            buff: None,
            power_up_restore_ms: None,
            last_end: None,
        }
    }

    // === Accessors ===

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Virtual time in ms since the game was created
    pub fn now_ms(&self) -> u64 {
        self.sched.now()
    }

    pub fn last_end(&self) -> Option<RunEnd> {
        self.last_end
    }

    /// Events queued since the last drain
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Demo mode: should the runner jump right now?
    pub fn autopilot_wants_jump(&self, step_ms: u64) -> bool {
        self.phase.is_active() && should_jump(&self.player, &self.entities, step_ms)
    }

    // === Inbound commands ===

    /// Reset every counter and begin a fresh run
    pub fn start(&mut self) {
        self.sched.clear();
        self.spawner.reset();
        self.clock = None;
        self.sweep = None;
        self.ramp = None;
        self.jump = None;
        self.power_up = None;
        self.invulnerability = None;
        self.buff = None;
        self.power_up_restore_ms = None;
        self.purge_entities();

        self.state = RunState::new(&self.tuning);
        self.player = Player::default();
        self.last_end = None;
        self.phase = GamePhase::Running;
        log::info!("Run started (seed {})", self.seed);

        self.emit(GameEvent::StageChanged {
            stage: Stage::Street,
            label: Stage::Street.label(),
        });
        self.emit_display();

        self.clock = Some(self.sched.repeating(TimerKind::ClockTick, CLOCK_TICK_MS));
        self.spawner.start(
            &mut self.sched,
            self.state.spawn_rate_ms,
            self.tuning.collectible_spawn_offset_ms,
        );
        self.sweep = Some(self.sched.repeating(TimerKind::Sweep, SWEEP_INTERVAL_MS));
    }

    /// Same as `start`; leftover entities are removed first
    pub fn restart(&mut self) {
        self.start();
    }

    /// Jump button. At the office it counts toward overtime instead.
    pub fn jump_command(&mut self) {
        match self.phase {
            GamePhase::Idle | GamePhase::Ended => {
                log::debug!("Jump ignored in {:?}", self.phase);
            }
            GamePhase::OfficeReached => {
                self.state.jumps_since_office += 1;
                if self.state.jumps_since_office >= self.tuning.overtime_jumps {
                    self.start_overtime();
                } else {
                    self.emit_display();
                }
            }
            GamePhase::Running | GamePhase::Overtime => {
                if self.player.jumping {
                    return;
                }
                self.player.jumping = true;
                self.emit(GameEvent::Sound {
                    sound: SoundEvent::Jump,
                });
                self.emit(GameEvent::PlayerJumped);
                self.jump = Some(
                    self.sched
                        .once(TimerKind::JumpLanded, u64::from(self.tuning.jump_ms)),
                );
            }
        }
    }

    /// Advance virtual time, firing every timer that comes due on the way
    pub fn advance(&mut self, dt_ms: u64) {
        let until = self.sched.now() + dt_ms;
        while let Some(fired) = self.sched.pop_due(until) {
            self.dispatch(fired);
        }
        self.sched.settle(until);
    }

    // === Clock ===

    /// One game second. Only counts while running toward the office.
    pub fn on_tick(&mut self) {
        if self.phase != GamePhase::Running {
            log::debug!("Tick ignored in {:?}", self.phase);
            return;
        }

        self.state.elapsed_seconds += 1;
        self.emit_display();

        let secs = self.state.elapsed_seconds;
        if secs == self.tuning.subway_at_secs && self.state.stage == Stage::Street {
            self.change_stage(Stage::Subway);
        } else if secs == self.tuning.downtown_at_secs && self.state.stage == Stage::Subway {
            self.change_stage(Stage::Downtown);
        } else if secs == self.tuning.office_at_secs && !self.state.reached_office {
            self.reach_office();
        }
    }

    // === Collisions ===

    /// The player touched an entity of `kind`
    pub fn on_collision(&mut self, kind: EntityKind) {
        if !self.phase.is_active() {
            return;
        }

        if kind.is_collectible() {
            self.collect(kind);
            return;
        }

        if self.state.invulnerable {
            log::debug!("Hit ignored (invulnerable)");
            return;
        }

        self.emit(GameEvent::Sound {
            sound: SoundEvent::Crash,
        });

        if self.state.lives > 0 {
            self.state.lives -= 1;
            self.state.invulnerable = true;
            self.sched.cancel_slot(&mut self.invulnerability);
            self.invulnerability = Some(self.sched.once(
                TimerKind::InvulnerabilityExpired,
                u64::from(self.tuning.invulnerability_ms),
            ));
            log::debug!("Hit, {} lives left", self.state.lives);
            self.emit(GameEvent::InvulnerabilityChanged { active: true });
            self.emit_display();
        } else {
            self.end(self.phase == GamePhase::Overtime);
        }
    }

    /// Finish the run and freeze the counters. No-op before start or after end.
    pub fn end(&mut self, was_overtime: bool) {
        if matches!(self.phase, GamePhase::Idle | GamePhase::Ended) {
            return;
        }

        self.phase = GamePhase::Ended;
        self.state.overtime_active = false;

        // Nothing may touch the frozen state
        self.sched.clear();
        self.spawner.reset();
        self.clock = None;
        self.sweep = None;
        self.ramp = None;
        self.jump = None;
        self.power_up = None;
        self.invulnerability = None;
        self.buff = None;
        self.purge_entities();

        let stats = self.state.stats();
        self.last_end = Some(RunEnd {
            stats,
            was_overtime,
        });
        log::info!(
            "Run ended at {}s (overtime: {}): {} moons, {} coffee, {} laptops",
            stats.elapsed_seconds,
            was_overtime,
            stats.moons,
            stats.coffee,
            stats.laptops
        );
        self.emit(GameEvent::RunEnded {
            stats,
            was_overtime,
        });
    }

    // === Timer dispatch ===

    fn dispatch(&mut self, fired: Fired) {
        match fired.kind {
            TimerKind::ClockTick => self.on_tick(),
            TimerKind::SpawnObstacle => self.spawn_obstacle(),
            TimerKind::SpawnCollectible => self.spawn_collectible(),
            TimerKind::Sweep => self.sweep_entities(),
            TimerKind::JumpLanded => {
                self.jump = None;
                self.player.jumping = false;
                self.emit(GameEvent::PlayerLanded);
            }
            TimerKind::PowerUpExpired => {
                self.power_up = None;
                self.expire_power_up();
            }
            TimerKind::InvulnerabilityExpired => {
                self.invulnerability = None;
                self.state.invulnerable = false;
                self.emit(GameEvent::InvulnerabilityChanged { active: false });
            }
            TimerKind::PlayerBuffExpired => {
                self.buff = None;
                self.player.buffed = false;
                self.emit(GameEvent::PlayerBuffChanged { active: false });
            }
            TimerKind::DifficultyRamp => self.ramp_difficulty(),
        }
    }

    // === Stage progression ===

    fn change_stage(&mut self, stage: Stage) {
        self.state.stage = stage;
        log::info!("Stage {}: {}", stage.number(), stage.label());
        self.emit(GameEvent::StageChanged {
            stage,
            label: stage.label(),
        });
    }

    fn reach_office(&mut self) {
        self.state.reached_office = true;
        self.phase = GamePhase::OfficeReached;

        self.sched.cancel_slot(&mut self.clock);
        self.sched.cancel_slot(&mut self.sweep);
        self.spawner.stop(&mut self.sched);
        self.purge_entities();

        log::info!("Reached the office at {}s", self.state.elapsed_seconds);
        self.emit(GameEvent::Sound {
            sound: SoundEvent::Victory,
        });
        self.emit(GameEvent::OfficeReached {
            prompt: OFFICE_PROMPT,
        });
        self.emit_display();
    }

    fn start_overtime(&mut self) {
        self.phase = GamePhase::Overtime;
        self.state.overtime_active = true;
        self.state.jumps_since_office = 0;

        // Overtime sets its own speed; a pending restore would undo it
        self.sched.cancel_slot(&mut self.power_up);
        self.power_up_restore_ms = None;
        self.state.power_up_active = false;

        self.state.obstacle_speed_ms = self.tuning.overtime_obstacle_speed_ms;
        self.state.spawn_rate_ms = self.tuning.overtime_spawn_rate_ms;

        log::info!("Overtime!");
        self.emit(GameEvent::OvertimeStarted {
            banner: OVERTIME_BANNER,
        });
        self.emit(GameEvent::Sound {
            sound: SoundEvent::Overtime,
        });

        // The clock stays stopped: overtime keeps the office arrival time
        self.respawn_schedules();
        self.sweep = Some(self.sched.repeating(TimerKind::Sweep, SWEEP_INTERVAL_MS));
        self.ramp = Some(self.sched.repeating(
            TimerKind::DifficultyRamp,
            u64::from(self.tuning.ramp_interval_ms),
        ));
        self.emit_display();
    }

    fn ramp_difficulty(&mut self) {
        if self.phase != GamePhase::Overtime {
            self.sched.cancel_slot(&mut self.ramp);
            return;
        }

        let step = self.tuning.ramp_step_ms;
        let floor = self.tuning.ramp_floor_ms;
        self.state.obstacle_speed_ms = self.state.obstacle_speed_ms.saturating_sub(step).max(floor);
        self.state.spawn_rate_ms = self.state.spawn_rate_ms.saturating_sub(step).max(floor);
        log::debug!(
            "Difficulty ramp: speed {}ms, spawn {}ms",
            self.state.obstacle_speed_ms,
            self.state.spawn_rate_ms
        );
        self.respawn_schedules();
        self.emit_display();
    }

    /// Re-arm both spawn timers at the current rate (active phases only)
    fn respawn_schedules(&mut self) {
        if self.phase.is_active() {
            self.spawner.start(
                &mut self.sched,
                self.state.spawn_rate_ms,
                self.tuning.collectible_spawn_offset_ms,
            );
        }
    }

    // === Spawning ===

    fn alloc_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn spawn_obstacle(&mut self) {
        if !self.phase.is_active() {
            return;
        }
        let variant = self.rng.random_range(0..OBSTACLE_VARIANTS);
        let id = self.alloc_id();
        let entity = make_obstacle(id, self.sched.now(), self.state.obstacle_speed_ms, variant);
        log::debug!("Spawn obstacle #{} at {}ms", id, entity.spawned_at_ms);
        self.entities.push(entity.clone());
        self.emit(GameEvent::EntitySpawned { entity });
    }

    fn spawn_collectible(&mut self) {
        if !self.phase.is_active() {
            return;
        }
        let r: f64 = self.rng.random();
        let kind = select_collectible(
            r,
            self.state.stage,
            &mut self.state.jasmine_collected_per_stage,
            &self.tuning,
        );
        let lane: f32 = self.rng.random();
        let id = self.alloc_id();
        let entity = make_collectible(id, kind, self.sched.now(), self.state.obstacle_speed_ms, lane);
        log::debug!("Spawn {:?} #{} at {}ms", kind, id, entity.spawned_at_ms);
        self.entities.push(entity.clone());
        self.emit(GameEvent::EntitySpawned { entity });
    }

    // === Sweep ===

    /// Move everything one sweep step, then resolve contacts and exits
    fn sweep_entities(&mut self) {
        if !self.phase.is_active() {
            self.sched.cancel_slot(&mut self.sweep);
            return;
        }

        for entity in &mut self.entities {
            entity.advance(SWEEP_INTERVAL_MS);
        }

        let player_box = self.player.bounds();
        let verdicts: Vec<_> = self
            .entities
            .iter()
            .filter_map(|e| sweep_entity(e, &player_box, HIT_MARGIN).map(|v| (e.id, e.kind, v)))
            .collect();

        for (id, kind, verdict) in verdicts {
            let reason = match verdict {
                SweepVerdict::Offscreen => RemovalReason::Offscreen,
                SweepVerdict::Touching if kind.is_collectible() => RemovalReason::Collected,
                SweepVerdict::Touching => RemovalReason::Hit,
            };
            // Already gone if an earlier hit in this pass ended the run
            if self.remove_entity(id, reason).is_none() {
                continue;
            }
            if verdict == SweepVerdict::Touching {
                self.on_collision(kind);
            }
        }
    }

    /// Remove one entity; `None` if it was already removed
    fn remove_entity(&mut self, id: EntityId, reason: RemovalReason) -> Option<Entity> {
        let idx = self.entities.iter().position(|e| e.id == id)?;
        let entity = self.entities.remove(idx);
        self.emit(GameEvent::EntityRemoved { id, reason });
        Some(entity)
    }

    fn purge_entities(&mut self) {
        for entity in std::mem::take(&mut self.entities) {
            self.events.push(GameEvent::EntityRemoved {
                id: entity.id,
                reason: RemovalReason::RunInactive,
            });
        }
    }

    // === Collectibles & power-ups ===

    fn collect(&mut self, kind: EntityKind) {
        match kind {
            EntityKind::Moon => {
                self.state.moons += 1;
                self.emit(GameEvent::Sound {
                    sound: SoundEvent::Collect,
                });
            }
            EntityKind::Coffee => {
                self.state.coffee_count += 1;
                self.emit(GameEvent::Sound {
                    sound: SoundEvent::Coffee,
                });
                self.activate_power_up();
            }
            EntityKind::Laptop => {
                self.state.laptop_count += 1;
                self.emit(GameEvent::Sound {
                    sound: SoundEvent::Laptop,
                });
                self.activate_power_up();
                self.glow();
            }
            EntityKind::Jasmine => {
                self.state.lives += 1;
                self.emit(GameEvent::Sound {
                    sound: SoundEvent::Jasmine,
                });
            }
            EntityKind::Obstacle => return,
        }
        self.emit_display();
    }

    /// Single slot: ignored while a boost is running, never extended
    fn activate_power_up(&mut self) {
        if self.state.power_up_active {
            log::debug!("Power-up already active");
            return;
        }

        let original = self.state.obstacle_speed_ms;
        let boosted = (f64::from(original) * self.tuning.power_up_factor).round() as u32;
        self.state.power_up_active = true;
        self.power_up_restore_ms = Some(original);
        self.state.obstacle_speed_ms = boosted.max(1);
        self.power_up = Some(
            self.sched
                .once(TimerKind::PowerUpExpired, u64::from(self.tuning.power_up_ms)),
        );
        log::debug!("Power-up: speed {}ms -> {}ms", original, boosted);
        self.respawn_schedules();
    }

    fn expire_power_up(&mut self) {
        let Some(original) = self.power_up_restore_ms.take() else {
            return;
        };
        self.state.obstacle_speed_ms = original;
        self.state.power_up_active = false;
        log::debug!("Power-up over: speed back to {}ms", original);
        self.respawn_schedules();
        self.emit_display();
    }

    fn glow(&mut self) {
        self.player.buffed = true;
        self.sched.cancel_slot(&mut self.buff);
        self.buff = Some(
            self.sched
                .once(TimerKind::PlayerBuffExpired, u64::from(self.tuning.laptop_buff_ms)),
        );
        self.emit(GameEvent::PlayerBuffChanged { active: true });
    }

    // === Events ===

    fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    fn emit_display(&mut self) {
        self.events.push(GameEvent::DisplayUpdate {
            state: self.state.clone(),
        });
    }
}
