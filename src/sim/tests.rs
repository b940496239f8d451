//! Run-level scenarios driven through virtual time

use std::collections::HashSet;

use proptest::prelude::*;

use super::*;
use crate::consts::OBSTACLE_SIZE;
use crate::tuning::Tuning;

/// Plenty of lives and only moons, so runs survive and never power up by accident
fn sturdy() -> Tuning {
    Tuning {
        starting_lives: 1000,
        jasmine_chance: 0.0,
        moon_below: 1.0,
        coffee_below: 1.0,
        ..Default::default()
    }
}

/// Office after three seconds, before the first obstacle can arrive
fn quick_office() -> Tuning {
    Tuning {
        subway_at_secs: 1,
        downtown_at_secs: 2,
        office_at_secs: 3,
        ..Default::default()
    }
}

fn started(seed: u64, tuning: Tuning) -> Game {
    let mut game = Game::with_tuning(seed, tuning);
    game.start();
    game
}

fn advance_secs(game: &mut Game, secs: u32) {
    for _ in 0..secs {
        game.advance(1000);
    }
}

fn sounds(events: &[GameEvent]) -> Vec<SoundEvent> {
    events
        .iter()
        .filter_map(|e| match e {
            GameEvent::Sound { sound } => Some(*sound),
            _ => None,
        })
        .collect()
}

fn spawned(events: &[GameEvent]) -> Vec<Entity> {
    events
        .iter()
        .filter_map(|e| match e {
            GameEvent::EntitySpawned { entity } => Some(entity.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_start_resets_run() {
    let mut game = Game::new(7);
    assert_eq!(game.phase(), GamePhase::Idle);
    game.start();
    assert_eq!(game.phase(), GamePhase::Running);
    assert_eq!(game.state(), &RunState::default());
    assert!(matches!(
        game.events().first(),
        Some(GameEvent::StageChanged {
            stage: Stage::Street,
            ..
        })
    ));
}

#[test]
fn test_stages_then_office() {
    let mut game = started(1, sturdy());

    advance_secs(&mut game, 29);
    assert_eq!(game.state().stage, Stage::Street);
    advance_secs(&mut game, 1);
    assert_eq!(game.state().stage, Stage::Subway);
    assert_eq!(game.state().elapsed_seconds, 30);

    advance_secs(&mut game, 30);
    assert_eq!(game.state().stage, Stage::Downtown);
    assert_eq!(game.phase(), GamePhase::Running);

    advance_secs(&mut game, 30);
    assert_eq!(game.phase(), GamePhase::OfficeReached);
    assert_eq!(game.state().elapsed_seconds, 90);
    assert!(game.state().reached_office);
    assert!(game.entities().is_empty());

    let changes = game
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, GameEvent::StageChanged { .. }))
        .count();
    // Street at start, then subway and downtown
    assert_eq!(changes, 3);
}

#[test]
fn test_office_stops_clock_and_spawner() {
    let mut game = started(2, sturdy());
    advance_secs(&mut game, 90);
    assert_eq!(game.phase(), GamePhase::OfficeReached);
    game.drain_events();

    advance_secs(&mut game, 20);
    assert_eq!(game.state().elapsed_seconds, 90);
    assert!(game.entities().is_empty());
    assert!(
        !game
            .events()
            .iter()
            .any(|e| matches!(e, GameEvent::EntitySpawned { .. }))
    );
}

#[test]
fn test_two_jumps_start_overtime() {
    let mut game = started(3, quick_office());
    advance_secs(&mut game, 3);
    assert_eq!(game.phase(), GamePhase::OfficeReached);

    game.jump_command();
    assert_eq!(game.phase(), GamePhase::OfficeReached);
    assert_eq!(game.state().jumps_since_office, 1);
    assert!(!game.player().jumping);

    game.jump_command();
    assert_eq!(game.phase(), GamePhase::Overtime);
    assert!(game.state().overtime_active);
    assert_eq!(game.state().obstacle_speed_ms, 2000);
    assert_eq!(game.state().spawn_rate_ms, 1500);
    assert!(sounds(game.events()).contains(&SoundEvent::Overtime));
}

#[test]
fn test_overtime_ramp_floors_at_800() {
    let mut game = started(4, Tuning {
        subway_at_secs: 1,
        downtown_at_secs: 2,
        office_at_secs: 3,
        ..sturdy()
    });
    advance_secs(&mut game, 3);
    game.jump_command();
    game.jump_command();
    assert_eq!(game.phase(), GamePhase::Overtime);

    advance_secs(&mut game, 5);
    assert_eq!(game.state().spawn_rate_ms, 1400);
    assert_eq!(game.state().obstacle_speed_ms, 1900);

    advance_secs(&mut game, 120);
    assert_eq!(game.state().spawn_rate_ms, 800);
    assert_eq!(game.state().obstacle_speed_ms, 800);
    // No ticks counted after the office
    assert_eq!(game.state().elapsed_seconds, 3);
}

#[test]
fn test_overtime_keeps_office_time() {
    let mut game = started(4, Tuning {
        subway_at_secs: 1,
        downtown_at_secs: 2,
        office_at_secs: 3,
        ..sturdy()
    });
    advance_secs(&mut game, 3);
    game.jump_command();
    game.jump_command();

    advance_secs(&mut game, 10);
    game.on_tick();
    assert_eq!(game.phase(), GamePhase::Overtime);
    assert_eq!(game.state().elapsed_seconds, 3);

    game.end(true);
    let end = game.last_end().unwrap();
    assert!(end.was_overtime);
    assert_eq!(end.stats.elapsed_seconds, 3);
}

#[test]
fn test_power_up_reschedules_spawns() {
    let mut game = started(8, sturdy());
    let slow = velocity_for(OBSTACLE_SIZE, 3000);
    let fast = velocity_for(OBSTACLE_SIZE, 1800);

    game.advance(2100);
    let first = spawned(game.events());
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].kind, EntityKind::Obstacle);
    let first_id = first[0].id;

    game.on_collision(EntityKind::Coffee);
    assert_eq!(game.state().obstacle_speed_ms, 1800);
    game.drain_events();

    // Both schedules restart at pickup time; the old 2500ms collectible never fires
    game.advance(1999);
    assert!(spawned(game.events()).is_empty());
    let old = game.entities().iter().find(|e| e.id == first_id).unwrap();
    assert_eq!(old.vel_x, slow);

    game.advance(1);
    let next = spawned(&game.drain_events());
    assert_eq!(next.len(), 1);
    assert_eq!(next[0].spawned_at_ms, 4100);
    assert_eq!(next[0].vel_x, fast);

    // Expiry at 5100 re-arms at the restored speed
    game.advance(1000);
    assert!(!game.state().power_up_active);
    game.drain_events();
    game.advance(1999);
    assert!(spawned(game.events()).is_empty());
    game.advance(1);
    let restored = spawned(game.events());
    assert_eq!(restored.len(), 1);
    assert_eq!(restored[0].spawned_at_ms, 7100);
    assert_eq!(restored[0].vel_x, slow);
}

#[test]
fn test_ramp_step_reschedules_spawns() {
    let mut game = started(9, Tuning {
        subway_at_secs: 1,
        downtown_at_secs: 2,
        office_at_secs: 3,
        ..sturdy()
    });
    advance_secs(&mut game, 3);
    game.jump_command();
    game.jump_command();

    // Overtime obstacles at 4500, 6000, 7500; the ramp lands at 8000
    advance_secs(&mut game, 5);
    assert_eq!(game.state().spawn_rate_ms, 1400);
    game.drain_events();

    game.advance(1399);
    assert!(spawned(game.events()).is_empty());
    game.advance(1);
    let next = spawned(game.events());
    assert_eq!(next.len(), 1);
    assert_eq!(next[0].kind, EntityKind::Obstacle);
    assert_eq!(next[0].spawned_at_ms, 9400);
    assert_eq!(next[0].vel_x, velocity_for(OBSTACLE_SIZE, 1900));
}

#[test]
fn test_hit_without_lives_ends_run() {
    let mut game = started(5, Tuning::default());
    game.on_collision(EntityKind::Obstacle);

    assert_eq!(game.phase(), GamePhase::Ended);
    let end = game.last_end().unwrap();
    assert!(!end.was_overtime);
    assert_eq!(end.stats.lives, 0);
    assert!(sounds(game.events()).contains(&SoundEvent::Crash));
    assert!(matches!(
        game.events().last(),
        Some(GameEvent::RunEnded {
            was_overtime: false,
            ..
        })
    ));
}

#[test]
fn test_hit_in_overtime_records_overtime() {
    let mut game = started(6, quick_office());
    advance_secs(&mut game, 3);
    game.jump_command();
    game.jump_command();
    game.on_collision(EntityKind::Obstacle);

    assert_eq!(game.phase(), GamePhase::Ended);
    assert!(game.last_end().unwrap().was_overtime);
    assert!(!game.state().overtime_active);
}

#[test]
fn test_hit_costs_a_life_then_grants_invulnerability() {
    let mut game = started(7, sturdy());
    game.on_collision(EntityKind::Obstacle);
    assert_eq!(game.state().lives, 999);
    assert!(game.state().invulnerable);

    // Ignored while invulnerable, collectibles still count
    game.on_collision(EntityKind::Obstacle);
    game.on_collision(EntityKind::Moon);
    assert_eq!(game.state().lives, 999);
    assert_eq!(game.state().moons, 1);

    game.advance(1499);
    assert!(game.state().invulnerable);
    game.advance(1);
    assert!(!game.state().invulnerable);

    game.on_collision(EntityKind::Obstacle);
    assert_eq!(game.state().lives, 998);
}

#[test]
fn test_power_up_does_not_stack_or_extend() {
    let mut game = started(8, sturdy());
    game.on_collision(EntityKind::Coffee);
    assert!(game.state().power_up_active);
    assert_eq!(game.state().obstacle_speed_ms, 1800);

    game.on_collision(EntityKind::Coffee);
    assert_eq!(game.state().obstacle_speed_ms, 1800);
    assert_eq!(game.state().coffee_count, 2);

    game.advance(1500);
    game.on_collision(EntityKind::Laptop);
    assert_eq!(game.state().obstacle_speed_ms, 1800);
    assert!(game.player().buffed);

    game.advance(1499);
    assert_eq!(game.state().obstacle_speed_ms, 1800);
    game.advance(1);
    assert_eq!(game.state().obstacle_speed_ms, 3000);
    assert!(!game.state().power_up_active);
}

#[test]
fn test_laptop_glow_and_jasmine_life() {
    let mut game = started(9, sturdy());
    game.on_collision(EntityKind::Laptop);
    assert_eq!(game.state().laptop_count, 1);
    assert!(game.player().buffed);
    game.advance(3000);
    assert!(!game.player().buffed);

    game.on_collision(EntityKind::Jasmine);
    assert_eq!(game.state().lives, 1001);
    assert!(sounds(game.events()).contains(&SoundEvent::Jasmine));
}

#[test]
fn test_jump_window() {
    let mut game = started(10, sturdy());
    game.drain_events();

    game.jump_command();
    game.jump_command();
    assert!(game.player().jumping);
    assert_eq!(sounds(game.events()), vec![SoundEvent::Jump]);

    game.advance(599);
    assert!(game.player().jumping);
    game.advance(1);
    assert!(!game.player().jumping);

    game.jump_command();
    assert!(game.player().jumping);
}

#[test]
fn test_commands_outside_run_are_noops() {
    let mut game = Game::new(11);
    game.jump_command();
    game.on_tick();
    game.on_collision(EntityKind::Obstacle);
    game.end(false);
    assert_eq!(game.phase(), GamePhase::Idle);
    assert!(game.events().is_empty());

    game.start();
    game.end(false);
    let frozen = game.state().clone();
    game.drain_events();
    game.jump_command();
    game.on_collision(EntityKind::Moon);
    game.advance(10_000);
    assert_eq!(game.state(), &frozen);
    assert!(game.events().is_empty());
}

#[test]
fn test_restart_drops_stale_timers() {
    let mut game = started(12, sturdy());
    game.advance(5000);
    game.on_collision(EntityKind::Coffee);
    assert!(!game.entities().is_empty());

    game.restart();
    assert!(game.entities().is_empty());
    assert_eq!(game.state(), &RunState::new(&sturdy()));

    // Old clock ticks and the old power-up expiry all fall inside this window
    game.advance(3000);
    assert_eq!(game.state().elapsed_seconds, 3);
    assert_eq!(game.state().obstacle_speed_ms, 3000);
}

#[test]
fn test_every_entity_removed_exactly_once() {
    let mut game = started(13, sturdy());
    let mut spawned = HashSet::new();
    let mut removed = Vec::new();

    for _ in 0..95 {
        game.advance(1000);
        for event in game.drain_events() {
            match event {
                GameEvent::EntitySpawned { entity } => {
                    spawned.insert(entity.id);
                }
                GameEvent::EntityRemoved { id, .. } => removed.push(id),
                _ => {}
            }
        }
    }

    assert_eq!(game.phase(), GamePhase::OfficeReached);
    assert!(!spawned.is_empty());
    let unique: HashSet<_> = removed.iter().copied().collect();
    assert_eq!(unique.len(), removed.len());
    assert_eq!(unique, spawned);
}

#[test]
fn test_autopilot_reaches_office() {
    let mut game = started(14, Tuning::default());
    for _ in 0..9_000 {
        game.advance(10);
        if game.autopilot_wants_jump(10) {
            game.jump_command();
        }
    }
    assert_eq!(game.phase(), GamePhase::OfficeReached);
    assert_eq!(game.state().elapsed_seconds, 90);
}

#[test]
fn test_same_seed_same_run() {
    let mut a = started(99, sturdy());
    let mut b = started(99, sturdy());
    advance_secs(&mut a, 40);
    advance_secs(&mut b, 40);
    assert_eq!(a.state(), b.state());
    let ids_a: Vec<_> = a.entities().iter().map(|e| (e.id, e.kind)).collect();
    let ids_b: Vec<_> = b.entities().iter().map(|e| (e.id, e.kind)).collect();
    assert_eq!(ids_a, ids_b);
}

proptest! {
    #[test]
    fn prop_ticks_drive_stages(n in 0u32..200) {
        let mut game = started(0, sturdy());
        for _ in 0..n {
            game.on_tick();
        }
        let state = game.state();
        prop_assert_eq!(state.elapsed_seconds, n.min(90));
        let expected = match n {
            0..30 => Stage::Street,
            30..60 => Stage::Subway,
            _ => Stage::Downtown,
        };
        prop_assert_eq!(state.stage, expected);
        let phase = if n >= 90 { GamePhase::OfficeReached } else { GamePhase::Running };
        prop_assert_eq!(game.phase(), phase);
    }

    #[test]
    fn prop_power_up_restores_exactly(
        start_speed in 801u32..5000,
        pickups in prop::collection::vec(0u64..3000, 1..6),
    ) {
        let tuning = Tuning { start_obstacle_speed_ms: start_speed, ..sturdy() };
        let mut game = started(1, tuning);
        let mut elapsed = 0;
        let mut offsets = pickups;
        offsets.sort_unstable();
        for offset in offsets {
            game.advance(offset - elapsed);
            elapsed = offset;
            game.on_collision(EntityKind::Coffee);
            prop_assert!(game.state().obstacle_speed_ms < start_speed);
        }
        // First pickup was at offsets[0] >= 0; its window closes by 3000 + that
        game.advance(6000 - elapsed);
        prop_assert_eq!(game.state().obstacle_speed_ms, start_speed);
        prop_assert!(!game.state().power_up_active);
    }

    #[test]
    fn prop_lives_never_underflow(hits in 0usize..20, lives in 0u32..4) {
        let tuning = Tuning { starting_lives: lives, invulnerability_ms: 1, ..sturdy() };
        let mut game = started(2, tuning);
        for _ in 0..hits {
            game.on_collision(EntityKind::Obstacle);
            game.advance(1);
        }
        if hits as u32 > lives {
            prop_assert_eq!(game.phase(), GamePhase::Ended);
            prop_assert_eq!(game.state().lives, 0);
        } else {
            prop_assert_eq!(game.state().lives, lives - hits as u32);
        }
    }
}
