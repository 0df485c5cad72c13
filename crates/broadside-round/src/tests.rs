//! Scenario tests for the round engine and the controller thread.
//!
//! Engine tests drive `step` with synthetic timestamps, so whole rounds play
//! out in microseconds; the consumer side is simulated by feeding drained
//! events through `apply_event` (or deliberately not, to model a stalled
//! presentation loop).

use std::sync::mpsc;
use std::time::Duration;

use broadside_core::battle::{apply_event, shared_battle, SharedBattle};
use broadside_core::constants::{NUM_POSITIONS, START_POSITION};
use broadside_core::enums::RoundPhase;
use broadside_core::events::GameEvent;
use broadside_panel::{ButtonEvent, Color, PanelCommand, SimulatedPanel};

use crate::controller::spawn_controller;
use crate::engine::{RoundConfig, RoundEngine};

fn secs(s: f64) -> Duration {
    Duration::from_secs_f64(s)
}

fn down(position: usize) -> ButtonEvent {
    ButtonEvent::down(position)
}

fn new_engine(seed: u64) -> (RoundEngine, SharedBattle) {
    let battle = shared_battle();
    let config = RoundConfig {
        seed,
        ..Default::default()
    };
    (RoundEngine::new(config, battle.clone()), battle)
}

/// Step a fresh engine through reset, start press, and the full countdown.
/// Returns the timestamp at which the round clock started.
fn start_round(engine: &mut RoundEngine) -> Duration {
    let out = engine.step(secs(0.0), &[]);
    assert_eq!(
        out.events,
        vec![GameEvent::RoundReset, GameEvent::AwaitingStart]
    );
    engine.step(secs(0.01), &[down(START_POSITION)]);
    assert_eq!(engine.phase(), RoundPhase::Countdown);

    // One big jump catches up through the whole light script.
    let t = secs(5.0);
    let out = engine.step(t, &[]);
    assert!(out.events.contains(&GameEvent::CountdownDone));
    assert_eq!(engine.phase(), RoundPhase::Active);
    t
}

fn last_spawned_index(events: &[GameEvent]) -> Option<usize> {
    events.iter().rev().find_map(|event| match event {
        GameEvent::TargetSpawned { index } => Some(*index),
        _ => None,
    })
}

// ---- Round setup and start gating ----

#[test]
fn test_idle_resets_battle_and_lights_start_indicator() {
    let (mut engine, battle) = new_engine(1);
    {
        let mut battle = battle.lock().unwrap();
        battle.fleet[0].current_health = 0;
        battle.player.current = 2.0;
    }

    let out = engine.step(secs(0.0), &[]);

    let battle = battle.lock().unwrap();
    assert_eq!(battle.current_target(), Some(0));
    assert_eq!(battle.player.current, battle.player.max);
    assert_eq!(
        out.events,
        vec![GameEvent::RoundReset, GameEvent::AwaitingStart]
    );
    assert!(out.commands.contains(&PanelCommand::SetIndicator {
        position: START_POSITION,
        color: Color::TARGET,
    }));
    assert_eq!(engine.phase(), RoundPhase::AwaitingStart);
}

#[test]
fn test_only_start_button_starts_the_round() {
    let (mut engine, _battle) = new_engine(1);
    engine.step(secs(0.0), &[]);

    for position in (0..NUM_POSITIONS).filter(|&p| p != START_POSITION) {
        engine.step(secs(0.1), &[down(position)]);
        assert_eq!(engine.phase(), RoundPhase::AwaitingStart);
    }
    // Button-up on the start position does not count either.
    engine.step(
        secs(0.2),
        &[ButtonEvent {
            position: START_POSITION,
            pressed: false,
        }],
    );
    assert_eq!(engine.phase(), RoundPhase::AwaitingStart);

    engine.step(secs(0.3), &[down(START_POSITION)]);
    assert_eq!(engine.phase(), RoundPhase::Countdown);
}

// ---- Countdown ----

#[test]
fn test_countdown_light_script_order_and_duration() {
    let (mut engine, _battle) = new_engine(1);
    engine.step(secs(0.0), &[]);
    let out = engine.step(secs(0.0), &[down(START_POSITION)]);
    let mut commands = out.commands;

    // Walk the countdown in 10 ms steps and gather cues as they fire.
    let mut done_at = None;
    let mut t = 0.0;
    while t < 6.0 {
        t += 0.01;
        let out = engine.step(secs(t), &[]);
        commands.extend(out.commands);
        if out.events.contains(&GameEvent::CountdownDone) {
            done_at = Some(t);
            break;
        }
    }

    assert_eq!(
        commands,
        vec![
            PanelCommand::SetAll {
                color: Color::COUNTDOWN
            },
            PanelCommand::SetAll { color: Color::OFF },
            PanelCommand::SetIndicator {
                position: 2,
                color: Color::TARGET
            },
            PanelCommand::ClearIndicator { position: 2 },
            PanelCommand::SetIndicator {
                position: 1,
                color: Color::TARGET
            },
            PanelCommand::ClearIndicator { position: 1 },
            PanelCommand::SetIndicator {
                position: 0,
                color: Color::TARGET
            },
            PanelCommand::ClearIndicator { position: 0 },
        ]
    );
    // 1.0 s wash + 0.5 s blackout + 3 x (0.5 s lit + 0.5 s dark) = 4.5 s.
    let done_at = done_at.expect("countdown should finish");
    assert!((4.49..4.6).contains(&done_at), "finished at {done_at}");
}

#[test]
fn test_countdown_presses_are_dropped() {
    let (mut engine, _battle) = new_engine(1);
    engine.step(secs(0.0), &[]);
    engine.step(secs(0.0), &[down(START_POSITION)]);

    // Mash buttons throughout the countdown.
    let mut events = Vec::new();
    let mut t = 0.0;
    while engine.phase() == RoundPhase::Countdown {
        t += 0.1;
        let out = engine.step(secs(t), &[down(3), down(7)]);
        events.extend(out.events);
    }

    assert!(events.iter().all(|event| !matches!(
        event,
        GameEvent::PlayerHit { .. } | GameEvent::PlayerMiss { .. }
    )));
    assert_eq!(engine.score(), 0.0, "countdown input must not score");
}

// ---- Active play ----

#[test]
fn test_five_consecutive_hits_sink_the_sloop() {
    let (mut engine, battle) = new_engine(7);
    let t0 = start_round(&mut engine);

    let mut events = Vec::new();
    let out = engine.step(t0, &[]);
    events.extend(out.events);
    let mut target = last_spawned_index(&events).expect("a target spawns on round start");

    for i in 1..=5 {
        let out = engine.step(t0 + secs(0.1 * i as f64), &[down(target)]);
        assert!(out
            .events
            .contains(&GameEvent::PlayerHit { score: i as f64 }));
        events.extend(out.events);
        // Apply the drained events like the presentation loop would.
        let mut battle = battle.lock().unwrap();
        for event in events.drain(..) {
            apply_event(&mut battle, &event);
        }
        drop(battle);
        target = engine.active_target().expect("a new target follows a hit");
    }

    let battle = battle.lock().unwrap();
    assert_eq!(engine.score(), 5.0);
    assert!(battle.fleet[0].is_destroyed(), "Sloop has 5 HP");
    assert_eq!(battle.current_target(), Some(1));
    assert_eq!(
        battle.player.current, battle.player.max,
        "healing is capped at max from a fresh round"
    );
}

#[test]
fn test_wrong_press_penalty_flash_and_score_floor() {
    let (mut engine, _battle) = new_engine(3);
    let t0 = start_round(&mut engine);
    engine.step(t0, &[]);
    let target = engine.active_target().unwrap();

    // One hit to get off zero.
    engine.step(t0 + secs(0.1), &[down(target)]);
    assert_eq!(engine.score(), 1.0);

    let mut expected = [0.5, 0.0, 0.0].into_iter();
    for i in 0..3 {
        let target = engine.active_target().unwrap();
        let wrong = (target + 1) % NUM_POSITIONS;
        let out = engine.step(t0 + secs(0.2 + 0.05 * i as f64), &[down(wrong)]);

        let score = expected.next().unwrap();
        assert!(out.events.contains(&GameEvent::PlayerMiss { score }));
        assert!(
            out.commands
                .iter()
                .any(|command| matches!(
                    command,
                    PanelCommand::FlashAll {
                        color: Color::PENALTY,
                        ..
                    }
                )),
            "a wrong press flashes the panel red"
        );
        assert!(engine.score() >= 0.0);
    }
    assert_eq!(engine.score(), 0.0, "score is floored at zero");
}

#[test]
fn test_hit_respawns_target_inline() {
    let (mut engine, _battle) = new_engine(11);
    let t0 = start_round(&mut engine);
    engine.step(t0, &[]);
    let target = engine.active_target().unwrap();

    let out = engine.step(t0 + secs(0.1), &[down(target)]);
    // Hit and respawn happen within the same step, in order.
    let hit_pos = out
        .events
        .iter()
        .position(|e| matches!(e, GameEvent::PlayerHit { .. }))
        .unwrap();
    let spawn_pos = out
        .events
        .iter()
        .position(|e| matches!(e, GameEvent::TargetSpawned { .. }))
        .unwrap();
    assert!(hit_pos < spawn_pos);
    assert!(engine.active_target().is_some());
}

#[test]
fn test_button_up_transitions_are_ignored() {
    let (mut engine, _battle) = new_engine(5);
    let t0 = start_round(&mut engine);
    engine.step(t0, &[]);
    let target = engine.active_target().unwrap();

    let out = engine.step(
        t0 + secs(0.1),
        &[ButtonEvent {
            position: target,
            pressed: false,
        }],
    );
    assert!(out.events.is_empty());
    assert_eq!(engine.score(), 0.0);
}

#[test]
fn test_exactly_one_spawn_precedes_every_outcome() {
    let (mut engine, _battle) = new_engine(13);
    let t0 = start_round(&mut engine);

    // A mix of hits, misses, and idle stretches.
    let mut events = Vec::new();
    let mut t = t0;
    for i in 0..40 {
        t += secs(0.3);
        let presses = match i % 3 {
            0 => vec![],
            1 => engine.active_target().map(down).into_iter().collect(),
            _ => vec![down(
                (engine.active_target().unwrap_or(0) + 1) % NUM_POSITIONS,
            )],
        };
        events.extend(engine.step(t, &presses).events);
    }

    // Every outcome is preceded by exactly one spawn since the previous
    // outcome; a fresh target always follows.
    let mut spawns_since_outcome = 0usize;
    for event in &events {
        match event {
            GameEvent::TargetSpawned { .. } => spawns_since_outcome += 1,
            GameEvent::PlayerHit { .. }
            | GameEvent::PlayerMiss { .. }
            | GameEvent::TargetEscaped => {
                assert_eq!(
                    spawns_since_outcome, 1,
                    "outcome must reference exactly one live target"
                );
                spawns_since_outcome = 0;
            }
            _ => {}
        }
    }
}

// ---- Round end ----

#[test]
fn test_unattended_round_escapes_every_mole_duration() {
    let (mut engine, battle) = new_engine(17);
    let t0 = start_round(&mut engine);

    // Consumer stalled: events pile up undrained, so the controller sees a
    // full-health player for the entire 30 seconds.
    let mut events = Vec::new();
    let mut t = t0;
    while engine.phase() == RoundPhase::Active {
        t += secs(0.01);
        events.extend(engine.step(t, &[]).events);
    }

    let escapes = events
        .iter()
        .filter(|e| matches!(e, GameEvent::TargetEscaped))
        .count();
    assert!(
        (28..=30).contains(&escapes),
        "expected one escape per second over 30 s, got {escapes}"
    );
    let round_overs = events
        .iter()
        .filter(|e| matches!(e, GameEvent::RoundOver { .. }))
        .count();
    assert_eq!(round_overs, 1);
    assert!(events.contains(&GameEvent::RoundOver { score: 0.0 }));

    // Drain the backlog like a late consumer: player bottoms out at zero,
    // fleet untouched.
    let mut battle = battle.lock().unwrap();
    for event in &events {
        apply_event(&mut battle, event);
    }
    assert_eq!(battle.player.current, 0.0);
    for ship in &battle.fleet {
        assert_eq!(ship.current_health, ship.max_health);
        assert!(ship.current_health >= 0 && ship.current_health <= ship.max_health);
    }
}

#[test]
fn test_player_sunk_ends_round_before_spawns() {
    let (mut engine, battle) = new_engine(19);
    let t0 = start_round(&mut engine);
    engine.step(t0, &[]);

    battle.lock().unwrap().player.current = 0.0;

    let out = engine.step(t0 + secs(0.1), &[]);
    assert_eq!(out.events, vec![GameEvent::RoundOver { score: 0.0 }]);
    assert!(
        !out.events
            .iter()
            .any(|e| matches!(e, GameEvent::TargetSpawned { .. })),
        "end check takes priority over spawning"
    );
    assert!(out.commands.contains(&PanelCommand::SetAll { color: Color::DONE }));
    assert_eq!(engine.phase(), RoundPhase::RoundOver);
}

#[test]
fn test_fleet_destroyed_ends_round() {
    let (mut engine, battle) = new_engine(23);
    let t0 = start_round(&mut engine);
    engine.step(t0, &[]);

    {
        let mut battle = battle.lock().unwrap();
        for ship in &mut battle.fleet {
            ship.current_health = 0;
        }
    }

    let out = engine.step(t0 + secs(0.1), &[]);
    assert!(out.events.contains(&GameEvent::RoundOver { score: 0.0 }));
}

#[test]
fn test_simultaneous_end_conditions_emit_one_round_over() {
    let (mut engine, battle) = new_engine(29);
    let t0 = start_round(&mut engine);
    engine.step(t0, &[]);

    // Time expired AND player sunk at the same observation point.
    battle.lock().unwrap().player.current = 0.0;
    let mut events = engine.step(t0 + secs(31.0), &[]).events;
    for _ in 0..10 {
        events.extend(engine.step(t0 + secs(31.1), &[]).events);
    }

    let round_overs = events
        .iter()
        .filter(|e| matches!(e, GameEvent::RoundOver { .. }))
        .count();
    assert_eq!(round_overs, 1, "termination event must be emitted once");
}

#[test]
fn test_two_any_key_presses_acknowledge_and_restart() {
    let (mut engine, battle) = new_engine(31);
    let t0 = start_round(&mut engine);
    engine.step(t0, &[]);

    battle.lock().unwrap().player.current = 0.0;
    engine.step(t0 + secs(0.1), &[]);
    assert_eq!(engine.phase(), RoundPhase::RoundOver);

    // RoundOver is momentary; the next step opens the acknowledgement wait.
    engine.step(t0 + secs(0.2), &[]);
    assert_eq!(engine.phase(), RoundPhase::AwaitingAck);

    engine.step(t0 + secs(0.3), &[down(8)]);
    assert_eq!(engine.phase(), RoundPhase::AwaitingAck, "one press is not enough");

    let out = engine.step(t0 + secs(0.4), &[down(0)]);
    assert_eq!(engine.phase(), RoundPhase::Idle);
    assert!(out.commands.contains(&PanelCommand::SetAll { color: Color::OFF }));

    // The loop wraps back into a fresh round.
    let out = engine.step(t0 + secs(0.5), &[]);
    assert!(out.events.contains(&GameEvent::RoundReset));
    assert_eq!(battle.lock().unwrap().player.current, 10.0);
}

// ---- Determinism ----

#[test]
fn test_same_seed_same_round() {
    let run = |seed: u64| {
        let (mut engine, _battle) = new_engine(seed);
        let t0 = start_round(&mut engine);
        let mut events = Vec::new();
        let mut t = t0;
        for _ in 0..1500 {
            t += secs(0.01);
            events.extend(engine.step(t, &[]).events);
        }
        serde_json::to_string(&events).unwrap()
    };

    assert_eq!(run(12345), run(12345), "same seed must replay identically");
    assert_ne!(run(111), run(222), "different seeds should diverge");
}

// ---- Controller thread ----

#[test]
fn test_stop_mid_countdown_clears_lights_and_joins() {
    let battle = shared_battle();
    let (panel, probe) = SimulatedPanel::new();
    let (event_tx, event_rx) = mpsc::channel();

    let handle = spawn_controller(
        RoundConfig::default(),
        battle,
        Some(Box::new(panel)),
        event_tx,
    );

    // Let the controller reach AwaitingStart, then start the countdown.
    std::thread::sleep(Duration::from_millis(50));
    probe.press(START_POSITION);
    std::thread::sleep(Duration::from_millis(600));

    // Mid-wash the strip is lit blue.
    assert!(!probe.all_off(), "countdown wash should be lit before stop");

    handle.stop();
    assert!(probe.all_off(), "indicators must end in the off state");

    let events: Vec<GameEvent> = event_rx.try_iter().collect();
    assert_eq!(events[0], GameEvent::RoundReset);
    assert_eq!(events[1], GameEvent::AwaitingStart);
}

#[test]
fn test_controller_runs_without_hardware() {
    let battle = shared_battle();
    let (event_tx, event_rx) = mpsc::channel();

    // Hardware unavailable: identical logic, no panel I/O, no input ever.
    let handle = spawn_controller(RoundConfig::default(), battle, None, event_tx);

    let first = event_rx.recv_timeout(Duration::from_secs(1)).unwrap();
    assert_eq!(first, GameEvent::RoundReset);
    let second = event_rx.recv_timeout(Duration::from_secs(1)).unwrap();
    assert_eq!(second, GameEvent::AwaitingStart);

    handle.stop();
}

#[test]
fn test_full_round_over_the_controller_thread() {
    // Compressed timings so a complete round plays out in about a second.
    let config = RoundConfig {
        seed: 42,
        round_duration: Duration::from_millis(600),
        mole_duration: Duration::from_millis(100),
        penalty_flash: Duration::from_millis(10),
        countdown_flash: Duration::from_millis(20),
        ..Default::default()
    };

    let battle = shared_battle();
    let (panel, probe) = SimulatedPanel::new();
    let (event_tx, event_rx) = mpsc::channel();
    let handle = spawn_controller(config, battle.clone(), Some(Box::new(panel)), event_tx);

    std::thread::sleep(Duration::from_millis(50));
    probe.press(START_POSITION);

    // Drain until the round finishes, applying events as a consumer would.
    let mut saw_round_over = false;
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while std::time::Instant::now() < deadline {
        match event_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                let mut battle = battle.lock().unwrap();
                apply_event(&mut battle, &event);
                if matches!(event, GameEvent::RoundOver { .. }) {
                    saw_round_over = true;
                    break;
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    assert!(saw_round_over, "round should complete end to end");

    // Two acknowledgement presses wrap back to a fresh round.
    probe.press(0);
    std::thread::sleep(Duration::from_millis(20));
    probe.press(3);
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    let mut saw_reset = false;
    while std::time::Instant::now() < deadline {
        match event_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(GameEvent::RoundReset) => {
                saw_reset = true;
                break;
            }
            Ok(_) => {}
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    assert!(saw_reset, "acknowledged round should loop back to reset");

    handle.stop();
    assert!(probe.all_off());

    // Health stayed clamped at every observation point we made.
    let battle = battle.lock().unwrap();
    assert!(battle.player.current >= 0.0 && battle.player.current <= battle.player.max);
    for ship in &battle.fleet {
        assert!(ship.current_health >= 0 && ship.current_health <= ship.max_health);
    }
}
