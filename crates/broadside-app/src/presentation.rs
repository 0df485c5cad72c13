//! Presentation loop — consumes game events at a capped frame rate.
//!
//! Runs on the main thread. Each frame drains the whole event backlog first
//! (battle resolution happens here, at consumption time), then advances
//! cosmetic effects and redraws the HUD. Never blocks on hardware; the only
//! sleep is frame pacing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use broadside_core::battle::{apply_event, Impact, SharedBattle};
use broadside_core::constants::FRAME_RATE;
use broadside_core::events::GameEvent;

use crate::effects::Effects;
use crate::hud::Hud;

/// Nominal duration of one frame at the cap.
const FRAME_DURATION: Duration = Duration::from_nanos(1_000_000_000 / FRAME_RATE as u64);

/// Run the presentation loop until `stop` is set or the controller hangs up.
pub fn run(battle: SharedBattle, events: mpsc::Receiver<GameEvent>, stop: Arc<AtomicBool>) {
    let mut effects = Effects::new();
    let mut hud = Hud::new();
    let mut next_frame_time = Instant::now();

    while !stop.load(Ordering::Relaxed) {
        // 1. Drain the whole backlog before rendering this frame.
        loop {
            match events.try_recv() {
                Ok(event) => handle_event(&battle, &mut effects, &mut hud, &event),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    stop.store(true, Ordering::Relaxed);
                    break;
                }
            }
        }

        // 2. Advance cosmetic effects one frame.
        effects.update();

        // 3. Redraw.
        {
            let battle = lock(&battle);
            hud.render(&battle, effects.in_flight());
        }

        // 4. Pace to the frame cap.
        next_frame_time += FRAME_DURATION;
        let now = Instant::now();
        if next_frame_time > now {
            std::thread::sleep(next_frame_time - now);
        } else if now - next_frame_time > FRAME_DURATION * 2 {
            // Too far behind — reset to avoid a catch-up spiral.
            next_frame_time = now;
        }
    }
    log::info!("presentation loop stopped");
}

/// Consume one event: mutate the battle state first, then spawn visuals.
fn handle_event(battle: &SharedBattle, effects: &mut Effects, hud: &mut Hud, event: &GameEvent) {
    let impact = {
        let mut battle = lock(battle);
        let impact = apply_event(&mut battle, event);
        if let Some(Impact::Hit { target, sunk: true }) = impact {
            log::info!("the {} has been sunk!", battle.fleet[target].name);
        }
        hud.on_event(&battle, event);
        impact
    };

    match impact {
        Some(Impact::Hit { target, .. }) => effects.fire_at_ship(target),
        Some(Impact::ReturnFire { source }) => effects.return_fire(source),
        None => {}
    }
    if matches!(event, GameEvent::RoundReset) {
        effects.clear();
    }
}

fn lock(battle: &SharedBattle) -> std::sync::MutexGuard<'_, broadside_core::battle::BattleState> {
    battle
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
