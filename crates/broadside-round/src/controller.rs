//! Controller thread — drives the round engine against real time and the
//! physical panel.
//!
//! The worker polls button events, steps the engine, forwards game events to
//! the presentation loop, and executes light commands. Whether hardware is
//! present is decided once at spawn: with no panel the identical timing
//! logic runs and only the light/input calls are skipped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use broadside_core::battle::SharedBattle;
use broadside_core::events::GameEvent;
use broadside_panel::{ButtonPanel, Color, PanelCommand};

use crate::engine::{RoundConfig, RoundEngine};

/// How often the worker polls input and steps the engine.
const POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Handle to a running controller thread.
pub struct ControllerHandle {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl ControllerHandle {
    /// Shared stop flag; setting it asks the worker to exit at the next
    /// loop iteration. Outstanding flash delays run to completion first, so
    /// shutdown latency is bounded by the longest single flash.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// Request termination and join the worker.
    pub fn stop(self) {
        self.stop.store(true, Ordering::Relaxed);
        if self.handle.join().is_err() {
            log::error!("round controller thread panicked");
        }
    }
}

/// Spawn the round controller on a dedicated worker thread.
///
/// `panel` is `Some` when hardware initialized at startup; `None` runs the
/// same game without indicator or input I/O.
pub fn spawn_controller(
    config: RoundConfig,
    battle: SharedBattle,
    panel: Option<Box<dyn ButtonPanel>>,
    event_tx: mpsc::Sender<GameEvent>,
) -> ControllerHandle {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();

    let handle = thread::Builder::new()
        .name("broadside-round".into())
        .spawn(move || {
            run_controller(config, battle, panel, event_tx, &flag);
        })
        .expect("failed to spawn round controller thread");

    ControllerHandle { stop, handle }
}

/// The controller loop. Runs until the stop flag is set or the presentation
/// side hangs up.
fn run_controller(
    config: RoundConfig,
    battle: SharedBattle,
    mut panel: Option<Box<dyn ButtonPanel>>,
    event_tx: mpsc::Sender<GameEvent>,
    stop: &AtomicBool,
) {
    if panel.is_none() {
        log::warn!("no panel attached; running without indicator/input hardware");
    }

    let mut engine = RoundEngine::new(config, battle);
    let epoch = Instant::now();

    while !stop.load(Ordering::Relaxed) {
        let presses = match panel.as_mut() {
            Some(panel) => panel.poll_events(),
            None => Vec::new(),
        };

        let output = engine.step(epoch.elapsed(), &presses);

        let mut disconnected = false;
        for event in output.events {
            if event_tx.send(event).is_err() {
                disconnected = true;
                break;
            }
        }
        if disconnected {
            log::warn!("presentation loop hung up; stopping round controller");
            break;
        }

        if let Some(panel) = panel.as_mut() {
            for command in &output.commands {
                execute(panel.as_mut(), command);
            }
        }

        thread::sleep(POLL_INTERVAL);
    }

    // Leave the cabinet dark on the way out.
    if let Some(panel) = panel.as_mut() {
        panel.set_all(Color::OFF);
    }
    log::info!("round controller stopped");
}

/// Execute one panel command. Flash commands block the controller thread
/// for their duration; stop is only observed between iterations.
fn execute(panel: &mut dyn ButtonPanel, command: &PanelCommand) {
    match *command {
        PanelCommand::SetAll { color } => panel.set_all(color),
        PanelCommand::SetIndicator { position, color } => panel.set_indicator(position, color),
        PanelCommand::ClearIndicator { position } => panel.clear_indicator(position),
        PanelCommand::FlashAll { color, secs } => {
            panel.set_all(color);
            thread::sleep(Duration::from_secs_f64(secs));
            panel.set_all(Color::OFF);
        }
    }
}
