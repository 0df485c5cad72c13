use std::sync::mpsc;

use broadside_app::{input, presentation};
use broadside_core::battle::shared_battle;
use broadside_panel::{probe_device, SimulatedPanel, DEVICE_PATH};
use broadside_round::controller::spawn_controller;
use broadside_round::engine::RoundConfig;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Hardware presence is decided once, here. The LED/keypad driver itself
    // lives outside this workspace; this build always plays against the
    // simulated panel, fed from stdin.
    match probe_device(DEVICE_PATH) {
        Ok(()) => log::info!("cabinet input device present at {DEVICE_PATH}"),
        Err(e) => log::warn!("{e}; running in simulation mode"),
    }
    let (panel, probe) = SimulatedPanel::new();

    let battle = shared_battle();
    let (event_tx, event_rx) = mpsc::channel();

    let controller = spawn_controller(
        RoundConfig::default(),
        battle.clone(),
        Some(Box::new(panel)),
        event_tx,
    );
    let stop = controller.stop_flag();

    println!("BROADSIDE: keys 1-9 press panel buttons, q quits.");
    let _feeder = input::spawn_stdin_feeder(probe, stop.clone());

    presentation::run(battle, event_rx, stop);

    // Join the worker before final teardown; it clears the lights on exit.
    controller.stop();
    log::info!("clean shutdown");
}
