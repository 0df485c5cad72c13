//! Terminal HUD — the stand-in renderer.
//!
//! Sprite, font, and display-mode handling are external concerns; the HUD
//! reduces the original display (health bars, score, phase banners) to
//! stdout text, redrawn only when something changed.

use broadside_core::battle::BattleState;
use broadside_core::events::GameEvent;

const BAR_WIDTH: usize = 10;

/// Presentation-side view state, driven entirely by consumed events.
#[derive(Debug, Default)]
pub struct Hud {
    game_running: bool,
    game_over: bool,
    score: f64,
    last_line: String,
}

impl Hud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle one consumed event: update view flags and print phase banners.
    pub fn on_event(&mut self, battle: &BattleState, event: &GameEvent) {
        match event {
            GameEvent::RoundReset => {
                self.game_running = false;
                self.game_over = false;
                self.score = 0.0;
                self.last_line.clear();
            }
            GameEvent::AwaitingStart => {
                println!("== PRESS BUTTON 5 TO START BATTLE ==");
            }
            GameEvent::CountdownDone => {
                self.game_running = true;
                println!("== BATTLE STATIONS ==");
            }
            GameEvent::PlayerHit { score } | GameEvent::PlayerMiss { score } => {
                self.score = *score;
            }
            GameEvent::RoundOver { score } => {
                self.game_running = false;
                self.game_over = true;
                self.score = *score;
                // Same outcome precedence as the original end screen.
                let banner = if battle.player.is_sunk() {
                    "DEFEAT! SHIP SUNK!"
                } else if battle.fleet_destroyed() {
                    "VICTORY! ALL SHIPS SUNK!"
                } else {
                    "TIME'S UP!"
                };
                println!("== {banner} ==");
                println!("FINAL SCORE: {}", *score as i64);
                println!("PRESS ANY BUTTON TWICE TO CONTINUE");
            }
            GameEvent::TargetSpawned { .. } | GameEvent::TargetEscaped => {}
        }
    }

    /// Redraw the status line if it changed since the last frame.
    pub fn render(&mut self, battle: &BattleState, shots_in_flight: usize) {
        if !self.game_running || self.game_over {
            return;
        }
        let line = status_line(battle, self.score, shots_in_flight);
        if line != self.last_line {
            println!("{line}");
            self.last_line = line;
        }
    }
}

fn bar(current: f64, max: f64) -> String {
    let ratio = (current / max).clamp(0.0, 1.0);
    let filled = (ratio * BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

fn status_line(battle: &BattleState, score: f64, shots_in_flight: usize) -> String {
    let player = &battle.player;
    let mut line = format!(
        "SCORE {:>3}  PLAYER {} {:.1}/{:.0}",
        score as i64,
        bar(player.current, player.max),
        player.current,
        player.max,
    );
    match battle.current_target_ship() {
        Some(ship) => {
            line.push_str(&format!(
                "  TARGET {} {} {}/{}",
                ship.name,
                bar(ship.current_health as f64, ship.max_health as f64),
                ship.current_health,
                ship.max_health,
            ));
        }
        None => line.push_str("  TARGET --"),
    }
    if shots_in_flight > 0 {
        line.push_str(&format!("  shots {shots_in_flight}"));
    }
    line
}
