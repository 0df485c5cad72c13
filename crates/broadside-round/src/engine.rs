//! Round engine — the game's state machine.
//!
//! `RoundEngine` owns all round-local state (phase, score, active target,
//! timestamps) and is driven by [`RoundEngine::step`] with an externally
//! supplied monotonic timestamp. It never sleeps and never touches hardware:
//! light changes come back as [`PanelCommand`]s and everything the
//! presentation loop needs as [`GameEvent`]s. The countdown and penalty
//! delays are expressed as deadlines and flash commands, so a test can play
//! an entire round in microseconds.

use std::sync::MutexGuard;
use std::time::Duration;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use broadside_core::battle::{BattleState, SharedBattle};
use broadside_core::constants::{
    ACK_PRESSES, COUNTDOWN_FLASH_SECS, MISS_PENALTY, MOLE_DURATION_SECS, NUM_POSITIONS,
    PENALTY_FLASH_SECS, ROUND_DURATION_SECS, START_POSITION,
};
use broadside_core::enums::{RoundEndReason, RoundPhase};
use broadside_core::events::GameEvent;
use broadside_panel::{ButtonEvent, Color, PanelCommand};

/// Configuration for a round controller.
#[derive(Debug, Clone)]
pub struct RoundConfig {
    /// RNG seed for the target draw. Same seed + same input timeline =
    /// same round.
    pub seed: u64,
    /// Length of the active play phase.
    pub round_duration: Duration,
    /// How long a target stays lit before escaping.
    pub mole_duration: Duration,
    /// Blocking all-red flash after a wrong press.
    pub penalty_flash: Duration,
    /// Unit delay in the countdown script.
    pub countdown_flash: Duration,
    /// Position whose press starts a round.
    pub start_position: usize,
    /// Button-down events required to acknowledge a finished round.
    pub ack_presses: u32,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            round_duration: Duration::from_secs_f64(ROUND_DURATION_SECS),
            mole_duration: Duration::from_secs_f64(MOLE_DURATION_SECS),
            penalty_flash: Duration::from_secs_f64(PENALTY_FLASH_SECS),
            countdown_flash: Duration::from_secs_f64(COUNTDOWN_FLASH_SECS),
            start_position: START_POSITION,
            ack_presses: ACK_PRESSES,
        }
    }
}

/// Everything one engine step produced, in emission order.
#[derive(Debug, Default)]
pub struct StepOutput {
    pub events: Vec<GameEvent>,
    pub commands: Vec<PanelCommand>,
}

/// Progress through the countdown light script.
#[derive(Debug, Clone, Copy, Default)]
struct Countdown {
    /// Index of the cue currently dwelling.
    cue: usize,
    /// When the current dwell ends.
    next_at: Duration,
}

/// The round state machine.
pub struct RoundEngine {
    config: RoundConfig,
    battle: SharedBattle,
    phase: RoundPhase,
    score: f64,
    active_target: Option<usize>,
    /// When the current target was lit.
    target_lit_at: Duration,
    /// When the active phase began.
    round_started_at: Duration,
    countdown: Countdown,
    ack_count: u32,
    rng: ChaCha8Rng,
    events: Vec<GameEvent>,
    commands: Vec<PanelCommand>,
}

impl RoundEngine {
    pub fn new(config: RoundConfig, battle: SharedBattle) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            config,
            battle,
            phase: RoundPhase::Idle,
            score: 0.0,
            active_target: None,
            target_lit_at: Duration::ZERO,
            round_started_at: Duration::ZERO,
            countdown: Countdown::default(),
            ack_count: 0,
            rng,
            events: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Current score.
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Currently lit target, if any.
    pub fn active_target(&self) -> Option<usize> {
        self.active_target
    }

    /// Advance the state machine to `now`, feeding it the button transitions
    /// polled since the last step. Returns events and panel commands in the
    /// order they were produced.
    pub fn step(&mut self, now: Duration, presses: &[ButtonEvent]) -> StepOutput {
        match self.phase {
            RoundPhase::Idle => self.enter_awaiting_start(),
            RoundPhase::AwaitingStart => self.step_awaiting_start(now, presses),
            // Presses polled during the countdown are dropped on the floor
            // so no stale input carries into the active phase.
            RoundPhase::Countdown => self.step_countdown(now),
            RoundPhase::Active => self.step_active(now, presses),
            RoundPhase::RoundOver => {
                self.ack_count = 0;
                self.phase = RoundPhase::AwaitingAck;
            }
            RoundPhase::AwaitingAck => self.step_awaiting_ack(presses),
        }

        StepOutput {
            events: std::mem::take(&mut self.events),
            commands: std::mem::take(&mut self.commands),
        }
    }

    // --- Phase steps ---

    /// Idle → AwaitingStart: reset shared state, light the start indicator.
    fn enter_awaiting_start(&mut self) {
        self.battle().reset();
        self.score = 0.0;
        self.active_target = None;
        self.emit(GameEvent::RoundReset);

        self.commands.push(PanelCommand::SetIndicator {
            position: self.config.start_position,
            color: Color::TARGET,
        });
        self.emit(GameEvent::AwaitingStart);
        self.phase = RoundPhase::AwaitingStart;
        log::debug!("awaiting start button (position {})", self.config.start_position);
    }

    /// Waits indefinitely for the start button; only the stop signal in the
    /// driver gets us out otherwise.
    fn step_awaiting_start(&mut self, now: Duration, presses: &[ButtonEvent]) {
        let start_pressed = presses
            .iter()
            .any(|press| press.pressed && press.position == self.config.start_position);
        if start_pressed {
            self.begin_countdown(now);
        }
    }

    fn begin_countdown(&mut self, now: Duration) {
        // The opening all-blue wash also swallows the start indicator.
        let (command, dwell) = self
            .countdown_cue(0)
            .unwrap_or((PanelCommand::SetAll { color: Color::OFF }, Duration::ZERO));
        self.commands.push(command);
        self.countdown = Countdown {
            cue: 0,
            next_at: now + dwell,
        };
        self.phase = RoundPhase::Countdown;
        log::debug!("countdown started");
    }

    /// Deadline-driven countdown: emit the next cue whenever its
    /// predecessor's dwell has elapsed. A step after a long gap catches up
    /// through multiple cues.
    fn step_countdown(&mut self, now: Duration) {
        while now >= self.countdown.next_at {
            self.countdown.cue += 1;
            match self.countdown_cue(self.countdown.cue) {
                Some((command, dwell)) => {
                    self.commands.push(command);
                    self.countdown.next_at += dwell;
                }
                None => {
                    self.emit(GameEvent::CountdownDone);
                    self.round_started_at = now;
                    self.active_target = None;
                    self.phase = RoundPhase::Active;
                    log::info!("round started");
                    return;
                }
            }
        }
    }

    /// The fixed countdown light script: blue wash, blackout, then three
    /// descending indicator flashes. Returns the cue's command and how long
    /// to dwell on it, or `None` past the end.
    fn countdown_cue(&self, cue: usize) -> Option<(PanelCommand, Duration)> {
        let flash = self.config.countdown_flash;
        match cue {
            0 => Some((
                PanelCommand::SetAll {
                    color: Color::COUNTDOWN,
                },
                flash * 2,
            )),
            1 => Some((PanelCommand::SetAll { color: Color::OFF }, flash)),
            // Cues 2..8 flash positions 2, 1, 0: lit for one unit, dark for one.
            2..=7 => {
                let position = 2 - (cue - 2) / 2;
                let command = if cue % 2 == 0 {
                    PanelCommand::SetIndicator {
                        position,
                        color: Color::TARGET,
                    }
                } else {
                    PanelCommand::ClearIndicator { position }
                };
                Some((command, flash))
            }
            _ => None,
        }
    }

    fn step_active(&mut self, now: Duration, presses: &[ButtonEvent]) {
        // End check takes priority over spawning a new target.
        if let Some(reason) = self.round_end_reason(now) {
            self.end_round(reason);
            return;
        }

        // Spawn / timeout check.
        let timed_out = self.active_target.is_some()
            && now.saturating_sub(self.target_lit_at) > self.config.mole_duration;
        if self.active_target.is_none() || timed_out {
            if self.active_target.is_some() {
                self.emit(GameEvent::TargetEscaped);
            }
            self.spawn_target(now);
        }

        // Input check: every button-down in arrival order.
        for press in presses.iter().filter(|press| press.pressed) {
            // Re-read: a hit/miss above may have respawned the target.
            let Some(target) = self.active_target else {
                continue;
            };
            if press.position == target {
                self.score += 1.0;
                self.emit(GameEvent::PlayerHit { score: self.score });
                self.spawn_target(now);
            } else {
                self.score = (self.score - MISS_PENALTY).max(0.0);
                self.commands.push(PanelCommand::FlashAll {
                    color: Color::PENALTY,
                    secs: self.config.penalty_flash.as_secs_f64(),
                });
                self.emit(GameEvent::PlayerMiss { score: self.score });
                self.spawn_target(now);
            }
        }
    }

    /// Extinguish the old target and light a uniformly random new one.
    /// No adjacency or repeat avoidance: the same position may come up again.
    fn spawn_target(&mut self, now: Duration) {
        if let Some(old) = self.active_target {
            self.commands.push(PanelCommand::ClearIndicator { position: old });
        }
        let index = self.rng.gen_range(0..NUM_POSITIONS);
        self.active_target = Some(index);
        self.target_lit_at = now;
        self.commands.push(PanelCommand::SetIndicator {
            position: index,
            color: Color::TARGET,
        });
        self.emit(GameEvent::TargetSpawned { index });
    }

    /// Round-end condition, evaluated against the shared battle state the
    /// presentation loop has been mutating.
    fn round_end_reason(&self, now: Duration) -> Option<RoundEndReason> {
        if now.saturating_sub(self.round_started_at) >= self.config.round_duration {
            return Some(RoundEndReason::TimeUp);
        }
        let battle = self.battle();
        if battle.player.is_sunk() {
            Some(RoundEndReason::PlayerSunk)
        } else if battle.fleet_destroyed() {
            Some(RoundEndReason::FleetDestroyed)
        } else {
            None
        }
    }

    fn end_round(&mut self, reason: RoundEndReason) {
        if let Some(old) = self.active_target.take() {
            self.commands.push(PanelCommand::ClearIndicator { position: old });
        }
        // Neutral wash stays lit through the acknowledgement wait.
        self.commands.push(PanelCommand::SetAll { color: Color::DONE });
        self.emit(GameEvent::RoundOver { score: self.score });
        self.phase = RoundPhase::RoundOver;
        log::info!("round over ({reason:?}), score {}", self.score);
    }

    /// Any button counts; no specific key required.
    fn step_awaiting_ack(&mut self, presses: &[ButtonEvent]) {
        for press in presses.iter().filter(|press| press.pressed) {
            self.ack_count += 1;
            log::debug!(
                "acknowledgement press {}/{} (position {})",
                self.ack_count,
                self.config.ack_presses,
                press.position
            );
            if self.ack_count >= self.config.ack_presses {
                self.commands.push(PanelCommand::SetAll { color: Color::OFF });
                self.phase = RoundPhase::Idle;
                return;
            }
        }
    }

    // --- Helpers ---

    fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Lock the shared battle state. A poisoned lock still yields the data:
    /// the controller never fails the round over a consumer panic.
    fn battle(&self) -> MutexGuard<'_, BattleState> {
        self.battle
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
