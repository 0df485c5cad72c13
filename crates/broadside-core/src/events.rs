//! Game events published by the round controller for the presentation loop.

use serde::{Deserialize, Serialize};

/// Messages flowing from the controller thread to the presentation loop.
///
/// Immutable once created, delivered in strict FIFO order over an unbounded
/// single-producer/single-consumer queue. Produced only by the round
/// controller; consumed only by the presentation loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    /// Fleet and player state were reset for a fresh round.
    RoundReset,
    /// Start indicator lit; waiting for the start button.
    AwaitingStart,
    /// Countdown script finished; the round clock is running.
    CountdownDone,
    /// A new target was lit at `index`.
    TargetSpawned { index: usize },
    /// The lit target timed out without being hit.
    TargetEscaped,
    /// The player pressed the lit target. Carries the updated score.
    PlayerHit { score: f64 },
    /// The player pressed the wrong button. Carries the updated score.
    PlayerMiss { score: f64 },
    /// The round ended. Carries the final score.
    RoundOver { score: f64 },
}
