//! Enumeration types shared across the game crates.

use serde::{Deserialize, Serialize};

/// Round lifecycle phase (top-level controller state).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Between rounds: fleet and player are being reset.
    #[default]
    Idle,
    /// Start indicator lit, waiting indefinitely for the start button.
    AwaitingStart,
    /// Scripted light countdown; input is discarded.
    Countdown,
    /// Targets spawning, presses scored.
    Active,
    /// Round just ended, lights cleared, final score published.
    RoundOver,
    /// Waiting for acknowledgement presses before looping back.
    AwaitingAck,
}

/// Why an active round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundEndReason {
    /// The fixed round duration elapsed.
    TimeUp,
    /// The player ship was sunk.
    PlayerSunk,
    /// Every enemy ship was destroyed.
    FleetDestroyed,
}
