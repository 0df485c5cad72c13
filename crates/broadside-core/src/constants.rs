//! Game tuning constants.

/// Number of button/indicator positions on the panel.
pub const NUM_POSITIONS: usize = 9;

/// Physically addressable light units behind each indicator position.
pub const UNITS_PER_POSITION: usize = 4;

/// Total light units on the strip.
pub const NUM_UNITS: usize = NUM_POSITIONS * UNITS_PER_POSITION;

// --- Round timing ---

/// Length of the active play phase in seconds.
pub const ROUND_DURATION_SECS: f64 = 30.0;

/// How long a target stays lit before it escapes.
pub const MOLE_DURATION_SECS: f64 = 1.0;

/// Duration of the all-red penalty flash after a wrong press.
pub const PENALTY_FLASH_SECS: f64 = 0.2;

/// Unit delay in the countdown light script.
pub const COUNTDOWN_FLASH_SECS: f64 = 0.5;

// --- Input ---

/// Panel position whose press starts a round (the '5' key on the cabinet).
pub const START_POSITION: usize = 4;

/// Button-down events (any position) required to leave the game-over screen.
pub const ACK_PRESSES: u32 = 2;

// --- Presentation ---

/// Frame-rate cap for the presentation loop (Hz).
pub const FRAME_RATE: u32 = 90;

// --- Battle tuning ---

/// Player ship hit points.
pub const PLAYER_MAX_HEALTH: f64 = 10.0;

/// Healing granted per successful hit.
pub const HIT_HEAL: f64 = 0.5;

/// Damage taken per miss or escaped target.
pub const ESCAPE_DAMAGE: f64 = 1.0;

/// Score lost per wrong press.
pub const MISS_PENALTY: f64 = 0.5;

/// Enemy fleet roster: name and hit points, engaged strictly in order.
pub const FLEET_ROSTER: [(&str, i32); 5] = [
    ("Sloop", 5),
    ("Brigantine", 10),
    ("Frigate", 15),
    ("Man-of-War", 15),
    ("Dreadnought", 5),
];
