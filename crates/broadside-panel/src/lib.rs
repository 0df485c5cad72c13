//! Button/LED panel abstraction.
//!
//! The arcade cabinet drives an addressable LED strip (four light units per
//! button) and reads a keypad-style input device. This crate fixes the
//! contract the round controller needs — non-blocking polling plus indicator
//! addressing — and ships a simulated implementation for tests and
//! hardware-less runs. The real strip/keypad driver lives outside this
//! workspace and only has to implement [`ButtonPanel`].

mod sim;

pub use sim::{PanelProbe, SimulatedPanel};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use broadside_core::constants::{NUM_POSITIONS, UNITS_PER_POSITION};

/// Default input device node on the cabinet.
pub const DEVICE_PATH: &str = "/dev/input/event0";

/// Indicator brightness used for every light the game drives (0.0..=1.0).
pub const BRIGHTNESS: f32 = 0.25;

/// RGB color for the indicator lights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Lights off.
    pub const OFF: Color = Color::new(0, 0, 0);
    /// Active target (and start indicator).
    pub const TARGET: Color = Color::new(0, 255, 0);
    /// Wrong-press penalty flash.
    pub const PENALTY: Color = Color::new(255, 0, 0);
    /// Countdown wash.
    pub const COUNTDOWN: Color = Color::new(0, 0, 255);
    /// Neutral round-over wash.
    pub const DONE: Color = Color::new(255, 255, 255);
}

/// One button transition read from the input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonEvent {
    /// Panel position, 0..NUM_POSITIONS.
    pub position: usize,
    /// True for button-down. Only down transitions drive the game.
    pub pressed: bool,
}

impl ButtonEvent {
    /// A button-down transition at `position`.
    pub fn down(position: usize) -> Self {
        Self {
            position,
            pressed: true,
        }
    }
}

/// Range of physical light units backing indicator `position`.
///
/// Each position owns exactly one contiguous block; lighting or clearing a
/// position must touch that block and nothing else.
pub fn unit_range(position: usize) -> std::ops::Range<usize> {
    debug_assert!(position < NUM_POSITIONS);
    let start = position * UNITS_PER_POSITION;
    start..start + UNITS_PER_POSITION
}

/// Failure modes for panel initialization.
///
/// Initialization failure downgrades the run to simulation mode; it is never
/// fatal to the game.
#[derive(Debug, Error)]
pub enum PanelError {
    #[error("input device not found at {0}")]
    DeviceNotFound(String),
    #[error("panel I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Probe for the cabinet input device node.
///
/// Decided once at startup: callers that get an `Err` run the identical game
/// against a [`SimulatedPanel`] (or no panel at all) instead of refusing to
/// start.
pub fn probe_device(path: &str) -> Result<(), PanelError> {
    match std::fs::metadata(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PanelError::DeviceNotFound(path.to_string()))
        }
        Err(e) => Err(PanelError::Io(e)),
    }
}

/// Contract between the round controller and the physical panel.
///
/// All methods are non-blocking. Implementations swallow transient device
/// errors during polling and report them as "no events this poll".
pub trait ButtonPanel: Send {
    /// Set every light unit on the strip to `color`.
    fn set_all(&mut self, color: Color);

    /// Light the unit block backing `position`.
    fn set_indicator(&mut self, position: usize, color: Color);

    /// Turn off the block backing `position`. Idempotent.
    fn clear_indicator(&mut self, position: usize) {
        self.set_indicator(position, Color::OFF);
    }

    /// Drain button transitions that arrived since the last poll.
    /// Returns an empty list on no data or device error.
    fn poll_events(&mut self) -> Vec<ButtonEvent>;
}

/// Instructions emitted by the round engine for the controller thread to
/// execute against the panel, in order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelCommand {
    SetAll { color: Color },
    SetIndicator { position: usize, color: Color },
    ClearIndicator { position: usize },
    /// Synchronous flash: all lights `color` for `secs`, then off. Blocks
    /// the controller thread for the duration; the penalty is meant to be
    /// felt as a pause.
    FlashAll { color: Color, secs: f64 },
}
