//! In-memory panel for tests and hardware-less runs.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};

use broadside_core::constants::NUM_UNITS;

use crate::{unit_range, ButtonEvent, ButtonPanel, Color};

/// A panel that records light-unit state in memory and takes button presses
/// from a channel. Behaves exactly like the cabinet from the controller's
/// point of view: non-blocking polls, idempotent light ops.
pub struct SimulatedPanel {
    units: Arc<Mutex<Vec<Color>>>,
    presses: Receiver<ButtonEvent>,
}

/// Handle for driving and observing a [`SimulatedPanel`] from outside the
/// controller thread: inject presses, inspect light units.
#[derive(Clone)]
pub struct PanelProbe {
    units: Arc<Mutex<Vec<Color>>>,
    sender: Sender<ButtonEvent>,
}

impl SimulatedPanel {
    pub fn new() -> (Self, PanelProbe) {
        let units = Arc::new(Mutex::new(vec![Color::OFF; NUM_UNITS]));
        let (sender, presses) = mpsc::channel();
        let probe = PanelProbe {
            units: units.clone(),
            sender,
        };
        (Self { units, presses }, probe)
    }

    fn units(&self) -> std::sync::MutexGuard<'_, Vec<Color>> {
        self.units
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ButtonPanel for SimulatedPanel {
    fn set_all(&mut self, color: Color) {
        self.units().fill(color);
    }

    fn set_indicator(&mut self, position: usize, color: Color) {
        let mut units = self.units();
        for unit in unit_range(position) {
            units[unit] = color;
        }
    }

    fn poll_events(&mut self) -> Vec<ButtonEvent> {
        let mut events = Vec::new();
        loop {
            match self.presses.try_recv() {
                Ok(event) => events.push(event),
                // A dropped probe means no more input will ever arrive;
                // the contract is "empty on no data or error".
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        events
    }
}

impl PanelProbe {
    /// Inject a button-down transition.
    pub fn press(&self, position: usize) {
        let _ = self.sender.send(ButtonEvent::down(position));
    }

    /// Inject an arbitrary transition.
    pub fn send(&self, event: ButtonEvent) {
        let _ = self.sender.send(event);
    }

    /// Color of a single light unit.
    pub fn unit(&self, index: usize) -> Color {
        self.units()[index]
    }

    /// Positions with at least one lit unit.
    pub fn lit_positions(&self) -> Vec<usize> {
        let units = self.units();
        (0..broadside_core::constants::NUM_POSITIONS)
            .filter(|&position| unit_range(position).any(|unit| units[unit] != Color::OFF))
            .collect()
    }

    /// True when the whole strip is dark.
    pub fn all_off(&self) -> bool {
        self.units().iter().all(|&unit| unit == Color::OFF)
    }

    fn units(&self) -> std::sync::MutexGuard<'_, Vec<Color>> {
        self.units
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
