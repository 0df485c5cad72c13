//! Shared battle model: the enemy fleet and the player ship.
//!
//! Written by the presentation loop (applying consumed events) and read by
//! the round controller (round-end checks), so the state lives behind an
//! `Arc<Mutex>` handle. Producer and consumer views can diverge across the
//! event queue, which is why [`apply_event`] re-validates target existence
//! instead of trusting event payloads.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::constants::{ESCAPE_DAMAGE, FLEET_ROSTER, HIT_HEAL, PLAYER_MAX_HEALTH};
use crate::events::GameEvent;

/// A single enemy ship.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ship {
    pub name: String,
    pub max_health: i32,
    pub current_health: i32,
}

impl Ship {
    pub fn new(name: &str, max_health: i32) -> Self {
        Self {
            name: name.to_string(),
            max_health,
            current_health: max_health,
        }
    }

    /// A ship with no hit points left is out of the round for good.
    pub fn is_destroyed(&self) -> bool {
        self.current_health <= 0
    }

    /// Apply one point of damage. Returns `true` if this sank the ship.
    /// Destroyed ships take no further damage.
    pub fn take_damage(&mut self) -> bool {
        if self.is_destroyed() {
            return false;
        }
        self.current_health -= 1;
        self.is_destroyed()
    }
}

/// Player ship hit points. Fractional because hits heal half a point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerVitality {
    pub current: f64,
    pub max: f64,
}

impl PlayerVitality {
    pub fn new(max: f64) -> Self {
        Self { current: max, max }
    }

    pub fn is_sunk(&self) -> bool {
        self.current <= 0.0
    }

    /// Heal, capped at max health.
    pub fn heal(&mut self, amount: f64) {
        self.current = (self.current + amount).min(self.max);
    }

    /// Damage, floored at zero.
    pub fn damage(&mut self, amount: f64) {
        self.current = (self.current - amount).max(0.0);
    }
}

/// The complete cross-thread battle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleState {
    pub fleet: Vec<Ship>,
    pub player: PlayerVitality,
}

impl Default for BattleState {
    fn default() -> Self {
        Self::new()
    }
}

impl BattleState {
    /// Build the reference fleet and a full-health player.
    pub fn new() -> Self {
        let fleet = FLEET_ROSTER
            .iter()
            .map(|&(name, hp)| Ship::new(name, hp))
            .collect();
        Self {
            fleet,
            player: PlayerVitality::new(PLAYER_MAX_HEALTH),
        }
    }

    /// Restore every ship and the player to full health.
    ///
    /// Called by the round controller at the top of each round; the only
    /// point where ship health may increase.
    pub fn reset(&mut self) {
        for ship in &mut self.fleet {
            ship.current_health = ship.max_health;
        }
        self.player.current = self.player.max;
    }

    /// Index of the current target: the first non-destroyed ship in fleet
    /// order. Destroyed ships are permanently skipped within a round.
    pub fn current_target(&self) -> Option<usize> {
        self.fleet.iter().position(|ship| !ship.is_destroyed())
    }

    /// The current target ship, if any remains afloat.
    pub fn current_target_ship(&self) -> Option<&Ship> {
        self.current_target().map(|i| &self.fleet[i])
    }

    /// True when no enemy ship is left afloat.
    pub fn fleet_destroyed(&self) -> bool {
        self.current_target().is_none()
    }
}

/// Handle shared between the controller thread and the presentation loop.
pub type SharedBattle = Arc<Mutex<BattleState>>;

/// Create a freshly initialized shared battle state.
pub fn shared_battle() -> SharedBattle {
    Arc::new(Mutex::new(BattleState::new()))
}

/// What the presentation layer should animate for a consumed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Impact {
    /// Cannonball from the player to the targeted ship.
    Hit { target: usize, sunk: bool },
    /// Return fire from the leading enemy ship against the player.
    ReturnFire { source: usize },
}

/// Apply a consumed game event to the battle state.
///
/// Target existence and player vitality are re-checked here at consumption
/// time: the controller's view when it produced the event may be stale by
/// the time the presentation loop drains it.
pub fn apply_event(state: &mut BattleState, event: &GameEvent) -> Option<Impact> {
    match event {
        GameEvent::RoundReset => {
            // Reset itself is controller-side; nothing to mutate here.
            None
        }
        GameEvent::PlayerHit { .. } => {
            let target = state.current_target()?;
            let sunk = state.fleet[target].take_damage();
            state.player.heal(HIT_HEAL);
            Some(Impact::Hit { target, sunk })
        }
        GameEvent::PlayerMiss { .. } | GameEvent::TargetEscaped => {
            let source = state.current_target()?;
            if state.player.is_sunk() {
                return None;
            }
            state.player.damage(ESCAPE_DAMAGE);
            Some(Impact::ReturnFire { source })
        }
        _ => None,
    }
}
