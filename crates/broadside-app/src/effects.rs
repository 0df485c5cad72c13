//! Cosmetic battle effects: cannonballs in flight and explosions.
//!
//! Purely visual. All gameplay mutation happens when an event is consumed,
//! before its effect is spawned; an effect landing changes nothing.

use glam::Vec2;

use broadside_core::constants::FLEET_ROSTER;

/// Stage units advanced per frame by a cannonball.
const SHOT_SPEED: f32 = 10.0;

/// Frames an explosion stays on stage.
const EXPLOSION_FRAMES: u32 = 15;

/// Nominal stage the effects fly across. Renderers scale as they like;
/// these are stage coordinates, not pixels.
pub const STAGE: Vec2 = Vec2::new(800.0, 600.0);

/// Standoff distance of the fleet ring around the player.
const FLEET_RADIUS: f32 = 240.0;

/// Player ship anchor: center stage.
pub fn player_position() -> Vec2 {
    STAGE * 0.5
}

/// Fixed anchor for fleet slot `index`, evenly spaced on a ring around the
/// player. (The original scattered ships randomly; decorative placement is
/// not part of the game contract, so a fixed ring does.)
pub fn ship_position(index: usize) -> Vec2 {
    let angle = std::f32::consts::TAU * index as f32 / FLEET_ROSTER.len() as f32;
    player_position() + Vec2::new(angle.cos(), angle.sin()) * FLEET_RADIUS
}

#[derive(Debug, Clone, Copy)]
enum EffectKind {
    /// A cannonball travelling from `start` to `end`.
    Cannonball { explode_on_arrival: bool },
    /// A stationary explosion with a frame lifetime.
    Explosion { frames_left: u32 },
}

#[derive(Debug, Clone, Copy)]
struct Effect {
    kind: EffectKind,
    start: Vec2,
    end: Vec2,
    /// Distance covered so far, in stage units.
    progress: f32,
}

impl Effect {
    fn position(&self) -> Vec2 {
        let total = self.start.distance(self.end);
        if total <= f32::EPSILON {
            return self.end;
        }
        let t = (self.progress / total).min(1.0);
        self.start.lerp(self.end, t)
    }
}

/// All live effects, advanced once per frame.
#[derive(Debug, Default)]
pub struct Effects {
    active: Vec<Effect>,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Player cannonball toward fleet slot `target`; explodes on landing.
    pub fn fire_at_ship(&mut self, target: usize) {
        self.spawn_shot(player_position(), ship_position(target), true);
    }

    /// Return fire from fleet slot `source` toward the player.
    pub fn return_fire(&mut self, source: usize) {
        self.spawn_shot(ship_position(source), player_position(), false);
    }

    fn spawn_shot(&mut self, start: Vec2, end: Vec2, explode_on_arrival: bool) {
        self.active.push(Effect {
            kind: EffectKind::Cannonball { explode_on_arrival },
            start,
            end,
            progress: 0.0,
        });
    }

    /// Advance every effect one frame: move cannonballs, spawn explosions on
    /// landing, expire finished explosions.
    pub fn update(&mut self) {
        let mut spawned = Vec::new();
        self.active.retain_mut(|effect| match &mut effect.kind {
            EffectKind::Cannonball { explode_on_arrival } => {
                effect.progress += SHOT_SPEED;
                if effect.progress >= effect.start.distance(effect.end) {
                    if *explode_on_arrival {
                        spawned.push(Effect {
                            kind: EffectKind::Explosion {
                                frames_left: EXPLOSION_FRAMES,
                            },
                            start: effect.end,
                            end: effect.end,
                            progress: 0.0,
                        });
                    }
                    false
                } else {
                    true
                }
            }
            EffectKind::Explosion { frames_left } => {
                *frames_left = frames_left.saturating_sub(1);
                *frames_left > 0
            }
        });
        self.active.extend(spawned);
    }

    /// Cannonballs currently travelling.
    pub fn in_flight(&self) -> usize {
        self.active
            .iter()
            .filter(|e| matches!(e.kind, EffectKind::Cannonball { .. }))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Drop everything (new round).
    pub fn clear(&mut self) {
        self.active.clear();
    }
}
