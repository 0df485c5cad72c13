//! Broadside application crate: the presentation side of the game.
//!
//! The round controller produces events on a background thread; everything
//! here runs on the main thread — draining the queue, applying battle
//! resolution, advancing cosmetic effects, and drawing the terminal HUD.

pub mod effects;
pub mod hud;
pub mod input;
pub mod presentation;
