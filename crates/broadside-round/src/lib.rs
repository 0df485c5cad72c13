//! The round controller: game timing, target scheduling, and scoring.
//!
//! [`engine::RoundEngine`] is the headless state machine — stepped with a
//! monotonic timestamp and the presses gathered since the last poll, it
//! returns the game events and panel commands that step produced. Completely
//! deterministic for a given seed and input timeline, enabling scenario
//! testing without threads or sleeps.
//!
//! [`controller::spawn_controller`] wraps the engine in a dedicated worker
//! thread that polls the physical panel, executes light commands (including
//! the deliberately blocking penalty flash), and forwards events to the
//! presentation loop.

pub mod controller;
pub mod engine;

#[cfg(test)]
mod tests;
