//! Core types and definitions for the Broadside arcade game.
//!
//! This crate defines the vocabulary shared across all other crates:
//! the battle model, game events, round phases, and tuning constants.
//! It has no dependency on hardware or any runtime framework.

pub mod battle;
pub mod constants;
pub mod enums;
pub mod events;
