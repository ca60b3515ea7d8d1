//! Hexclash engine library.
//!
//! Exposes the board representation, rules resolution, configuration,
//! persistence, and self-play modules for use by integration tests and the
//! binary entry points.

pub mod board;
pub mod config;
pub mod engine;
pub mod intents;
pub mod protocol;
pub mod resolve;
pub mod selfplay;
