//! Shared test fixtures and utilities for the tumble crates.
//!
//! Provides deterministic RNG setup, random orientations, and a rigid
//! six-bar model whose cables record every command they receive.

pub mod mocks;
pub mod rng;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use mocks::{RecordingCable, RigidSixBar};
pub use rng::{random_direction, random_orientation, seeded_rng};
