//! Deterministic RNG utilities for reproducible tests.

use nalgebra::{UnitQuaternion, Vector3};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Create a deterministic `ChaCha8Rng` from a seed.
///
/// All test randomization should go through this to ensure reproducibility.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Uniformly distributed rotation (Shoemake's method).
pub fn random_orientation(rng: &mut impl Rng) -> UnitQuaternion<f64> {
    let u1: f64 = rng.r#gen();
    let u2: f64 = rng.r#gen::<f64>() * std::f64::consts::TAU;
    let u3: f64 = rng.r#gen::<f64>() * std::f64::consts::TAU;
    let (a, b) = ((1.0 - u1).sqrt(), u1.sqrt());
    UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(
        b * u3.cos(),
        a * u2.sin(),
        a * u2.cos(),
        b * u3.sin(),
    ))
}

/// Unit vector in the ground plane at a uniform heading.
pub fn random_direction(rng: &mut impl Rng) -> Vector3<f64> {
    let heading = rng.r#gen::<f64>() * std::f64::consts::TAU;
    Vector3::new(heading.cos(), heading.sin(), 0.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
