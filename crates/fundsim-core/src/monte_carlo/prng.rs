//! Deterministic pseudo-random source backing the simulation engine.
//!
//! A fixed 32-bit linear congruential generator. Library generators make no
//! cross-version stream guarantee; this one is pinned so that equal seeds
//! reproduce equal results bit-for-bit on any platform.

use std::f64::consts::PI;

const MULTIPLIER: u32 = 1_664_525;
const INCREMENT: u32 = 1_013_904_223;

/// 2^32 as f64, the generator's modulus.
const MODULUS: f64 = 4_294_967_296.0;

/// Seedable 32-bit linear congruential generator.
///
/// Owned by the Monte Carlo driver and passed by exclusive reference into
/// each run; never shared across driver invocations.
#[derive(Debug, Clone)]
pub struct Lcg32 {
    state: u32,
}

impl Lcg32 {
    /// Create a generator from a caller seed, truncated mod 2^32.
    pub fn new(seed: i64) -> Self {
        Self { state: seed as u32 }
    }

    /// Seed from wall-clock milliseconds. Only for callers that explicitly
    /// pass no seed; everything else should seed deterministically.
    pub fn from_clock() -> Self {
        Self::new(chrono::Utc::now().timestamp_millis())
    }

    /// Uniform draw in [0, 1). Consumes one state advance.
    pub fn uniform(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(MULTIPLIER).wrapping_add(INCREMENT);
        self.state as f64 / MODULUS
    }

    /// Gaussian draw via Box-Muller. Consumes two uniforms; the u1 loop
    /// re-draws only on the single state in the cycle that maps to zero,
    /// which keeps `ln` finite without disturbing stream alignment.
    pub fn gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
        let mut u1 = self.uniform();
        while u1 == 0.0 {
            u1 = self.uniform();
        }
        let u2 = self.uniform();
        std_dev * (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos() + mean
    }

    /// Integer draw in [lo, hi], inclusive on both ends. Consumes one
    /// uniform.
    pub fn rand_int(&mut self, lo: i64, hi: i64) -> i64 {
        (self.uniform() * (hi - lo + 1) as f64).floor() as i64 + lo
    }
}
