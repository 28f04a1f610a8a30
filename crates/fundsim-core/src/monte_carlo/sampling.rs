//! Exit-multiple distributions for the two investment stages.
//!
//! Both samplers are piecewise-uniform mixtures driven by one branch draw
//! `r`, with one further uniform `u` placing the multiple inside its band.
//! The branch tables are calibration constants. Draw counts are part of the
//! reproducibility contract: the zero branch consumes exactly one uniform,
//! every non-zero branch exactly two.

use super::prng::Lcg32;

/// Exit multiple for a company that never graduates past its discovery
/// check: 70% write-offs, a modest middle, a thin tail out to 50x.
///
/// Draws: 1 uniform (zero branch) or 2 uniforms (all others).
pub fn sample_discovery_only(rng: &mut Lcg32) -> f64 {
    let r = rng.uniform();
    if r < 0.70 {
        return 0.0;
    }
    let u = rng.uniform();
    if r < 0.85 {
        0.5 + u * 1.5
    } else if r < 0.92 {
        2.0 + u * 3.0
    } else if r < 0.97 {
        5.0 + u * 5.0
    } else if r < 0.99 {
        10.0 + u * 10.0
    } else {
        20.0 + u * 30.0
    }
}

/// Exit multiple for a company re-drawn after promotion to conviction:
/// half write off, but the tail reaches 150x.
///
/// Draws: 1 uniform (zero branch) or 2 uniforms (all others).
pub fn sample_conviction(rng: &mut Lcg32) -> f64 {
    let r = rng.uniform();
    if r < 0.50 {
        return 0.0;
    }
    let u = rng.uniform();
    if r < 0.77 {
        0.8 + u * 0.4
    } else if r < 0.89 {
        2.5 + u * 1.5
    } else if r < 0.95 {
        5.0 + u * 5.0
    } else if r < 0.985 {
        15.0 + u * 10.0
    } else if r < 0.995 {
        30.0 + u * 20.0
    } else {
        75.0 + u * 75.0
    }
}
