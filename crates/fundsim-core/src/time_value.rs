use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FundSimError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::FundSimResult;

const CONVERGENCE_TOLERANCE: f64 = 1e-6;
const MAX_ITERATIONS: u32 = 100;

/// Rates below this are treated as non-physical by both solvers.
const RATE_FLOOR: f64 = -0.99;
const NEWTON_RATE_CEILING: f64 = 10.0;
const BISECTION_RATE_CEILING: f64 = 5.0;

/// Net Present Value of a series of annual cash flows at the given rate.
/// Index 0 is year 0 (undiscounted); discount factors build iteratively.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> f64 {
    let one_plus_r = 1.0 + rate;
    let mut discount = 1.0;
    let mut total = 0.0;
    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount *= one_plus_r;
        }
        total += cf / discount;
    }
    total
}

/// Internal Rate of Return for annual cash flows.
///
/// Newton-Raphson from a 10% guess; when the derivative flattens or the
/// iterations run out, bisection on [-0.99, 5.0] takes over. Returns `None`
/// when the bisection bracket has same-sign NPV at both ends; callers
/// substitute their own default rather than failing the run.
pub fn irr(cash_flows: &[Money]) -> Option<Rate> {
    if cash_flows.len() < 2 {
        return None;
    }

    let mut rate: f64 = 0.10;

    for _ in 0..MAX_ITERATIONS {
        let mut npv_val = 0.0;
        let mut dnpv = 0.0;
        let one_plus_r = 1.0 + rate;
        let mut discount = 1.0; // (1+r)^t

        for (t, cf) in cash_flows.iter().enumerate() {
            if t > 0 {
                discount *= one_plus_r;
            }
            npv_val += cf / discount;
            if t > 0 {
                // d/dr of cf * (1+r)^-t
                dnpv -= t as f64 * cf / (discount * one_plus_r);
            }
        }

        if npv_val.abs() < CONVERGENCE_TOLERANCE {
            return Some(rate);
        }
        if dnpv.abs() < CONVERGENCE_TOLERANCE {
            break;
        }

        rate -= npv_val / dnpv;
        rate = rate.clamp(RATE_FLOOR, NEWTON_RATE_CEILING);
    }

    bisect(cash_flows)
}

/// Bisection fallback. Guaranteed progress on NPV curves where Newton
/// oscillates or the derivative vanishes.
fn bisect(cash_flows: &[Money]) -> Option<Rate> {
    let mut lo = RATE_FLOOR;
    let mut hi = BISECTION_RATE_CEILING;
    let mut npv_lo = npv(lo, cash_flows);
    let npv_hi = npv(hi, cash_flows);

    if npv_lo * npv_hi > 0.0 {
        return None;
    }

    let mut mid = 0.5 * (lo + hi);
    for _ in 0..MAX_ITERATIONS {
        mid = 0.5 * (lo + hi);
        let npv_mid = npv(mid, cash_flows);

        if npv_mid.abs() < CONVERGENCE_TOLERANCE || 0.5 * (hi - lo) < CONVERGENCE_TOLERANCE {
            return Some(mid);
        }

        if (npv_mid > 0.0) == (npv_lo > 0.0) {
            lo = mid;
            npv_lo = npv_mid;
        } else {
            hi = mid;
        }
    }

    Some(mid)
}

// ---------------------------------------------------------------------------
// Wrapped entry point for hosts
// ---------------------------------------------------------------------------

/// Input for the standalone IRR solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrInput {
    /// Annual net cash flows; index 0 = year 0, negative = capital out
    pub cash_flows: Vec<Money>,
}

/// Output of the standalone IRR solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrOutput {
    /// The solved rate; absent when neither method converged
    pub irr: Option<Rate>,
    /// NPV of the series re-evaluated at the solved rate
    pub npv_at_irr: Option<Money>,
}

/// Solve the IRR of a cash-flow series, envelope included.
pub fn solve_irr(input: &IrrInput) -> FundSimResult<ComputationOutput<IrrOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.cash_flows.len() < 2 {
        return Err(FundSimError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let solved = irr(&input.cash_flows);
    if solved.is_none() {
        warnings.push("IRR did not converge; no sign change on the bisection bracket".into());
    }

    let output = IrrOutput {
        irr: solved,
        npv_at_irr: solved.map(|r| npv(r, &input.cash_flows)),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "IRR: Newton-Raphson with bisection fallback",
        &serde_json::json!({
            "num_cash_flows": input.cash_flows.len(),
            "newton_guess": 0.10,
            "tolerance": CONVERGENCE_TOLERANCE,
        }),
        warnings,
        elapsed,
        output,
    ))
}
