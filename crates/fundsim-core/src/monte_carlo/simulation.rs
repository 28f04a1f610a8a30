use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Instant;

use super::prng::Lcg32;
use super::sampling::{sample_conviction, sample_discovery_only};
use crate::error::FundSimError;
use crate::time_value::irr;
use crate::types::{with_metadata, ComputationOutput, Money, Multiple, Rate};
use crate::FundSimResult;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Fund construction parameters for the two-stage check-writing policy.
///
/// Deserializes field-by-field over `Default`, so an empty JSON object
/// yields the reference fund.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FundParams {
    /// Total LP commitments
    pub fund_size: Money,
    /// Fund life in years
    pub fund_life: u32,
    /// Annual management fee as a fraction of fund size
    pub mgmt_fee_rate: Rate,
    /// Years charged at the full fee rate
    pub mgmt_fee_full_years: u32,
    /// Fraction of the full fee charged after the full-rate years
    pub mgmt_fee_stepdown: Rate,
    /// Carried interest on profit above called capital
    pub carry: Rate,
    /// First-check size for discovery investments
    pub discovery_check_size: Money,
    /// Number of discovery checks written
    pub max_discovery_checks: u32,
    /// Check size for conviction investments
    pub conviction_check_size: Money,
    /// Lower display bound for the conviction check; hosts only
    pub conviction_check_min: Money,
    /// Upper display bound for the conviction check; hosts only
    pub conviction_check_max: Money,
    /// Share of discovery companies promoted to conviction
    pub graduation_rate: Rate,
    /// Fraction of fund size reserved for follow-on rounds
    pub follow_on_reserve_percent: Rate,
}

impl Default for FundParams {
    fn default() -> Self {
        Self {
            fund_size: 25_000_000.0,
            fund_life: 10,
            mgmt_fee_rate: 0.02,
            mgmt_fee_full_years: 4,
            mgmt_fee_stepdown: 0.7,
            carry: 0.20,
            discovery_check_size: 100_000.0,
            max_discovery_checks: 75,
            conviction_check_size: 400_000.0,
            conviction_check_min: 250_000.0,
            conviction_check_max: 500_000.0,
            graduation_rate: 0.25,
            follow_on_reserve_percent: 0.20,
        }
    }
}

/// Top-level input for the Monte Carlo driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloInput {
    #[serde(default)]
    pub params: FundParams,
    /// Number of fund realizations (default 5,000)
    #[serde(default = "default_num_simulations")]
    pub num_simulations: u32,
    /// Seed for the random stream; wall-clock milliseconds when absent
    #[serde(default)]
    pub seed: Option<i64>,
}

fn default_num_simulations() -> u32 {
    5_000
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Outcome of one simulated fund realization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub total_called: Money,
    pub total_dist_gross: Money,
    pub total_dist_net: Money,
    pub gross_tvpi: Multiple,
    pub net_tvpi: Multiple,
    pub dpi_gross: Multiple,
    pub dpi_net: Multiple,
    /// Net IRR as a fraction; 0 when the solver cannot converge
    pub irr_net: Rate,
    pub carry_paid: Money,
    pub discovery_only_count: u32,
    pub conviction_count: u32,
    pub follow_on_count: u32,
}

/// Seven-number summary over one per-run metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub mean: f64,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub min: f64,
    pub max: f64,
}

/// Aggregate output of the Monte Carlo driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloResults {
    /// Every per-run result, in run order
    pub runs: Vec<SimulationResult>,
    pub gross_tvpi: SimulationSummary,
    pub net_tvpi: SimulationSummary,
    pub dpi_net: SimulationSummary,
    pub irr_net: SimulationSummary,
    /// Share of runs with net TVPI of at least 1x
    pub prob_return_fund: f64,
    /// Share of runs with net TVPI of at least 2x
    pub prob_2x: f64,
    /// Share of runs with net TVPI of at least 3x
    pub prob_3x: f64,
    pub params: FundParams,
    pub num_simulations: u32,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn require_fraction(value: f64, field: &str) -> FundSimResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(FundSimError::InvalidInput {
            field: field.into(),
            reason: "Must be a fraction between 0 and 1".into(),
        })
    }
}

fn require_non_negative(value: f64, field: &str) -> FundSimResult<()> {
    // NaN fails the comparison and is rejected with everything else
    if value >= 0.0 {
        Ok(())
    } else {
        Err(FundSimError::InvalidInput {
            field: field.into(),
            reason: "Must be non-negative".into(),
        })
    }
}

/// Reject malformed parameters before any sampling happens. Hosts may run
/// the same checks earlier; the engine never relies on that.
pub fn validate_params(params: &FundParams) -> FundSimResult<()> {
    require_non_negative(params.fund_size, "fund_size")?;
    if params.fund_life == 0 {
        return Err(FundSimError::InvalidInput {
            field: "fund_life".into(),
            reason: "Fund life must be at least 1 year".into(),
        });
    }
    require_fraction(params.mgmt_fee_rate, "mgmt_fee_rate")?;
    require_fraction(params.mgmt_fee_stepdown, "mgmt_fee_stepdown")?;
    require_fraction(params.carry, "carry")?;
    require_fraction(params.graduation_rate, "graduation_rate")?;
    require_fraction(params.follow_on_reserve_percent, "follow_on_reserve_percent")?;
    if params.mgmt_fee_full_years > params.fund_life {
        return Err(FundSimError::InvalidInput {
            field: "mgmt_fee_full_years".into(),
            reason: "Cannot exceed fund_life".into(),
        });
    }
    require_non_negative(params.discovery_check_size, "discovery_check_size")?;
    require_non_negative(params.conviction_check_size, "conviction_check_size")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Fund arithmetic helpers
// ---------------------------------------------------------------------------

/// Management fees over the whole fund life: full rate for the first
/// `mgmt_fee_full_years`, stepped down after.
fn total_management_fees(params: &FundParams) -> Money {
    let annual = params.mgmt_fee_rate * params.fund_size;
    let mut total = 0.0;
    for year in 1..=params.fund_life {
        total += if year <= params.mgmt_fee_full_years {
            annual
        } else {
            params.mgmt_fee_stepdown * annual
        };
    }
    total
}

/// Promoted cohort size. `f64::round` is half-away-from-zero, the
/// convention that keeps cohort sizes identical across platforms.
fn conviction_cohort_size(params: &FundParams) -> usize {
    (params.max_discovery_checks as f64 * params.graduation_rate).round() as usize
}

// ---------------------------------------------------------------------------
// Single realization
// ---------------------------------------------------------------------------

/// Run one fund realization against the shared random stream.
///
/// The draw sequence is fixed by the parameters alone: per discovery
/// company one outcome draw then one signal gaussian; one conviction
/// re-draw per promoted company, in rank order; one exit-year draw per
/// company, in index order. Reordering any of these breaks seed
/// reproducibility.
pub fn simulate_once(params: &FundParams, rng: &mut Lcg32) -> SimulationResult {
    let num_discovery = params.max_discovery_checks as usize;
    let num_conviction = conviction_cohort_size(params);
    let follow_on_reserve = params.fund_size * params.follow_on_reserve_percent;

    // Base outcomes plus a noisy traction signal, interleaved per company
    let mut outcomes = Vec::with_capacity(num_discovery);
    let mut signals = Vec::with_capacity(num_discovery);
    for _ in 0..num_discovery {
        let outcome = sample_discovery_only(rng);
        let signal = (outcome + 0.1).ln() + rng.gaussian(0.0, 1.0);
        outcomes.push(outcome);
        signals.push(signal);
    }

    // Promote the strongest signals; ties resolve to the earlier company
    let mut ranked: Vec<usize> = (0..num_discovery).collect();
    ranked.sort_by(|&a, &b| {
        signals[b]
            .partial_cmp(&signals[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });
    let conviction_rank = &ranked[..num_conviction];

    // Promotion conditions the outcome on being in the top of the cohort:
    // the selected companies re-draw from the conviction distribution.
    // Re-draws consume the stream in rank order.
    let mut is_conviction = vec![false; num_discovery];
    for &i in conviction_rank {
        is_conviction[i] = true;
        outcomes[i] = sample_conviction(rng);
    }

    // Follow-on winners: the reserve spreads evenly over the conviction
    // companies with the largest re-drawn outcomes.
    let avg_follow_on_check = 0.5 * params.conviction_check_size;
    let reserve_capacity = if avg_follow_on_check > 0.0 {
        (follow_on_reserve / avg_follow_on_check).floor()
    } else {
        f64::INFINITY
    };
    let num_follow_on =
        reserve_capacity.min((0.4 * num_conviction as f64).round()) as usize;

    let mut follow_on_rank: Vec<usize> = conviction_rank.to_vec();
    follow_on_rank.sort_by(|&a, &b| {
        outcomes[b]
            .partial_cmp(&outcomes[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });
    let mut is_follow_on = vec![false; num_discovery];
    for &i in &follow_on_rank[..num_follow_on] {
        is_follow_on[i] = true;
    }
    let follow_on_check_size = if num_follow_on > 0 {
        follow_on_reserve / num_follow_on as f64
    } else {
        0.0
    };

    // Annual cash-flow buckets, year 0 empty. All first checks land in
    // year 1; the follow-on reserve stages out over years 2-3.
    let horizon = params.fund_life as usize;
    let mut cash_flows = vec![0.0_f64; horizon + 1];
    cash_flows[1.min(horizon)] -= num_discovery as f64 * params.discovery_check_size;
    cash_flows[1.min(horizon)] -= num_conviction as f64 * params.conviction_check_size;
    if num_follow_on > 0 {
        // The reserve deploys in full even when the per-company check
        // floors below it.
        // TODO: reconcile full-reserve deployment with the floored
        // per-company follow-on check sizing.
        cash_flows[2.min(horizon)] -= 0.5 * follow_on_reserve;
        cash_flows[3.min(horizon)] -= 0.5 * follow_on_reserve;
    }

    // Exits. rand_int(4, fund_life) stays in range for fund lives of four
    // years or more; shorter horizons clamp into the final year.
    let mut total_dist_gross = 0.0;
    for i in 0..num_discovery {
        let exit_year = rng
            .rand_int(4, params.fund_life as i64)
            .clamp(0, horizon as i64) as usize;

        let dist = if is_conviction[i] {
            let invested = params.discovery_check_size + params.conviction_check_size;
            let mut dist = invested * outcomes[i];
            if is_follow_on[i] {
                // Follow-on dollars enter ~3x higher, so they earn a third
                // of the company multiple
                dist += follow_on_check_size * (outcomes[i] / 3.0).max(0.0);
            }
            dist
        } else {
            params.discovery_check_size * outcomes[i]
        };

        cash_flows[exit_year] += dist;
        total_dist_gross += dist;
    }

    // Metrics. A zero-called fund defines every multiple (and IRR) as 0.
    let total_called: f64 = cash_flows.iter().filter(|cf| **cf < 0.0).map(|cf| -*cf).sum();
    let gross_tvpi = if total_called > 0.0 {
        total_dist_gross / total_called
    } else {
        0.0
    };
    let profit = total_dist_gross - total_called;
    let carry_paid = profit.max(0.0) * params.carry;
    let total_dist_net = total_dist_gross - carry_paid;
    let net_tvpi = if total_called > 0.0 {
        total_dist_net / total_called
    } else {
        0.0
    };

    // Net IRR over the same series with carry settled in the final year
    let irr_net = if total_called > 0.0 {
        let mut net_flows = cash_flows;
        net_flows[horizon] -= carry_paid;
        irr(&net_flows).unwrap_or(0.0)
    } else {
        0.0
    };

    SimulationResult {
        total_called,
        total_dist_gross,
        total_dist_net,
        gross_tvpi,
        net_tvpi,
        dpi_gross: gross_tvpi,
        dpi_net: net_tvpi,
        irr_net,
        carry_paid,
        discovery_only_count: (num_discovery - num_conviction) as u32,
        conviction_count: num_conviction as u32,
        follow_on_count: num_follow_on as u32,
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Percentile from a **sorted** slice, linear interpolation between the
/// two neighbouring order statistics (the Type-7 convention).
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

fn summarize(mut values: Vec<f64>) -> SimulationSummary {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    SimulationSummary {
        mean,
        p10: percentile_sorted(&values, 10.0),
        p25: percentile_sorted(&values, 25.0),
        p50: percentile_sorted(&values, 50.0),
        p75: percentile_sorted(&values, 75.0),
        p90: percentile_sorted(&values, 90.0),
        min: values[0],
        max: values[values.len() - 1],
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Run the full Monte Carlo study: N sequential realizations sharing one
/// random stream, aggregated into summaries and tail probabilities.
///
/// Sequential sharing of the stream is load-bearing: equal (params, N,
/// seed) must reproduce every floating-point field exactly.
pub fn run_monte_carlo(
    input: &MonteCarloInput,
) -> FundSimResult<ComputationOutput<MonteCarloResults>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_params(&input.params)?;
    if input.num_simulations == 0 {
        return Err(FundSimError::InvalidInput {
            field: "num_simulations".into(),
            reason: "Must be at least 1".into(),
        });
    }

    let params = &input.params;

    // Capital-constraint diagnostic. The engine surfaces the overshoot and
    // proceeds unscaled; mis-configuration is a host decision to fix.
    let investable_capital = params.fund_size - total_management_fees(params);
    let deployable_capital =
        investable_capital - params.fund_size * params.follow_on_reserve_percent;
    let planned_checks = params.max_discovery_checks as f64 * params.discovery_check_size
        + conviction_cohort_size(params) as f64 * params.conviction_check_size;
    if planned_checks > deployable_capital {
        warnings.push(format!(
            "Planned first checks ({planned_checks:.0}) exceed deployable capital \
             ({deployable_capital:.0}); proceeding without scaling"
        ));
    }

    let mut rng = match input.seed {
        Some(seed) => Lcg32::new(seed),
        None => Lcg32::from_clock(),
    };

    let n = input.num_simulations as usize;
    let mut runs = Vec::with_capacity(n);
    for _ in 0..n {
        runs.push(simulate_once(params, &mut rng));
    }

    let gross_tvpi = summarize(runs.iter().map(|r| r.gross_tvpi).collect());
    let net_tvpi = summarize(runs.iter().map(|r| r.net_tvpi).collect());
    let dpi_net = summarize(runs.iter().map(|r| r.dpi_net).collect());
    let irr_net = summarize(runs.iter().map(|r| r.irr_net).collect());

    let share_at_least =
        |t: f64| runs.iter().filter(|r| r.net_tvpi >= t).count() as f64 / n as f64;
    let prob_return_fund = share_at_least(1.0);
    let prob_2x = share_at_least(2.0);
    let prob_3x = share_at_least(3.0);

    let results = MonteCarloResults {
        runs,
        gross_tvpi,
        net_tvpi,
        dpi_net,
        irr_net,
        prob_return_fund,
        prob_2x,
        prob_3x,
        params: params.clone(),
        num_simulations: input.num_simulations,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Two-Stage Fund Construction: Monte Carlo",
        &serde_json::json!({
            "num_simulations": input.num_simulations,
            "seed": input.seed,
            "fund_size": params.fund_size,
            "fund_life": params.fund_life,
            "max_discovery_checks": params.max_discovery_checks,
            "graduation_rate": params.graduation_rate,
            "follow_on_reserve_percent": params.follow_on_reserve_percent,
        }),
        warnings,
        elapsed,
        results,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn input(params: FundParams, n: u32, seed: i64) -> MonteCarloInput {
        MonteCarloInput {
            params,
            num_simulations: n,
            seed: Some(seed),
        }
    }

    fn default_runs(n: u32, seed: i64) -> Vec<SimulationResult> {
        run_monte_carlo(&input(FundParams::default(), n, seed))
            .unwrap()
            .result
            .runs
    }

    // --- Parameters ---

    #[test]
    fn test_default_params_are_the_reference_fund() {
        let p = FundParams::default();
        assert_eq!(p.fund_size, 25_000_000.0);
        assert_eq!(p.fund_life, 10);
        assert_eq!(p.mgmt_fee_full_years, 4);
        assert_eq!(p.max_discovery_checks, 75);
        assert_eq!(p.conviction_check_size, 400_000.0);
        assert_eq!(p.graduation_rate, 0.25);
    }

    #[test]
    fn test_empty_json_input_gets_defaults() {
        let parsed: MonteCarloInput = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.num_simulations, 5_000);
        assert_eq!(parsed.seed, None);
        assert_eq!(parsed.params.fund_size, 25_000_000.0);
    }

    #[test]
    fn test_validation_rejects_bad_params() {
        let cases: Vec<(&str, Box<dyn Fn(&mut FundParams)>)> = vec![
            ("fund_size", Box::new(|p| p.fund_size = -1.0)),
            ("fund_life", Box::new(|p| p.fund_life = 0)),
            ("carry", Box::new(|p| p.carry = 1.5)),
            ("graduation_rate", Box::new(|p| p.graduation_rate = -0.1)),
            ("mgmt_fee_rate", Box::new(|p| p.mgmt_fee_rate = f64::NAN)),
            ("mgmt_fee_full_years", Box::new(|p| p.mgmt_fee_full_years = 99)),
            (
                "discovery_check_size",
                Box::new(|p| p.discovery_check_size = -5.0),
            ),
        ];
        for (field, mutate) in cases {
            let mut params = FundParams::default();
            mutate(&mut params);
            let err = run_monte_carlo(&input(params, 10, 1)).unwrap_err();
            match err {
                FundSimError::InvalidInput { field: f, .. } => assert_eq!(f, field),
                other => panic!("expected InvalidInput for {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_zero_simulations_rejected() {
        let err = run_monte_carlo(&input(FundParams::default(), 0, 1)).unwrap_err();
        assert!(matches!(err, FundSimError::InvalidInput { .. }));
    }

    // --- Per-run invariants ---

    #[test]
    fn test_count_identities() {
        for run in default_runs(200, 11) {
            assert_eq!(
                run.discovery_only_count + run.conviction_count,
                75,
                "cohorts must partition the discovery checks"
            );
            assert!(run.follow_on_count <= run.conviction_count);
        }
    }

    #[test]
    fn test_conviction_cohort_rounds_half_away_from_zero() {
        // 75 * 0.25 = 18.75 -> 19
        let runs = default_runs(5, 3);
        assert_eq!(runs[0].conviction_count, 19);

        // 2 * 0.25 = 0.5 -> 1
        let mut params = FundParams::default();
        params.max_discovery_checks = 2;
        let runs = run_monte_carlo(&input(params, 5, 3)).unwrap().result.runs;
        assert_eq!(runs[0].conviction_count, 1);
    }

    #[test]
    fn test_carry_identity() {
        for run in default_runs(500, 17) {
            let expected = (run.total_dist_gross - run.total_called).max(0.0) * 0.20;
            let tolerance = 1e-9 * expected.max(1.0);
            assert!(
                (run.carry_paid - expected).abs() <= tolerance,
                "carry {} vs {}",
                run.carry_paid,
                expected
            );
            assert!(run.total_dist_gross >= run.total_dist_net);
            assert!(run.total_dist_net >= 0.0);
            assert!(run.total_called >= 0.0);
        }
    }

    #[test]
    fn test_gross_dominates_net_with_equality_iff_no_profit() {
        for run in default_runs(500, 23) {
            if run.total_dist_gross <= run.total_called {
                assert_eq!(run.gross_tvpi, run.net_tvpi);
                assert_eq!(run.carry_paid, 0.0);
            } else {
                assert!(run.carry_paid > 0.0);
                assert!(run.net_tvpi < run.gross_tvpi);
            }
        }
    }

    #[test]
    fn test_dpi_equals_tvpi_without_recycling() {
        for run in default_runs(100, 29) {
            assert_eq!(run.dpi_gross, run.gross_tvpi);
            assert_eq!(run.dpi_net, run.net_tvpi);
        }
    }

    #[test]
    fn test_irr_stays_physical() {
        for run in default_runs(500, 31) {
            assert!(run.irr_net.is_finite());
            assert!((-0.99..=10.0).contains(&run.irr_net), "irr={}", run.irr_net);
        }
    }

    // --- Determinism ---

    #[test]
    fn test_identical_seeds_reproduce_identical_results() {
        let a = run_monte_carlo(&input(FundParams::default(), 1_000, 42)).unwrap();
        let b = run_monte_carlo(&input(FundParams::default(), 1_000, 42)).unwrap();
        assert_eq!(a.result.runs, b.result.runs);
        assert_eq!(
            a.result.net_tvpi.p50.to_bits(),
            b.result.net_tvpi.p50.to_bits()
        );
        assert_eq!(
            a.result.prob_return_fund.to_bits(),
            b.result.prob_return_fund.to_bits()
        );
    }

    #[test]
    fn test_single_run_draws_are_aligned() {
        // A fresh stream must reproduce the driver's first realization
        let params = FundParams::default();
        let out = run_monte_carlo(&input(params.clone(), 1, 7)).unwrap();
        let mut rng = Lcg32::new(7);
        let direct = simulate_once(&params, &mut rng);
        assert_eq!(out.result.runs[0], direct);
    }

    #[test]
    fn test_different_seeds_diverge() {
        let a = default_runs(50, 1);
        let b = default_runs(50, 2);
        assert_ne!(a, b);
    }

    // --- Boundary behaviour ---

    #[test]
    fn test_single_simulation_summary_collapses() {
        let out = run_monte_carlo(&input(FundParams::default(), 1, 5)).unwrap();
        let s = &out.result.net_tvpi;
        let v = out.result.runs[0].net_tvpi;
        assert_eq!(s.mean, v);
        assert_eq!(s.p10, v);
        assert_eq!(s.p50, v);
        assert_eq!(s.p90, v);
        assert_eq!(s.min, v);
        assert_eq!(s.max, v);
    }

    #[test]
    fn test_zero_carry_makes_net_equal_gross() {
        let mut params = FundParams::default();
        params.carry = 0.0;
        let runs = run_monte_carlo(&input(params, 500, 7)).unwrap().result.runs;
        for run in runs {
            assert_eq!(run.net_tvpi, run.gross_tvpi);
            assert_eq!(run.carry_paid, 0.0);
        }
    }

    #[test]
    fn test_zero_reserve_means_no_follow_on() {
        let mut params = FundParams::default();
        params.follow_on_reserve_percent = 0.0;
        let runs = run_monte_carlo(&input(params, 200, 13)).unwrap().result.runs;

        // Without year-2/3 reserve outflows, called capital is exactly the
        // year-1 checks: 75 x 100k + 19 x 400k
        let expected_called = 75.0 * 100_000.0 + 19.0 * 400_000.0;
        for run in runs {
            assert_eq!(run.follow_on_count, 0);
            assert!(
                (run.total_called - expected_called).abs() < 1e-6,
                "called={}",
                run.total_called
            );
        }
    }

    #[test]
    fn test_scaling_leaves_multiples_unchanged() {
        let base = run_monte_carlo(&input(FundParams::default(), 200, 99)).unwrap();

        let mut scaled_params = FundParams::default();
        scaled_params.fund_size *= 10.0;
        scaled_params.discovery_check_size *= 10.0;
        scaled_params.conviction_check_size *= 10.0;
        scaled_params.conviction_check_min *= 10.0;
        scaled_params.conviction_check_max *= 10.0;
        let scaled = run_monte_carlo(&input(scaled_params, 200, 99)).unwrap();

        for (b, s) in base.result.runs.iter().zip(&scaled.result.runs) {
            assert!((b.gross_tvpi - s.gross_tvpi).abs() < 1e-9);
            assert!((b.net_tvpi - s.net_tvpi).abs() < 1e-9);
            assert!((b.irr_net - s.irr_net).abs() < 1e-6);
            let called_ratio = s.total_called / b.total_called;
            assert!((called_ratio - 10.0).abs() < 1e-9, "ratio={called_ratio}");
            let dist_ratio = if b.total_dist_gross > 0.0 {
                s.total_dist_gross / b.total_dist_gross
            } else {
                10.0
            };
            assert!((dist_ratio - 10.0).abs() < 1e-9, "ratio={dist_ratio}");
        }
    }

    // --- Aggregation ---

    #[test]
    fn test_percentiles_are_monotone() {
        let out = run_monte_carlo(&input(FundParams::default(), 1_000, 42)).unwrap();
        for s in [
            &out.result.gross_tvpi,
            &out.result.net_tvpi,
            &out.result.dpi_net,
            &out.result.irr_net,
        ] {
            assert!(s.min <= s.p10);
            assert!(s.p10 <= s.p25);
            assert!(s.p25 <= s.p50);
            assert!(s.p50 <= s.p75);
            assert!(s.p75 <= s.p90);
            assert!(s.p90 <= s.max);
        }
    }

    #[test]
    fn test_threshold_probabilities_are_monotone() {
        let out = run_monte_carlo(&input(FundParams::default(), 1_000, 42)).unwrap();
        let r = &out.result;
        assert!(r.prob_return_fund >= r.prob_2x);
        assert!(r.prob_2x >= r.prob_3x);
        assert!((0.0..=1.0).contains(&r.prob_return_fund));
    }

    #[test]
    fn test_percentile_interpolates_between_order_statistics() {
        // P25 over [0, 10, 20, 30] sits at rank 0.75: 7.5
        let sorted = [0.0, 10.0, 20.0, 30.0];
        assert_eq!(percentile_sorted(&sorted, 25.0), 7.5);
        assert_eq!(percentile_sorted(&sorted, 50.0), 15.0);
        assert_eq!(percentile_sorted(&sorted, 100.0), 30.0);
        assert_eq!(percentile_sorted(&sorted, 0.0), 0.0);
    }

    #[test]
    fn test_summary_of_known_values() {
        let s = summarize(vec![3.0, 1.0, 2.0]);
        assert_eq!(s.mean, 2.0);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 3.0);
        assert_eq!(s.p50, 2.0);
    }

    // --- Envelope and diagnostics ---

    #[test]
    fn test_results_echo_inputs() {
        let out = run_monte_carlo(&input(FundParams::default(), 250, 8)).unwrap();
        assert_eq!(out.result.num_simulations, 250);
        assert_eq!(out.result.runs.len(), 250);
        assert_eq!(out.result.params.fund_size, 25_000_000.0);
        assert_eq!(out.metadata.precision, "ieee754_f64");
    }

    #[test]
    fn test_default_fund_has_no_overshoot_warning() {
        // 75 x 100k + 19 x 400k = 15.1M against 15.9M deployable
        let out = run_monte_carlo(&input(FundParams::default(), 10, 1)).unwrap();
        assert!(out.warnings.is_empty(), "warnings={:?}", out.warnings);
    }

    #[test]
    fn test_overspent_fund_warns_but_still_runs() {
        let mut params = FundParams::default();
        params.discovery_check_size = 1_000_000.0;
        let out = run_monte_carlo(&input(params, 10, 1)).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("deployable")));
        assert_eq!(out.result.runs.len(), 10);
        // Faithfully over-called: the checks were not scaled down
        assert!(out.result.runs[0].total_called > 25_000_000.0);
    }

    #[test]
    fn test_unseeded_input_still_runs() {
        let unseeded = MonteCarloInput {
            params: FundParams::default(),
            num_simulations: 10,
            seed: None,
        };
        let out = run_monte_carlo(&unseeded).unwrap();
        assert_eq!(out.result.runs.len(), 10);
    }

    #[test]
    fn test_median_sits_in_plausible_band() {
        // Not a calibration pin, just a sanity rail for the default fund
        let out = run_monte_carlo(&input(FundParams::default(), 2_000, 42)).unwrap();
        let p50 = out.result.net_tvpi.p50;
        assert!(p50 > 0.1 && p50 < 20.0, "p50={p50}");
    }
}
