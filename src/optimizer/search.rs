//! Bounded pattern search over kiln setpoints.

use serde::Serialize;
use tracing::{debug, instrument};

use super::model::{predict, Bounds, Setpoints};
use super::OptimizerError;
use crate::plant::KpiValues;

/// Default minimum clinker quality (%).
pub const DEFAULT_MIN_CLINKER_QUALITY: f64 = 90.0;
/// Default iteration budget.
pub const DEFAULT_MAX_ITERATIONS: u32 = 200;
/// Largest accepted iteration budget.
pub const MAX_ITERATIONS_LIMIT: u32 = 10_000;

/// Initial step as a fraction of each range.
const INITIAL_STEP_FRACTION: f64 = 0.1;
/// Convergence step as a fraction of each range.
const MIN_STEP_FRACTION: f64 = 0.001;

/// Search options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Operating envelope.
    pub bounds: Bounds,
    /// Minimum acceptable clinker quality (%).
    pub min_clinker_quality: f64,
    /// Maximum number of sweeps.
    pub max_iterations: u32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            bounds: Bounds::default(),
            min_clinker_quality: DEFAULT_MIN_CLINKER_QUALITY,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl SearchOptions {
    fn validate(&self) -> Result<(), OptimizerError> {
        if !self.min_clinker_quality.is_finite()
            || !(0.0..=100.0).contains(&self.min_clinker_quality)
        {
            return Err(OptimizerError::InvalidOption(format!(
                "min_clinker_quality must be between 0 and 100, got {}",
                self.min_clinker_quality
            )));
        }
        if self.max_iterations == 0 || self.max_iterations > MAX_ITERATIONS_LIMIT {
            return Err(OptimizerError::InvalidOption(format!(
                "max_iterations must be between 1 and {MAX_ITERATIONS_LIMIT}, got {}",
                self.max_iterations
            )));
        }
        Ok(())
    }
}

/// Setpoints together with their predicted KPIs and objective value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    /// Evaluated setpoints.
    pub setpoints: Setpoints,
    /// Predicted KPIs.
    pub kpis: KpiValues,
    /// Objective value (lower is better).
    pub objective: f64,
}

/// Outcome of an optimization run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OptimizationResult {
    /// Starting point.
    pub baseline: Evaluation,
    /// Best point found.
    pub recommended: Evaluation,
    /// Recommended minus baseline KPIs.
    pub deltas: KpiValues,
    /// Sweeps performed.
    pub iterations: u32,
    /// Whether steps shrank below the convergence threshold.
    pub converged: bool,
}

/// Objective to minimise: energy and CO2 down, substitution up, quality floor enforced.
pub fn objective(kpis: &KpiValues, min_clinker_quality: f64) -> f64 {
    let deficit = (min_clinker_quality - kpis.clinker_quality).max(0.0);
    kpis.spc / 60.0 + kpis.co2 / 12.0 - 0.5 * kpis.tsr / 100.0
        + 10.0 * deficit
        + 100.0 * deficit * deficit
}

fn evaluate(setpoints: Setpoints, min_clinker_quality: f64) -> Evaluation {
    let kpis = predict(&setpoints);
    Evaluation {
        setpoints,
        kpis,
        objective: objective(&kpis, min_clinker_quality),
    }
}

/// Search for setpoints that improve the objective, starting from `start`.
///
/// The recommendation is never worse than the baseline.
#[instrument(skip(options), fields(min_quality = options.min_clinker_quality))]
pub fn optimize(
    start: Setpoints,
    options: &SearchOptions,
) -> Result<OptimizationResult, OptimizerError> {
    options.validate()?;
    options.bounds.check(&start)?;

    let ranges = options.bounds.to_array();
    let q_min = options.min_clinker_quality;

    let baseline = evaluate(start, q_min);
    let mut best = baseline;
    let mut steps = ranges.map(|r| r.span() * INITIAL_STEP_FRACTION);
    let min_steps = ranges.map(|r| r.span() * MIN_STEP_FRACTION);

    let mut iterations = 0;
    let mut converged = false;

    while iterations < options.max_iterations {
        iterations += 1;
        let mut improved = false;

        for dim in 0..Setpoints::DIMENSIONS {
            for direction in [1.0, -1.0] {
                let mut candidate = best.setpoints.to_array();
                candidate[dim] = ranges[dim].clamp(candidate[dim] + direction * steps[dim]);
                if candidate[dim] == best.setpoints.to_array()[dim] {
                    continue;
                }

                let eval = evaluate(Setpoints::from_array(candidate), q_min);
                if eval.objective < best.objective {
                    best = eval;
                    improved = true;
                    break;
                }
            }
        }

        if !improved {
            for step in steps.iter_mut() {
                *step /= 2.0;
            }
            if steps.iter().zip(min_steps.iter()).all(|(s, m)| s < m) {
                converged = true;
                break;
            }
        }
    }

    debug!(
        iterations,
        converged,
        baseline = baseline.objective,
        recommended = best.objective,
        "Optimization finished"
    );

    Ok(OptimizationResult {
        baseline,
        recommended: best,
        deltas: KpiValues {
            spc: best.kpis.spc - baseline.kpis.spc,
            tsr: best.kpis.tsr - baseline.kpis.tsr,
            clinker_quality: best.kpis.clinker_quality - baseline.kpis.clinker_quality,
            co2: best.kpis.co2 - baseline.kpis.co2,
        },
        iterations,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(start: Setpoints, options: SearchOptions) -> OptimizationResult {
        optimize(start, &options).unwrap()
    }

    #[test]
    fn recommendation_improves_on_defaults() {
        let result = run(Setpoints::default(), SearchOptions::default());
        assert!(result.recommended.objective < result.baseline.objective);
        assert!(result.iterations <= DEFAULT_MAX_ITERATIONS);
        assert!(result.recommended.kpis.co2 < result.baseline.kpis.co2);
    }

    #[test]
    fn recommendation_respects_quality_floor() {
        let options = SearchOptions::default();
        let result = run(Setpoints::default(), options);
        assert!(
            result.recommended.kpis.clinker_quality >= options.min_clinker_quality - 0.05,
            "quality {} below floor",
            result.recommended.kpis.clinker_quality
        );
    }

    #[test]
    fn recommendation_stays_in_bounds() {
        let options = SearchOptions::default();
        let result = run(Setpoints::default(), options);
        assert!(options.bounds.check(&result.recommended.setpoints).is_ok());
    }

    #[test]
    fn recommendation_never_regresses() {
        let options = SearchOptions {
            min_clinker_quality: 99.5,
            max_iterations: 5,
            ..SearchOptions::default()
        };
        let start = Setpoints {
            kiln_feed_tph: 180.0,
            fuel_tph: 24.0,
            alt_fuel_pct: 60.0,
            kiln_speed_rpm: 4.5,
        };
        let result = run(start, options);
        assert!(result.recommended.objective <= result.baseline.objective);
        assert_eq!(result.iterations, 5);
    }

    #[test]
    fn deltas_are_recommended_minus_baseline() {
        let result = run(Setpoints::default(), SearchOptions::default());
        let expected = result.recommended.kpis.co2 - result.baseline.kpis.co2;
        assert!((result.deltas.co2 - expected).abs() < 1e-12);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let bad_quality = SearchOptions {
            min_clinker_quality: 120.0,
            ..SearchOptions::default()
        };
        assert!(matches!(
            optimize(Setpoints::default(), &bad_quality),
            Err(OptimizerError::InvalidOption(_))
        ));

        let no_budget = SearchOptions {
            max_iterations: 0,
            ..SearchOptions::default()
        };
        assert!(optimize(Setpoints::default(), &no_budget).is_err());
    }

    #[test]
    fn objective_penalises_quality_deficit() {
        let ok = KpiValues {
            spc: 60.0,
            tsr: 30.0,
            clinker_quality: 92.0,
            co2: 12.0,
        };
        let poor = KpiValues {
            clinker_quality: 89.0,
            ..ok
        };
        assert!(objective(&poor, 90.0) - objective(&ok, 90.0) >= 10.0);
    }
}
