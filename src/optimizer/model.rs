//! Steady-state surrogate model of the kiln line.

use serde::{Deserialize, Serialize};

use super::OptimizerError;
use crate::plant::KpiValues;

/// Raw meal to clinker conversion factor.
pub const FEED_TO_CLINKER: f64 = 1.55;
/// Specific fuel consumption (kg/t clinker) giving the best burnability.
pub const OPTIMAL_SPECIFIC_FUEL: f64 = 125.0;
/// Kiln speed (rpm) giving the best nodulisation.
pub const OPTIMAL_KILN_SPEED: f64 = 3.8;

/// Controllable kiln setpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Setpoints {
    /// Raw meal feed (t/h).
    pub kiln_feed_tph: f64,
    /// Total fuel firing (t/h).
    pub fuel_tph: f64,
    /// Share of alternative fuel in the thermal input (%).
    pub alt_fuel_pct: f64,
    /// Kiln rotation speed (rpm).
    pub kiln_speed_rpm: f64,
}

impl Default for Setpoints {
    fn default() -> Self {
        Self {
            kiln_feed_tph: 220.0,
            fuel_tph: 18.0,
            alt_fuel_pct: 25.0,
            kiln_speed_rpm: 3.6,
        }
    }
}

impl Setpoints {
    /// Number of controllable dimensions.
    pub const DIMENSIONS: usize = 4;

    /// Field names in dimension order.
    pub const NAMES: [&'static str; Self::DIMENSIONS] =
        ["kiln_feed_tph", "fuel_tph", "alt_fuel_pct", "kiln_speed_rpm"];

    /// Setpoints as an array in dimension order.
    pub fn to_array(self) -> [f64; Self::DIMENSIONS] {
        [
            self.kiln_feed_tph,
            self.fuel_tph,
            self.alt_fuel_pct,
            self.kiln_speed_rpm,
        ]
    }

    /// Build setpoints from an array in dimension order.
    pub fn from_array(v: [f64; Self::DIMENSIONS]) -> Self {
        Self {
            kiln_feed_tph: v[0],
            fuel_tph: v[1],
            alt_fuel_pct: v[2],
            kiln_speed_rpm: v[3],
        }
    }
}

/// Inclusive operating range for one setpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl Range {
    /// Create a range.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Width of the range.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Whether `v` lies within the range.
    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }

    /// Clamp `v` into the range.
    pub fn clamp(&self, v: f64) -> f64 {
        v.clamp(self.min, self.max)
    }
}

/// Operating envelope for all setpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Raw meal feed range (t/h).
    pub kiln_feed_tph: Range,
    /// Fuel firing range (t/h).
    pub fuel_tph: Range,
    /// Alternative fuel share range (%).
    pub alt_fuel_pct: Range,
    /// Kiln speed range (rpm).
    pub kiln_speed_rpm: Range,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            kiln_feed_tph: Range::new(180.0, 260.0),
            fuel_tph: Range::new(14.0, 24.0),
            alt_fuel_pct: Range::new(0.0, 60.0),
            kiln_speed_rpm: Range::new(3.0, 4.5),
        }
    }
}

impl Bounds {
    /// Ranges in dimension order.
    pub fn to_array(self) -> [Range; Setpoints::DIMENSIONS] {
        [
            self.kiln_feed_tph,
            self.fuel_tph,
            self.alt_fuel_pct,
            self.kiln_speed_rpm,
        ]
    }

    /// Reject setpoints that are non-finite or outside the envelope.
    pub fn check(&self, setpoints: &Setpoints) -> Result<(), OptimizerError> {
        let values = setpoints.to_array();
        for ((name, value), range) in Setpoints::NAMES.into_iter().zip(values).zip(self.to_array()) {
            if !value.is_finite() {
                return Err(OptimizerError::NonFinite(name));
            }
            if !range.contains(value) {
                return Err(OptimizerError::OutOfBounds {
                    name,
                    value,
                    min: range.min,
                    max: range.max,
                });
            }
        }
        Ok(())
    }
}

/// Clinker output (t/h) for the given feed.
pub fn clinker_tph(setpoints: &Setpoints) -> f64 {
    setpoints.kiln_feed_tph / FEED_TO_CLINKER
}

/// Specific fuel consumption (kg fuel per tonne clinker).
pub fn specific_fuel(setpoints: &Setpoints) -> f64 {
    setpoints.fuel_tph * 1000.0 / clinker_tph(setpoints)
}

/// Predict steady-state KPIs for a set of setpoints.
pub fn predict(setpoints: &Setpoints) -> KpiValues {
    let clinker = clinker_tph(setpoints);
    let q = specific_fuel(setpoints);
    let alt = setpoints.alt_fuel_pct;
    let speed = setpoints.kiln_speed_rpm;

    let spc = 30.0 + 3000.0 / clinker + 5.0 * speed + 0.05 * alt;
    let quality = 96.0
        - 0.004 * (q - OPTIMAL_SPECIFIC_FUEL).powi(2)
        - 4.0 * (speed - OPTIMAL_KILN_SPEED).powi(2)
        - 0.04 * alt;
    let co2 = 8.0 + 0.04 * q * (1.0 - 0.5 * alt / 100.0);

    KpiValues {
        spc,
        tsr: alt,
        clinker_quality: quality.clamp(0.0, 100.0),
        co2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_setpoints_are_inside_default_bounds() {
        assert!(Bounds::default().check(&Setpoints::default()).is_ok());
    }

    #[test]
    fn check_reports_offending_setpoint() {
        let setpoints = Setpoints {
            fuel_tph: 30.0,
            ..Setpoints::default()
        };
        match Bounds::default().check(&setpoints) {
            Err(OptimizerError::OutOfBounds { name, .. }) => assert_eq!(name, "fuel_tph"),
            other => panic!("expected out of bounds, got {other:?}"),
        }
    }

    #[test]
    fn check_rejects_nan() {
        let setpoints = Setpoints {
            kiln_speed_rpm: f64::NAN,
            ..Setpoints::default()
        };
        assert!(matches!(
            Bounds::default().check(&setpoints),
            Err(OptimizerError::NonFinite("kiln_speed_rpm"))
        ));
    }

    #[test]
    fn prediction_at_defaults_is_plausible() {
        let kpis = predict(&Setpoints::default());
        assert!((50.0..80.0).contains(&kpis.spc), "spc {}", kpis.spc);
        assert_eq!(kpis.tsr, 25.0);
        assert!((85.0..96.0).contains(&kpis.clinker_quality), "quality {}", kpis.clinker_quality);
        assert!((10.0..15.0).contains(&kpis.co2), "co2 {}", kpis.co2);
    }

    #[test]
    fn more_alternative_fuel_lowers_co2() {
        let base = Setpoints::default();
        let greener = Setpoints {
            alt_fuel_pct: 50.0,
            ..base
        };
        assert!(predict(&greener).co2 < predict(&base).co2);
    }

    #[test]
    fn array_round_trip_preserves_order() {
        let s = Setpoints::default();
        assert_eq!(Setpoints::from_array(s.to_array()), s);
    }
}
