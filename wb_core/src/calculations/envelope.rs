//! # Envelope Calculation
//!
//! Aggregates station weights into the three standard loading
//! configurations and derives CG and %MAC for each.
//!
//! ## Aggregation Rules
//!
//! | Station type   | ZFW | TOW | LDW | Totals |
//! |----------------|-----|-----|-----|--------|
//! | `basic`/`cargo`| yes | yes | yes | yes    |
//! | `fuel`         |     | yes |     | yes    |
//! | `landing_fuel` |     |     | yes (last one wins) | |
//!
//! ## Units
//!
//! Moments are `weight * arm` in the profile's own units, so CG comes out in
//! inches for imperial profiles and meters for metric ones. %MAC formulas
//! are always written against inches, so metric CGs are converted before
//! the formula sees them.
//!
//! ## Example
//!
//! ```rust
//! use wb_core::calculations::envelope::calculate_envelope_data;
//! use wb_core::formula::MacConfig;
//! use wb_core::station::{Station, StationType};
//! use wb_core::units::UnitSystem;
//!
//! let stations = vec![
//!     Station::new(1, "Empty Weight", 39.0, StationType::Basic).with_weight(1500.0),
//!     Station::new(7, "Fuel", 48.0, StationType::Fuel).with_weight(300.0),
//! ];
//! let config = MacConfig::new("((CG - 35.0) / 14.9) * 100", 15.0, 38.0);
//!
//! let envelope = calculate_envelope_data(&stations, &config, UnitSystem::Imperial);
//! assert_eq!(envelope.tow.weight, 1800.0);
//! assert!((envelope.tow.cg - 40.5).abs() < 1e-9);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::formula::{FormulaError, MacConfig, MacFormula};
use crate::station::{Station, StationType};
use crate::units::{Inches, Meters, UnitSystem};

/// One of the three evaluated loading configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Configuration {
    /// Zero-fuel weight
    Zfw,
    /// Takeoff weight
    Tow,
    /// Landing weight
    Ldw,
}

impl Configuration {
    pub const ALL: [Configuration; 3] = [Configuration::Zfw, Configuration::Tow, Configuration::Ldw];

    pub fn label(self) -> &'static str {
        match self {
            Configuration::Zfw => "ZFW",
            Configuration::Tow => "TOW",
            Configuration::Ldw => "LDW",
        }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Aggregate weight and moment for one configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WeightMoment {
    pub weight: f64,
    pub moment: f64,
}

impl WeightMoment {
    fn add(&mut self, station: &Station) {
        self.weight += station.weight;
        self.moment += station.moment();
    }

    fn combined(self, other: WeightMoment) -> WeightMoment {
        WeightMoment {
            weight: self.weight + other.weight,
            moment: self.moment + other.moment,
        }
    }
}

/// Loaded totals across all stations except landing-fuel estimates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Totals {
    pub weight: f64,
    pub moment: f64,
    /// Sum of the arms of every station carrying weight.
    ///
    /// Not a CG. Kept with its historical definition because reports print
    /// it as "total arm".
    pub arm: f64,
}

/// Output of [`calculate_summaries`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Summaries {
    pub zfw: WeightMoment,
    pub tow: WeightMoment,
    pub ldw: WeightMoment,
    pub totals: Totals,
}

impl Summaries {
    pub fn get(&self, configuration: Configuration) -> WeightMoment {
        match configuration {
            Configuration::Zfw => self.zfw,
            Configuration::Tow => self.tow,
            Configuration::Ldw => self.ldw,
        }
    }
}

/// Aggregate station weights and moments into ZFW, TOW and LDW.
///
/// A `landing_fuel` station replaces, rather than adds to, the landing fuel
/// figure: with several, the last one in `stations` wins.
pub fn calculate_summaries(stations: &[Station]) -> Summaries {
    let mut zero_fuel = WeightMoment::default();
    let mut fuel = WeightMoment::default();
    let mut landing_fuel = WeightMoment::default();
    let mut totals = Totals::default();

    for station in stations {
        if station.station_type != StationType::LandingFuel {
            totals.weight += station.weight;
            totals.moment += station.moment();
        }
        if station.weight > 0.0 {
            totals.arm += station.arm;
        }

        match station.station_type {
            StationType::Fuel => fuel.add(station),
            StationType::LandingFuel => {
                landing_fuel = WeightMoment {
                    weight: station.weight,
                    moment: station.moment(),
                }
            }
            StationType::Basic | StationType::Cargo => zero_fuel.add(station),
        }
    }

    Summaries {
        zfw: zero_fuel,
        tow: zero_fuel.combined(fuel),
        ldw: zero_fuel.combined(landing_fuel),
        totals,
    }
}

/// CG, weight and %MAC of one configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnvelopePoint {
    pub cg: f64,
    pub weight: f64,
    pub mac: f64,
}

/// Envelope points for all three configurations.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnvelopeData {
    pub zfw: EnvelopePoint,
    pub tow: EnvelopePoint,
    pub ldw: EnvelopePoint,
}

impl EnvelopeData {
    pub fn get(&self, configuration: Configuration) -> &EnvelopePoint {
        match configuration {
            Configuration::Zfw => &self.zfw,
            Configuration::Tow => &self.tow,
            Configuration::Ldw => &self.ldw,
        }
    }

    /// Points in ZFW, TOW, LDW order
    pub fn points(&self) -> impl Iterator<Item = (Configuration, &EnvelopePoint)> + '_ {
        Configuration::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

/// Convert a CG in the profile's length unit to the inches a formula expects.
fn cg_in_inches(cg: f64, unit: UnitSystem) -> f64 {
    match unit {
        UnitSystem::Imperial => cg,
        UnitSystem::Metric => Inches::from(Meters(cg)).0,
    }
}

/// %MAC for a CG, propagating formula failures.
pub fn try_calculate_mac_percentage(cg: f64, mac_config: &MacConfig, unit: UnitSystem) -> Result<f64, FormulaError> {
    MacFormula::parse(&mac_config.formula)?.eval(cg_in_inches(cg, unit))
}

/// %MAC for a CG; a failing formula is logged and yields 0.
pub fn calculate_mac_percentage(cg: f64, mac_config: &MacConfig, unit: UnitSystem) -> f64 {
    try_calculate_mac_percentage(cg, mac_config, unit).unwrap_or_else(|err| {
        tracing::warn!(cg, error = %err, "MAC formula failed, reporting 0 %MAC");
        0.0
    })
}

fn envelope_point(
    summary: WeightMoment,
    formula: &Result<MacFormula, FormulaError>,
    unit: UnitSystem,
) -> Result<EnvelopePoint, FormulaError> {
    if summary.weight <= 0.0 {
        return Ok(EnvelopePoint {
            cg: 0.0,
            weight: summary.weight,
            mac: 0.0,
        });
    }

    let cg = summary.moment / summary.weight;
    let mac = formula.as_ref().map_err(Clone::clone)?.eval(cg_in_inches(cg, unit))?;
    Ok(EnvelopePoint {
        cg,
        weight: summary.weight,
        mac,
    })
}

/// Compute the envelope, failing on the first configuration whose %MAC
/// cannot be evaluated.
pub fn try_calculate_envelope_data(
    stations: &[Station],
    mac_config: &MacConfig,
    unit: UnitSystem,
) -> Result<EnvelopeData, FormulaError> {
    let summaries = calculate_summaries(stations);
    let formula = MacFormula::parse(&mac_config.formula);

    Ok(EnvelopeData {
        zfw: envelope_point(summaries.zfw, &formula, unit)?,
        tow: envelope_point(summaries.tow, &formula, unit)?,
        ldw: envelope_point(summaries.ldw, &formula, unit)?,
    })
}

/// Compute the envelope for a set of stations.
///
/// Never fails: an empty configuration gets `cg = 0, mac = 0`, and a
/// configuration whose %MAC formula fails keeps its CG and weight with
/// `mac = 0` (the failure is logged).
pub fn calculate_envelope_data(stations: &[Station], mac_config: &MacConfig, unit: UnitSystem) -> EnvelopeData {
    let summaries = calculate_summaries(stations);
    let formula = MacFormula::parse(&mac_config.formula);

    let point = |configuration: Configuration| {
        let summary = summaries.get(configuration);
        envelope_point(summary, &formula, unit).unwrap_or_else(|err| {
            tracing::warn!(
                configuration = configuration.label(),
                error = %err,
                "MAC formula failed, reporting 0 %MAC"
            );
            EnvelopePoint {
                cg: summary.moment / summary.weight,
                weight: summary.weight,
                mac: 0.0,
            }
        })
    };

    EnvelopeData {
        zfw: point(Configuration::Zfw),
        tow: point(Configuration::Tow),
        ldw: point(Configuration::Ldw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CESSNA: &str = "((CG - 35.0) / 14.9) * 100";

    fn cessna_loaded() -> Vec<Station> {
        vec![
            Station::new(1, "Empty Weight", 39.0, StationType::Basic).with_weight(1500.0),
            Station::new(2, "Pilot", 37.0, StationType::Basic),
            Station::new(7, "Fuel", 48.0, StationType::Fuel).with_weight(300.0),
            Station::new(8, "Oil", 32.0, StationType::Basic),
        ]
    }

    #[test]
    fn test_cessna_summaries() {
        let s = calculate_summaries(&cessna_loaded());
        assert_eq!(s.zfw, WeightMoment { weight: 1500.0, moment: 58_500.0 });
        assert_eq!(s.tow, WeightMoment { weight: 1800.0, moment: 72_900.0 });
        assert_eq!(s.ldw, s.zfw);
        assert_eq!(s.totals.weight, 1800.0);
        assert_eq!(s.totals.moment, 72_900.0);
        // 39 + 48, the two loaded stations
        assert_eq!(s.totals.arm, 87.0);
    }

    #[test]
    fn test_cessna_envelope() {
        let config = MacConfig::new(CESSNA, 15.0, 38.0);
        let env = calculate_envelope_data(&cessna_loaded(), &config, UnitSystem::Imperial);

        assert!((env.zfw.cg - 39.0).abs() < 1e-9);
        assert!((env.zfw.mac - 26.845).abs() < 0.01);
        assert!((env.tow.cg - 40.5).abs() < 1e-9);
        assert!((env.tow.mac - 36.913).abs() < 0.01);
    }

    #[test]
    fn test_landing_fuel_last_wins_and_excluded_from_totals() {
        let stations = vec![
            Station::new(1, "Basic", 100.0, StationType::Basic).with_weight(1000.0),
            Station::new(2, "Landing A", 200.0, StationType::LandingFuel).with_weight(50.0),
            Station::new(3, "Landing B", 300.0, StationType::LandingFuel).with_weight(20.0),
        ];
        let s = calculate_summaries(&stations);
        assert_eq!(s.ldw, WeightMoment { weight: 1020.0, moment: 106_000.0 });
        assert_eq!(s.tow, s.zfw);
        assert_eq!(s.totals.weight, 1000.0);
        assert_eq!(s.totals.arm, 600.0);
    }

    #[test]
    fn test_cargo_counts_as_zero_fuel() {
        let stations = vec![Station::new(1, "Hold", 460.0, StationType::Cargo).with_weight(10.0)];
        let s = calculate_summaries(&stations);
        assert_eq!(s.zfw.weight, 10.0);
        assert_eq!(s.tow.weight, 10.0);
    }

    #[test]
    fn test_zero_weight_gives_zero_point() {
        let stations = vec![Station::new(1, "Pilot", 37.0, StationType::Basic)];
        let config = MacConfig::new(CESSNA, 15.0, 38.0);
        let env = calculate_envelope_data(&stations, &config, UnitSystem::Imperial);
        for (_, point) in env.points() {
            assert_eq!(*point, EnvelopePoint { cg: 0.0, weight: 0.0, mac: 0.0 });
        }
    }

    #[test]
    fn test_metric_cg_converted_before_formula() {
        // 39 in = 0.9906 m
        let stations = vec![Station::new(1, "Empty", 0.9906, StationType::Basic).with_weight(680.0)];
        let config = MacConfig::new(CESSNA, 15.0, 38.0);
        let env = calculate_envelope_data(&stations, &config, UnitSystem::Metric);
        assert!((env.zfw.cg - 0.9906).abs() < 1e-12);
        assert!((env.zfw.mac - 26.845).abs() < 0.01);
    }

    #[test]
    fn test_broken_formula_degrades_to_zero_mac() {
        let config = MacConfig::new("CG * foo", 15.0, 38.0);
        let env = calculate_envelope_data(&cessna_loaded(), &config, UnitSystem::Imperial);
        assert_eq!(env.zfw.mac, 0.0);
        assert!((env.zfw.cg - 39.0).abs() < 1e-9);

        assert!(try_calculate_envelope_data(&cessna_loaded(), &config, UnitSystem::Imperial).is_err());
        assert_eq!(calculate_mac_percentage(40.0, &config, UnitSystem::Imperial), 0.0);
    }

    #[test]
    fn test_division_by_zero_degrades_to_zero_mac() {
        // ZFW CG is exactly 39, so the denominator vanishes there only
        let config = MacConfig::new("100 / (CG - 39)", 15.0, 38.0);
        let env = calculate_envelope_data(&cessna_loaded(), &config, UnitSystem::Imperial);

        assert_eq!(env.zfw.mac, 0.0);
        assert!((env.zfw.cg - 39.0).abs() < 1e-9);
        assert_eq!(env.zfw.weight, 1500.0);
        // 100 / 1.5
        assert!((env.tow.mac - 66.667).abs() < 0.001);

        let err = try_calculate_envelope_data(&cessna_loaded(), &config, UnitSystem::Imperial).unwrap_err();
        assert!(matches!(err, FormulaError::NonFinite { .. }));
    }

    #[test]
    fn test_deterministic() {
        let config = MacConfig::new(CESSNA, 15.0, 38.0);
        let a = calculate_envelope_data(&cessna_loaded(), &config, UnitSystem::Imperial);
        let b = calculate_envelope_data(&cessna_loaded(), &config, UnitSystem::Imperial);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
