//! # Weight & Balance Calculations
//!
//! The calculation pipeline is a chain of pure functions:
//!
//! ```text
//! stations ──> calculate_summaries ──> calculate_envelope_data ──> validate_limits
//!                                                ^
//!                      simulate_fuel_sequence ───┘ (once per time step)
//! ```
//!
//! Nothing here holds state. A profile's stations and %MAC configuration are
//! passed in on every call, and identical inputs give identical outputs.
//!
//! ## Available Calculations
//!
//! - [`envelope`] - ZFW/TOW/LDW aggregation, CG and %MAC
//! - [`limits`] - %MAC limit checks
//! - [`fuel_sequence`] - Time-stepped fuel burn and CG travel

pub mod envelope;
pub mod fuel_sequence;
pub mod limits;

use serde::{Deserialize, Serialize};

use crate::formula::MacConfig;
use crate::station::Station;
use crate::units::UnitSystem;

// Re-export commonly used types
pub use envelope::{
    calculate_envelope_data, calculate_mac_percentage, calculate_summaries, Configuration, EnvelopeData,
    EnvelopePoint, Summaries, Totals, WeightMoment,
};
pub use fuel_sequence::{fuel_tanks_from_stations, simulate_fuel_sequence, FuelSequence, FuelStep, FuelTank};
pub use limits::{validate_limits, LimitValidation};

/// Summaries, envelope and limit check for one set of stations.
///
/// ## Example
///
/// ```rust
/// use wb_core::calculations::WeightBalanceReport;
/// use wb_core::templates::AircraftTemplate;
/// use wb_core::units::UnitSystem;
///
/// let template = AircraftTemplate::Cessna172N;
/// let report = WeightBalanceReport::compute(&template.stations(), &template.mac_config(), UnitSystem::Imperial);
/// assert_eq!(report.summaries.zfw.weight, 1500.0);
/// assert!(report.validation.zfw);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightBalanceReport {
    pub summaries: Summaries,
    pub envelope_data: EnvelopeData,
    pub validation: LimitValidation,
}

impl WeightBalanceReport {
    pub fn compute(stations: &[Station], mac_config: &MacConfig, unit: UnitSystem) -> Self {
        let summaries = calculate_summaries(stations);
        let envelope_data = calculate_envelope_data(stations, mac_config, unit);
        let validation = validate_limits(&envelope_data, mac_config);

        WeightBalanceReport {
            summaries,
            envelope_data,
            validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::station::StationType;

    #[test]
    fn test_cessna_scenario() {
        let stations = vec![
            Station::new(1, "Empty Weight", 39.0, StationType::Basic).with_weight(1500.0),
            Station::new(2, "Pilot", 37.0, StationType::Basic),
            Station::new(7, "Fuel", 48.0, StationType::Fuel).with_weight(300.0),
        ];
        let config = MacConfig::new("((CG - 35.0) / 14.9) * 100", 15.0, 38.0);
        let report = WeightBalanceReport::compute(&stations, &config, UnitSystem::Imperial);

        assert_eq!(report.summaries.zfw.moment, 58_500.0);
        assert_eq!(report.summaries.tow.moment, 72_900.0);
        assert!((report.envelope_data.zfw.mac - 26.85).abs() < 0.01);
        // (40.5 - 35) / 14.9 * 100 = 36.91, inside [15, 38]
        assert!((report.envelope_data.tow.mac - 36.91).abs() < 0.01);
        assert!(report.validation.zfw);
        assert!(report.validation.tow);
        assert!(report.validation.all_in_limits);

        let tighter = MacConfig::new(config.formula.clone(), 15.0, 36.0);
        let report = WeightBalanceReport::compute(&stations, &tighter, UnitSystem::Imperial);
        assert!(report.validation.zfw);
        assert!(!report.validation.tow);
    }

    #[test]
    fn test_pipeline_is_bit_identical() {
        let stations = vec![
            Station::new(1, "Basic Aircraft", 236.6, StationType::Basic).with_weight(40_123.4),
            Station::new(11, "Fuel Tank InBoard", 246.5, StationType::Fuel).with_weight(5_432.1),
            Station::new(13, "Landing Fuel (Est.)", 246.5, StationType::LandingFuel).with_weight(1_200.0),
        ];
        let config = MacConfig::new("20 + ((CG - 232.28) / 86.22) * 100", 16.0, 30.0);
        let a = WeightBalanceReport::compute(&stations, &config, UnitSystem::Imperial);
        let b = WeightBalanceReport::compute(&stations, &config, UnitSystem::Imperial);
        assert_eq!(a, b);
        assert_eq!(a.envelope_data.tow.mac.to_bits(), b.envelope_data.tow.mac.to_bits());
    }
}
