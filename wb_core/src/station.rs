//! # Stations
//!
//! A station is one weight-bearing position on the aircraft: a seat row, a
//! baggage bay, a fuel tank. Its `type` decides which loading configuration
//! (ZFW, TOW, LDW) its weight counts toward.
//!
//! ## JSON Example
//!
//! ```json
//! { "id": 7, "description": "Fuel", "arm": 48.0, "type": "fuel", "weight": 300.0 }
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Default upper bound for a single station weight
pub const DEFAULT_MAX_STATION_WEIGHT: f64 = 20_000.0;

/// Which configuration(s) a station's weight contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationType {
    /// Aircraft, crew, passengers, equipment - part of zero-fuel weight
    #[default]
    Basic,
    /// Usable fuel loaded at takeoff
    Fuel,
    /// Estimated fuel remaining at landing (not loaded weight)
    LandingFuel,
    /// Cargo - part of zero-fuel weight
    Cargo,
}

impl std::fmt::Display for StationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StationType::Basic => write!(f, "basic"),
            StationType::Fuel => write!(f, "fuel"),
            StationType::LandingFuel => write!(f, "landing fuel"),
            StationType::Cargo => write!(f, "cargo"),
        }
    }
}

/// One weight-bearing position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Stable identifier within a profile (not necessarily contiguous)
    pub id: u32,
    pub description: String,
    /// Signed distance from datum, in the profile's length unit
    pub arm: f64,
    #[serde(rename = "type")]
    pub station_type: StationType,
    /// Loaded weight; missing in JSON means empty
    #[serde(default)]
    pub weight: f64,
}

impl Station {
    pub fn new(id: u32, description: impl Into<String>, arm: f64, station_type: StationType) -> Self {
        Station {
            id,
            description: description.into(),
            arm,
            station_type,
            weight: 0.0,
        }
    }

    /// Builder-style weight setter
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Moment about the datum: `weight * arm`
    pub fn moment(&self) -> f64 {
        self.weight * self.arm
    }

    pub fn is_loaded(&self) -> bool {
        self.weight > 0.0
    }
}

/// Check a single weight entry against `[0, max_weight]`.
pub fn validate_weight(weight: f64, max_weight: f64) -> CalcResult<()> {
    if !weight.is_finite() {
        return Err(CalcError::invalid_input("weight", weight.to_string(), "Weight must be a number"));
    }
    if weight < 0.0 {
        return Err(CalcError::invalid_input(
            "weight",
            weight.to_string(),
            "Weight cannot be negative",
        ));
    }
    if weight > max_weight {
        return Err(CalcError::invalid_input(
            "weight",
            weight.to_string(),
            format!("Weight exceeds maximum allowed ({max_weight})"),
        ));
    }
    Ok(())
}

/// Result of [`validate_stations`]; one message per problem found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Check every station for a description, a finite arm and a non-negative
/// weight. Stations are numbered from 1 in the messages, by position.
pub fn validate_stations(stations: &[Station]) -> StationValidation {
    let mut errors = Vec::new();

    for (index, station) in stations.iter().enumerate() {
        let n = index + 1;
        if station.description.trim().is_empty() {
            errors.push(format!("Station {n}: Description is required"));
        }
        if !station.arm.is_finite() {
            errors.push(format!("Station {n}: Valid arm value is required"));
        }
        if station.weight < 0.0 {
            errors.push(format!("Station {n}: Weight cannot be negative"));
        }
    }

    StationValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Next free station id: one past the largest id in use (1 for an empty list).
pub fn next_station_id(stations: &[Station]) -> u32 {
    stations.iter().map(|s| s.id).max().unwrap_or(0) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_json_shape() {
        let json = r#"{ "id": 13, "description": "Landing Fuel (Est.)", "arm": 246.5, "type": "landing_fuel" }"#;
        let station: Station = serde_json::from_str(json).unwrap();
        assert_eq!(station.station_type, StationType::LandingFuel);
        assert_eq!(station.weight, 0.0);

        let out = serde_json::to_string(&station).unwrap();
        assert!(out.contains("\"type\":\"landing_fuel\""));
    }

    #[test]
    fn test_moment() {
        let station = Station::new(1, "Empty Weight", 39.0, StationType::Basic).with_weight(1500.0);
        assert_eq!(station.moment(), 58_500.0);
        assert!(station.is_loaded());
    }

    #[test]
    fn test_validate_weight() {
        assert!(validate_weight(0.0, DEFAULT_MAX_STATION_WEIGHT).is_ok());
        assert!(validate_weight(-1.0, DEFAULT_MAX_STATION_WEIGHT).is_err());
        assert!(validate_weight(f64::NAN, DEFAULT_MAX_STATION_WEIGHT).is_err());
        match validate_weight(25_000.0, DEFAULT_MAX_STATION_WEIGHT) {
            Err(CalcError::InvalidInput { reason, .. }) => assert!(reason.contains("20000")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_validate_stations_collects_all_errors() {
        let stations = vec![
            Station::new(1, "Pilot", 37.0, StationType::Basic),
            Station::new(2, "  ", f64::NAN, StationType::Basic).with_weight(-5.0),
        ];
        let result = validate_stations(&stations);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 3);
        assert!(result.errors.iter().all(|e| e.starts_with("Station 2:")));
    }

    #[test]
    fn test_next_station_id() {
        assert_eq!(next_station_id(&[]), 1);
        let stations = vec![
            Station::new(3, "A", 1.0, StationType::Basic),
            Station::new(9, "B", 1.0, StationType::Cargo),
        ];
        assert_eq!(next_station_id(&stations), 10);
    }
}
