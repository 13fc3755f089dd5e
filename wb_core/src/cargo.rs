//! # Cargo Items
//!
//! Ad-hoc cargo entries become `cargo` stations so the envelope engine picks
//! them up as zero-fuel weight.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::station::{next_station_id, Station, StationType};

/// A loose cargo entry (pallet, bag, equipment case).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CargoItem {
    pub description: String,
    pub weight: f64,
    pub arm: f64,
}

impl CargoItem {
    pub fn new(description: impl Into<String>, weight: f64, arm: f64) -> Self {
        CargoItem {
            description: description.into(),
            weight,
            arm,
        }
    }

    pub fn moment(&self) -> f64 {
        self.weight * self.arm
    }

    pub fn validate(&self) -> CalcResult<()> {
        if self.description.trim().is_empty() {
            return Err(CalcError::missing_field("description"));
        }
        if !(self.weight > 0.0) {
            return Err(CalcError::invalid_input(
                "weight",
                self.weight.to_string(),
                "Cargo weight must be positive",
            ));
        }
        if !(self.arm > 0.0) {
            return Err(CalcError::invalid_input(
                "arm",
                self.arm.to_string(),
                "Cargo arm must be positive",
            ));
        }
        Ok(())
    }
}

/// Append `item` as a new `cargo` station with the next free id.
pub fn add_cargo_station(stations: &[Station], item: &CargoItem) -> CalcResult<Vec<Station>> {
    item.validate()?;

    let mut updated = stations.to_vec();
    updated.push(
        Station::new(next_station_id(stations), item.description.clone(), item.arm, StationType::Cargo)
            .with_weight(item.weight),
    );
    Ok(updated)
}

/// Drop every `cargo` station whose description is `description`.
pub fn remove_cargo_station(stations: &[Station], description: &str) -> Vec<Station> {
    stations
        .iter()
        .filter(|s| !(s.station_type == StationType::Cargo && s.description == description))
        .cloned()
        .collect()
}

/// Turn every `cargo` station back into an empty `basic` station.
pub fn clear_cargo(stations: &[Station]) -> Vec<Station> {
    stations
        .iter()
        .map(|s| match s.station_type {
            StationType::Cargo => Station {
                station_type: StationType::Basic,
                weight: 0.0,
                ..s.clone()
            },
            _ => s.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::calculate_summaries;

    fn base() -> Vec<Station> {
        vec![
            Station::new(1, "Basic Aircraft", 236.6, StationType::Basic).with_weight(40_000.0),
            Station::new(8, "Cargo", 460.0, StationType::Cargo),
        ]
    }

    #[test]
    fn test_add_cargo_station() {
        let stations = add_cargo_station(&base(), &CargoItem::new("Pallet A", 500.0, 400.0)).unwrap();
        assert_eq!(stations.len(), 3);
        let added = &stations[2];
        assert_eq!(added.id, 9);
        assert_eq!(added.station_type, StationType::Cargo);
        assert_eq!(calculate_summaries(&stations).zfw.weight, 40_500.0);
    }

    #[test]
    fn test_rejects_invalid_cargo() {
        assert!(add_cargo_station(&base(), &CargoItem::new(" ", 500.0, 400.0)).is_err());
        assert!(add_cargo_station(&base(), &CargoItem::new("Bag", 0.0, 400.0)).is_err());
        assert!(add_cargo_station(&base(), &CargoItem::new("Bag", 10.0, -1.0)).is_err());
        assert!(add_cargo_station(&base(), &CargoItem::new("Bag", f64::NAN, 1.0)).is_err());
    }

    #[test]
    fn test_remove_and_clear() {
        let stations = add_cargo_station(&base(), &CargoItem::new("Pallet A", 500.0, 400.0)).unwrap();
        let removed = remove_cargo_station(&stations, "Pallet A");
        assert_eq!(removed, base());

        let cleared = clear_cargo(&stations);
        assert!(cleared.iter().all(|s| s.station_type != StationType::Cargo));
        assert_eq!(cleared[2].weight, 0.0);
        assert_eq!(cleared[0].weight, 40_000.0);
    }

    #[test]
    fn test_moment() {
        assert_eq!(CargoItem::new("Box", 50.0, 100.0).moment(), 5_000.0);
    }
}
