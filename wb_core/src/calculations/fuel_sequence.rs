//! # Fuel Burn Sequencing
//!
//! Simulates fuel burn over a flight in 15-minute steps and tracks how the
//! takeoff-configuration CG and %MAC move as tanks empty.
//!
//! ## Model
//!
//! - Tanks drain strictly in ascending `priority` (1 first); a tank is
//!   emptied before the next one is touched.
//! - The step at `t = 0` is the loaded state. Each later step burns
//!   `min(remaining_to_burn, burn_rate * 0.25)`.
//! - When `flight_time_hours` is not a multiple of 0.25 the last step lands
//!   exactly on `flight_time_hours` and burns the remainder.
//! - The run stops once the requested burn is done or every tank is dry.
//!   Fuel that was requested but not available is reported as
//!   [`FuelSequence::unburned_fuel`].
//!
//! ## Example
//!
//! ```rust
//! use wb_core::calculations::fuel_sequence::{fuel_tanks_from_stations, simulate_fuel_sequence};
//! use wb_core::formula::MacConfig;
//! use wb_core::station::{Station, StationType};
//! use wb_core::units::UnitSystem;
//!
//! let stations = vec![
//!     Station::new(1, "Empty Weight", 39.0, StationType::Basic).with_weight(1500.0),
//!     Station::new(7, "Fuel", 48.0, StationType::Fuel).with_weight(100.0),
//! ];
//! let tanks = fuel_tanks_from_stations(&stations);
//! let config = MacConfig::new("((CG - 35.0) / 14.9) * 100", 15.0, 38.0);
//!
//! let seq = simulate_fuel_sequence(&stations, &tanks, 1.0, 100.0, &config, UnitSystem::Imperial).unwrap();
//! assert_eq!(seq.steps.len(), 5);
//! assert_eq!(seq.steps[4].tanks[&7], 0.0);
//! assert!(!seq.has_shortfall());
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::envelope::calculate_envelope_data;
use crate::errors::{CalcError, CalcResult};
use crate::formula::MacConfig;
use crate::station::{Station, StationType};
use crate::units::UnitSystem;

/// Simulation step length (15 minutes)
pub const TIME_STEP_HOURS: f64 = 0.25;

/// Amounts below this are treated as zero
const FUEL_EPSILON: f64 = 1e-9;

/// A fuel station taking part in the burn sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelTank {
    pub station_id: u32,
    pub name: String,
    /// Fuel in the tank at t = 0
    pub total_fuel: f64,
    /// Burn order, 1 = first
    pub priority: u32,
}

/// One tank per `fuel` station, in station order, with priorities 1, 2, 3...
pub fn fuel_tanks_from_stations(stations: &[Station]) -> Vec<FuelTank> {
    stations
        .iter()
        .filter(|s| s.station_type == StationType::Fuel)
        .enumerate()
        .map(|(index, s)| FuelTank {
            station_id: s.id,
            name: s.description.clone(),
            total_fuel: s.weight,
            priority: index as u32 + 1,
        })
        .collect()
}

/// State of the aircraft at one point of the simulated flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelStep {
    /// Hours since takeoff
    pub time: f64,
    /// Remaining fuel per tank, keyed by station id
    pub tanks: BTreeMap<u32, f64>,
    /// Takeoff-configuration weight
    pub total_weight: f64,
    /// Takeoff-configuration CG
    pub cg: f64,
    /// Takeoff-configuration %MAC
    pub mac: f64,
}

/// Result of [`simulate_fuel_sequence`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelSequence {
    pub steps: Vec<FuelStep>,
    /// `flight_time_hours * burn_rate_per_hour`
    pub requested_burn: f64,
    /// Part of `requested_burn` the tanks could not supply
    pub unburned_fuel: f64,
}

impl FuelSequence {
    /// True when the tanks ran dry before the requested burn was complete.
    pub fn has_shortfall(&self) -> bool {
        self.unburned_fuel > FUEL_EPSILON
    }

    pub fn final_step(&self) -> Option<&FuelStep> {
        self.steps.last()
    }
}

fn check_non_negative(field: &str, value: f64) -> CalcResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(CalcError::invalid_input(
            field,
            value.to_string(),
            "Must be a finite, non-negative number",
        ));
    }
    Ok(())
}

/// Simulate burning fuel from `fuel_tanks` over `flight_time_hours`.
///
/// `stations` supplies every non-fuel weight; each station whose id matches
/// a tank gets that tank's remaining fuel at every step. Each call starts
/// again from the tanks' `total_fuel`.
///
/// # Errors
///
/// `CalcError::InvalidInput` when there are no tanks, or when the flight
/// time, burn rate or a tank's fuel is negative or not finite.
pub fn simulate_fuel_sequence(
    stations: &[Station],
    fuel_tanks: &[FuelTank],
    flight_time_hours: f64,
    burn_rate_per_hour: f64,
    mac_config: &MacConfig,
    unit: UnitSystem,
) -> CalcResult<FuelSequence> {
    if fuel_tanks.is_empty() {
        return Err(CalcError::invalid_input("fuel_tanks", "0", "No fuel tanks configured"));
    }
    check_non_negative("flight_time_hours", flight_time_hours)?;
    check_non_negative("burn_rate_per_hour", burn_rate_per_hour)?;
    for tank in fuel_tanks {
        check_non_negative(&format!("fuel_tanks[{}].total_fuel", tank.station_id), tank.total_fuel)?;
    }

    let mut order: Vec<&FuelTank> = fuel_tanks.iter().collect();
    order.sort_by_key(|t| t.priority);
    let mut remaining: Vec<f64> = order.iter().map(|t| t.total_fuel).collect();
    let initial_fuel: f64 = remaining.iter().sum();

    let requested_burn = flight_time_hours * burn_rate_per_hour;
    if !requested_burn.is_finite() {
        return Err(CalcError::invalid_input(
            "burn_rate_per_hour",
            burn_rate_per_hour.to_string(),
            "Flight time times burn rate is too large",
        ));
    }
    let mut remaining_to_burn = requested_burn;

    tracing::debug!(
        tanks = order.len(),
        flight_time_hours,
        burn_rate_per_hour,
        requested_burn,
        "simulating fuel sequence"
    );

    let mut steps = Vec::new();
    let mut index: u64 = 0;
    loop {
        // Last step is clamped onto flight_time_hours
        let time = (index as f64 * TIME_STEP_HOURS).min(flight_time_hours);
        if index > 0 {
            let burn = remaining_to_burn.min(burn_rate_per_hour * TIME_STEP_HOURS);
            let mut to_burn = burn;
            for fuel in remaining.iter_mut() {
                if to_burn <= 0.0 {
                    break;
                }
                let taken = fuel.min(to_burn);
                *fuel -= taken;
                to_burn -= taken;
            }
            remaining_to_burn -= burn;
        }

        let snapshot: Vec<Station> = stations
            .iter()
            .map(|station| match order.iter().position(|t| t.station_id == station.id) {
                Some(k) => station.clone().with_weight(remaining[k]),
                None => station.clone(),
            })
            .collect();
        let envelope = calculate_envelope_data(&snapshot, mac_config, unit);

        steps.push(FuelStep {
            time,
            tanks: order
                .iter()
                .zip(&remaining)
                .map(|(t, fuel)| (t.station_id, *fuel))
                .collect(),
            total_weight: envelope.tow.weight,
            cg: envelope.tow.cg,
            mac: envelope.tow.mac,
        });

        let tanks_dry = remaining.iter().all(|f| *f <= FUEL_EPSILON);
        let at_end = time >= flight_time_hours - FUEL_EPSILON;
        if remaining_to_burn <= FUEL_EPSILON || tanks_dry || at_end {
            break;
        }
        index += 1;
    }

    let burned = initial_fuel - remaining.iter().sum::<f64>();
    let mut unburned_fuel = (requested_burn - burned).max(0.0);
    if unburned_fuel <= FUEL_EPSILON {
        unburned_fuel = 0.0;
    }
    if unburned_fuel > 0.0 {
        tracing::warn!(
            requested_burn,
            unburned_fuel,
            "fuel tanks ran dry before the requested burn was complete"
        );
    }

    Ok(FuelSequence {
        steps,
        requested_burn,
        unburned_fuel,
    })
}

/// Load a step's remaining tank fuel back into the matching `fuel` stations.
pub fn apply_fuel_step(stations: &[Station], step: &FuelStep) -> Vec<Station> {
    stations
        .iter()
        .map(|station| match step.tanks.get(&station.id) {
            Some(fuel) if station.station_type == StationType::Fuel => station.clone().with_weight(*fuel),
            _ => station.clone(),
        })
        .collect()
}

/// Restore every tank station to the tank's `total_fuel`.
pub fn reset_fuel_to_full(stations: &[Station], fuel_tanks: &[FuelTank]) -> Vec<Station> {
    stations
        .iter()
        .map(|station| match fuel_tanks.iter().find(|t| t.station_id == station.id) {
            Some(tank) => station.clone().with_weight(tank.total_fuel),
            None => station.clone(),
        })
        .collect()
}
