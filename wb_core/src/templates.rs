//! # Aircraft Templates
//!
//! Built-in seed profiles. Arms are in inches and weights in pounds; the
//! %MAC formulas and limits are typical published values, suitable for
//! trying the calculator out, not for dispatch.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::formula::MacConfig;
use crate::profile::AircraftProfile;
use crate::station::{Station, StationType};
use crate::units::UnitSystem;

/// A built-in aircraft configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AircraftTemplate {
    #[serde(rename = "cessna172")]
    Cessna172N,
    #[serde(rename = "piper28")]
    PiperPa28,
    #[serde(rename = "airbus319")]
    AirbusA319,
}

type StationRow = (&'static str, f64, StationType, f64);

const CESSNA_172N: &[StationRow] = &[
    ("Empty Weight", 39.0, StationType::Basic, 1500.0),
    ("Pilot", 37.0, StationType::Basic, 0.0),
    ("Passenger", 37.0, StationType::Basic, 0.0),
    ("Rear Passenger", 73.0, StationType::Basic, 0.0),
    ("Baggage Area 1", 95.0, StationType::Basic, 0.0),
    ("Baggage Area 2", 123.0, StationType::Basic, 0.0),
    ("Fuel", 48.0, StationType::Fuel, 0.0),
    ("Oil", 32.0, StationType::Basic, 0.0),
];

const PIPER_PA28: &[StationRow] = &[
    ("Empty Weight", 88.8, StationType::Basic, 1340.0),
    ("Front Seats", 85.5, StationType::Basic, 0.0),
    ("Rear Seats", 118.1, StationType::Basic, 0.0),
    ("Baggage", 142.8, StationType::Basic, 0.0),
    ("Fuel", 95.0, StationType::Fuel, 0.0),
    ("Oil", 75.0, StationType::Basic, 0.0),
];

const AIRBUS_A319: &[StationRow] = &[
    ("Basic Aircraft", 236.6, StationType::Basic, 0.0),
    ("Crew (2)", 80.7, StationType::Basic, 0.0),
    ("Crew's Baggage", 140.0, StationType::Basic, 0.0),
    ("Steward's Equipment", 140.0, StationType::Basic, 0.0),
    ("Emergency Equipment", 150.0, StationType::Basic, 0.0),
    ("Extra Equipment", 150.0, StationType::Basic, 0.0),
    ("Potable Water", 240.0, StationType::Basic, 0.0),
    ("Cargo", 460.0, StationType::Cargo, 0.0),
    ("Other", 0.0, StationType::Basic, 0.0),
    ("Other", 0.0, StationType::Basic, 0.0),
    ("Fuel Tank InBoard", 246.5, StationType::Fuel, 0.0),
    ("Fuel Tank OutBoard", 246.5, StationType::Fuel, 0.0),
    ("Landing Fuel (Est.)", 246.5, StationType::LandingFuel, 0.0),
];

impl AircraftTemplate {
    pub const ALL: [AircraftTemplate; 3] = [
        AircraftTemplate::Cessna172N,
        AircraftTemplate::PiperPa28,
        AircraftTemplate::AirbusA319,
    ];

    /// Short lookup key ("cessna172", "piper28", "airbus319")
    pub fn key(self) -> &'static str {
        match self {
            AircraftTemplate::Cessna172N => "cessna172",
            AircraftTemplate::PiperPa28 => "piper28",
            AircraftTemplate::AirbusA319 => "airbus319",
        }
    }

    pub fn from_key(key: &str) -> CalcResult<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.key().eq_ignore_ascii_case(key.trim()))
            .ok_or_else(|| CalcError::not_found("Aircraft template", key))
    }

    pub fn name(self) -> &'static str {
        match self {
            AircraftTemplate::Cessna172N => "Cessna 172N",
            AircraftTemplate::PiperPa28 => "Piper PA-28",
            AircraftTemplate::AirbusA319 => "Airbus A319",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            AircraftTemplate::Cessna172N => "Standard Cessna 172N configuration",
            AircraftTemplate::PiperPa28 => "Standard Piper PA-28 Cherokee configuration",
            AircraftTemplate::AirbusA319 => "Standard Airbus A319 configuration",
        }
    }

    pub fn mac_config(self) -> MacConfig {
        match self {
            AircraftTemplate::Cessna172N => MacConfig::new("((CG - 35.0) / 14.9) * 100", 15.0, 38.0),
            AircraftTemplate::PiperPa28 => MacConfig::new("((CG - 86.0) / 13.2) * 100", 17.0, 35.0),
            AircraftTemplate::AirbusA319 => MacConfig::new("20 + ((CG - 232.28) / 86.22) * 100", 16.0, 30.0),
        }
    }

    fn rows(self) -> &'static [StationRow] {
        match self {
            AircraftTemplate::Cessna172N => CESSNA_172N,
            AircraftTemplate::PiperPa28 => PIPER_PA28,
            AircraftTemplate::AirbusA319 => AIRBUS_A319,
        }
    }

    /// Template stations, numbered from 1, in imperial units.
    pub fn stations(self) -> Vec<Station> {
        self.rows()
            .iter()
            .enumerate()
            .map(|(i, &(description, arm, station_type, weight))| {
                Station::new(i as u32 + 1, description, arm, station_type).with_weight(weight)
            })
            .collect()
    }

    /// A fresh profile built from this template.
    pub fn to_profile(self) -> AircraftProfile {
        AircraftProfile::new(self.name(), self.description(), self.mac_config(), self.stations(), UnitSystem::Imperial)
    }
}

/// %MAC configuration used when nothing else is selected (Airbus A319).
pub fn default_mac_config() -> MacConfig {
    AircraftTemplate::AirbusA319.mac_config()
}

/// Station list used when nothing else is selected (Airbus A319).
pub fn default_stations() -> Vec<Station> {
    AircraftTemplate::AirbusA319.stations()
}
