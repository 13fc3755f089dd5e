//! # Profiles & Saved Calculations
//!
//! An [`AircraftProfile`] bundles a station list, a %MAC configuration and a
//! unit system. A [`Calculation`] is an immutable snapshot of loaded stations
//! plus their formatted summary, kept for record-keeping.
//!
//! Both live in a [`ProfileLibrary`], the root container written to `.wbl`
//! files (see [`crate::file_io`]).
//!
//! ## Structure
//!
//! ```text
//! ProfileLibrary
//! ├── meta: LibraryMetadata (schema version, timestamps)
//! ├── settings: LibrarySettings (default unit, weight cap, fuel defaults)
//! ├── profiles: HashMap<Uuid, AircraftProfile>
//! └── calculations: HashMap<Uuid, Calculation> (weak link to a profile)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use wb_core::profile::ProfileLibrary;
//! use wb_core::templates::AircraftTemplate;
//!
//! let mut library = ProfileLibrary::new();
//! let id = library.add_profile(AircraftTemplate::Cessna172N.to_profile());
//! assert_eq!(library.get_profile(&id).unwrap().name, "Cessna 172N");
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculations::{Configuration, WeightBalanceReport};
use crate::errors::{CalcError, CalcResult};
use crate::formula::MacConfig;
use crate::station::{Station, DEFAULT_MAX_STATION_WEIGHT};
use crate::units::{format_length, format_weight, UnitSystem};

/// Current schema version for .wbl files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Default number of calculations returned by [`ProfileLibrary::calculations_for`]
pub const DEFAULT_CALCULATION_LIMIT: usize = 50;

/// A named aircraft loading profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AircraftProfile {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub mac_config: MacConfig,
    pub stations: Vec<Station>,
    pub unit: UnitSystem,
    pub timestamp: DateTime<Utc>,
    /// Owner; `None` means shared with every user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl AircraftProfile {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        mac_config: MacConfig,
        stations: Vec<Station>,
        unit: UnitSystem,
    ) -> Self {
        AircraftProfile {
            name: name.into(),
            description: description.into(),
            mac_config,
            stations,
            unit,
            timestamp: Utc::now(),
            user_id: None,
        }
    }

    pub fn with_owner(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Run the full calculation pipeline on this profile's current weights.
    pub fn report(&self) -> WeightBalanceReport {
        WeightBalanceReport::compute(&self.stations, &self.mac_config, self.unit)
    }

    fn validate(&self) -> CalcResult<()> {
        if self.name.trim().is_empty() {
            return Err(CalcError::missing_field("name"));
        }
        if self.mac_config.formula.trim().is_empty() {
            return Err(CalcError::missing_field("macConfig.formula"));
        }
        Ok(())
    }
}

/// Formatted weight and CG for one configuration, as stored with a calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryData {
    pub weight: String,
    pub cg: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationSummary {
    pub zfw: SummaryData,
    pub tow: SummaryData,
    pub ldw: SummaryData,
}

/// A saved calculation snapshot. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calculation {
    pub name: String,
    /// Profile this was computed from; not kept in sync with it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aircraft_profile_id: Option<Uuid>,
    /// Loaded stations only
    pub stations: Vec<Station>,
    pub mac_config: MacConfig,
    pub unit: UnitSystem,
    pub summary: CalculationSummary,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Calculation {
    /// Snapshot `stations` with their computed summary.
    pub fn from_report(
        name: impl Into<String>,
        stations: &[Station],
        mac_config: &MacConfig,
        unit: UnitSystem,
        report: &WeightBalanceReport,
    ) -> Self {
        let summary_for = |configuration: Configuration| SummaryData {
            weight: format_weight(report.summaries.get(configuration).weight, unit),
            cg: format_length(report.envelope_data.get(configuration).cg, unit),
        };

        Calculation {
            name: name.into(),
            aircraft_profile_id: None,
            stations: stations.iter().filter(|s| s.is_loaded()).cloned().collect(),
            mac_config: mac_config.clone(),
            unit,
            summary: CalculationSummary {
                zfw: summary_for(Configuration::Zfw),
                tow: summary_for(Configuration::Tow),
                ldw: summary_for(Configuration::Ldw),
            },
            timestamp: Utc::now(),
            user_id: None,
        }
    }

    /// Snapshot a profile's current loading, linked back to `profile_id`.
    pub fn from_profile(name: impl Into<String>, profile_id: Uuid, profile: &AircraftProfile) -> Self {
        let report = profile.report();
        let mut calculation =
            Calculation::from_report(name, &profile.stations, &profile.mac_config, profile.unit, &report);
        calculation.aircraft_profile_id = Some(profile_id);
        calculation.user_id = profile.user_id.clone();
        calculation
    }
}

/// Library-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibrarySettings {
    /// Unit system for new profiles
    pub default_unit: UnitSystem,
    /// Upper bound accepted for a single station weight
    pub max_station_weight: f64,
    /// Fuel sequence defaults
    pub default_flight_time_hours: f64,
    pub default_burn_rate_per_hour: f64,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        LibrarySettings {
            default_unit: UnitSystem::Imperial,
            max_station_weight: DEFAULT_MAX_STATION_WEIGHT,
            default_flight_time_hours: 2.0,
            default_burn_rate_per_hour: 10.0,
        }
    }
}

/// Library metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Record counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryStats {
    pub profiles: usize,
    pub calculations: usize,
}

/// Root container for profiles and saved calculations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileLibrary {
    pub meta: LibraryMetadata,
    #[serde(default)]
    pub settings: LibrarySettings,
    pub profiles: HashMap<Uuid, AircraftProfile>,
    pub calculations: HashMap<Uuid, Calculation>,
}

impl ProfileLibrary {
    pub fn new() -> Self {
        let now = Utc::now();
        ProfileLibrary {
            meta: LibraryMetadata {
                version: SCHEMA_VERSION.to_string(),
                created: now,
                modified: now,
            },
            settings: LibrarySettings::default(),
            profiles: HashMap::new(),
            calculations: HashMap::new(),
        }
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    /// Add a profile and return its new id.
    pub fn add_profile(&mut self, profile: AircraftProfile) -> Uuid {
        let id = Uuid::new_v4();
        self.profiles.insert(id, profile);
        self.touch();
        id
    }

    /// Add a profile after checking it has a name and a formula.
    pub fn create_profile(&mut self, profile: AircraftProfile) -> CalcResult<Uuid> {
        profile.validate()?;
        Ok(self.add_profile(profile))
    }

    pub fn get_profile(&self, id: &Uuid) -> Option<&AircraftProfile> {
        self.profiles.get(id)
    }

    /// Replace a stored profile, refreshing its timestamp.
    pub fn update_profile(&mut self, id: &Uuid, mut profile: AircraftProfile) -> CalcResult<()> {
        profile.validate()?;
        let slot = self
            .profiles
            .get_mut(id)
            .ok_or_else(|| CalcError::not_found("Aircraft profile", id.to_string()))?;
        profile.timestamp = Utc::now();
        *slot = profile;
        self.touch();
        Ok(())
    }

    /// Remove a profile. Calculations that reference it are kept.
    pub fn remove_profile(&mut self, id: &Uuid) -> Option<AircraftProfile> {
        let removed = self.profiles.remove(id);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    /// Profiles owned by `user_id` plus shared ones, newest first.
    /// With no user, only shared profiles.
    pub fn profiles_for(&self, user_id: Option<&str>) -> Vec<(Uuid, &AircraftProfile)> {
        let mut profiles: Vec<_> = self
            .profiles
            .iter()
            .filter(|(_, p)| p.user_id.is_none() || p.user_id.as_deref() == user_id)
            .map(|(id, p)| (*id, p))
            .collect();
        profiles.sort_by(|a, b| b.1.timestamp.cmp(&a.1.timestamp));
        profiles
    }

    pub fn add_calculation(&mut self, calculation: Calculation) -> CalcResult<Uuid> {
        if calculation.name.trim().is_empty() {
            return Err(CalcError::missing_field("name"));
        }
        let id = Uuid::new_v4();
        self.calculations.insert(id, calculation);
        self.touch();
        Ok(id)
    }

    pub fn get_calculation(&self, id: &Uuid) -> Option<&Calculation> {
        self.calculations.get(id)
    }

    pub fn remove_calculation(&mut self, id: &Uuid) -> Option<Calculation> {
        let removed = self.calculations.remove(id);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    /// Calculations visible to `user_id`, newest first, at most `limit`.
    pub fn calculations_for(&self, user_id: Option<&str>, limit: usize) -> Vec<(Uuid, &Calculation)> {
        let mut calculations: Vec<_> = self
            .calculations
            .iter()
            .filter(|(_, c)| c.user_id.is_none() || c.user_id.as_deref() == user_id)
            .map(|(id, c)| (*id, c))
            .collect();
        calculations.sort_by(|a, b| b.1.timestamp.cmp(&a.1.timestamp));
        calculations.truncate(limit);
        calculations
    }

    pub fn stats(&self) -> LibraryStats {
        LibraryStats {
            profiles: self.profiles.len(),
            calculations: self.calculations.len(),
        }
    }
}

impl Default for ProfileLibrary {
    fn default() -> Self {
        ProfileLibrary::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::templates::AircraftTemplate;

    #[test]
    fn test_library_creation() {
        let library = ProfileLibrary::new();
        assert_eq!(library.meta.version, SCHEMA_VERSION);
        assert_eq!(library.stats(), LibraryStats { profiles: 0, calculations: 0 });
        assert_eq!(library.settings.max_station_weight, 20_000.0);
    }

    #[test]
    fn test_profile_json_shape() {
        let profile = AircraftTemplate::Cessna172N.to_profile();
        let json = serde_json::to_string_pretty(&profile).unwrap();
        assert!(json.contains("\"macConfig\""));
        assert!(json.contains("\"unit\": \"imperial\""));
        assert!(!json.contains("userId"));

        let roundtrip: AircraftProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip, profile);
    }

    #[test]
    fn test_create_update_remove_profile() {
        let mut library = ProfileLibrary::new();
        let id = library.create_profile(AircraftTemplate::PiperPa28.to_profile()).unwrap();

        let mut edited = library.get_profile(&id).unwrap().clone();
        edited.stations[1].weight = 340.0;
        library.update_profile(&id, edited).unwrap();
        assert_eq!(library.get_profile(&id).unwrap().stations[1].weight, 340.0);

        let mut nameless = AircraftTemplate::PiperPa28.to_profile();
        nameless.name = "  ".to_string();
        assert!(library.create_profile(nameless.clone()).is_err());
        assert!(library.update_profile(&Uuid::new_v4(), AircraftTemplate::PiperPa28.to_profile()).is_err());

        assert!(library.remove_profile(&id).is_some());
        assert!(library.remove_profile(&id).is_none());
    }

    #[test]
    fn test_removing_profile_keeps_calculations() {
        let mut library = ProfileLibrary::new();
        let id = library.add_profile(AircraftTemplate::Cessna172N.to_profile());
        let calc = Calculation::from_profile("Morning flight", id, library.get_profile(&id).unwrap());
        let calc_id = library.add_calculation(calc).unwrap();

        library.remove_profile(&id);
        let kept = library.get_calculation(&calc_id).unwrap();
        assert_eq!(kept.aircraft_profile_id, Some(id));
    }

    #[test]
    fn test_calculation_summary_formatting() {
        let profile = AircraftTemplate::Cessna172N.to_profile();
        let calc = Calculation::from_profile("Test", Uuid::new_v4(), &profile);

        assert_eq!(calc.stations.len(), 1);
        assert_eq!(calc.summary.zfw.weight, "1500.0 lb");
        assert_eq!(calc.summary.zfw.cg, "39.000 in");
        assert_eq!(calc.summary.ldw, calc.summary.zfw);
    }

    #[test]
    fn test_visibility_and_ordering() {
        let mut library = ProfileLibrary::new();
        let mut older = AircraftTemplate::Cessna172N.to_profile();
        older.timestamp = older.timestamp - Duration::hours(1);
        let shared_old = library.add_profile(older);
        let shared_new = library.add_profile(AircraftTemplate::PiperPa28.to_profile());
        let private = library.add_profile(AircraftTemplate::AirbusA319.to_profile().with_owner("alice"));

        let anonymous: Vec<Uuid> = library.profiles_for(None).into_iter().map(|(id, _)| id).collect();
        assert_eq!(anonymous, vec![shared_new, shared_old]);

        let alice: Vec<Uuid> = library.profiles_for(Some("alice")).into_iter().map(|(id, _)| id).collect();
        assert_eq!(alice.len(), 3);
        assert!(alice.contains(&private));
        assert!(library.profiles_for(Some("bob")).iter().all(|(id, _)| *id != private));
    }

    #[test]
    fn test_calculation_limit() {
        let mut library = ProfileLibrary::new();
        let profile = AircraftTemplate::Cessna172N.to_profile();
        for i in 0..5 {
            let calc = Calculation::from_profile(format!("Flight {i}"), Uuid::new_v4(), &profile);
            library.add_calculation(calc).unwrap();
        }
        assert_eq!(library.calculations_for(None, 3).len(), 3);
        assert_eq!(library.calculations_for(None, DEFAULT_CALCULATION_LIMIT).len(), 5);
        assert_eq!(library.stats().calculations, 5);
    }
}
