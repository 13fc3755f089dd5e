//! # Export Document
//!
//! A self-contained JSON snapshot of one calculation: the profile name, the
//! loaded stations, the %MAC configuration and every computed figure. Written
//! to disk by [`crate::file_io::write_export`].

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::calculations::{EnvelopeData, LimitValidation, Summaries, WeightBalanceReport};
use crate::errors::{CalcError, CalcResult};
use crate::formula::MacConfig;
use crate::profile::AircraftProfile;
use crate::station::Station;
use crate::units::UnitSystem;

/// Name used when no profile is selected
pub const DEFAULT_PROFILE_NAME: &str = "Custom Configuration";

/// Characters that may not survive into a file name: whitespace and path separators
static UNSAFE_NAME_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s/\\]+").expect("static regex"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub profile_name: String,
    pub timestamp: DateTime<Utc>,
    pub unit: UnitSystem,
    pub mac_config: MacConfig,
    /// Stations carrying weight
    pub stations: Vec<Station>,
    pub summaries: Summaries,
    pub envelope_data: EnvelopeData,
    pub validation: LimitValidation,
}

impl ExportDocument {
    /// Build a document from an already computed report.
    pub fn new(
        profile_name: Option<&str>,
        stations: &[Station],
        mac_config: &MacConfig,
        unit: UnitSystem,
        report: &WeightBalanceReport,
    ) -> Self {
        ExportDocument {
            profile_name: profile_name.unwrap_or(DEFAULT_PROFILE_NAME).to_string(),
            timestamp: Utc::now(),
            unit,
            mac_config: mac_config.clone(),
            stations: stations.iter().filter(|s| s.is_loaded()).cloned().collect(),
            summaries: report.summaries,
            envelope_data: report.envelope_data,
            validation: report.validation,
        }
    }

    /// Compute the report for `profile` and wrap it.
    pub fn from_profile(profile: &AircraftProfile) -> Self {
        let report = profile.report();
        ExportDocument::new(Some(&profile.name), &profile.stations, &profile.mac_config, profile.unit, &report)
    }

    pub fn to_json_pretty(&self) -> CalcResult<String> {
        serde_json::to_string_pretty(self).map_err(CalcError::serialization)
    }

    /// Suggested file name for this document.
    pub fn file_name(&self) -> String {
        export_file_name(&self.profile_name, self.timestamp.date_naive(), "json")
    }
}

/// `weight-balance-<name>-<YYYY-MM-DD>.<extension>`, with runs of whitespace
/// and path separators in the name replaced by a single `-`.
pub fn export_file_name(profile_name: &str, date: NaiveDate, extension: &str) -> String {
    format!(
        "weight-balance-{}-{}.{}",
        UNSAFE_NAME_RUN.replace_all(profile_name, "-"),
        date.format("%Y-%m-%d"),
        extension
    )
}
