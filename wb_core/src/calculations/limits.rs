//! # Limit Validation
//!
//! Checks each configuration's %MAC against the profile's closed interval
//! `[mac_min, mac_max]`.

use serde::{Deserialize, Serialize};

use super::envelope::{Configuration, EnvelopeData};
use crate::formula::MacConfig;

/// Per-configuration limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitValidation {
    pub zfw: bool,
    pub tow: bool,
    pub ldw: bool,
    pub all_in_limits: bool,
}

impl LimitValidation {
    pub fn get(&self, configuration: Configuration) -> bool {
        match configuration {
            Configuration::Zfw => self.zfw,
            Configuration::Tow => self.tow,
            Configuration::Ldw => self.ldw,
        }
    }

    /// Configurations outside limits, in ZFW, TOW, LDW order
    pub fn failures(&self) -> Vec<Configuration> {
        Configuration::ALL
            .into_iter()
            .filter(|c| !self.get(*c))
            .collect()
    }
}

/// Compare envelope %MAC values against `mac_config` limits (inclusive).
///
/// An empty configuration reports `mac = 0` and is judged like any other
/// value, so it fails whenever `mac_min > 0`.
pub fn validate_limits(envelope: &EnvelopeData, mac_config: &MacConfig) -> LimitValidation {
    let zfw = mac_config.contains(envelope.zfw.mac);
    let tow = mac_config.contains(envelope.tow.mac);
    let ldw = mac_config.contains(envelope.ldw.mac);

    LimitValidation {
        zfw,
        tow,
        ldw,
        all_in_limits: zfw && tow && ldw,
    }
}
