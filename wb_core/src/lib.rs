//! # wb_core - Aircraft Weight & Balance Engine
//!
//! `wb_core` computes zero-fuel, takeoff and landing weights, their centers of
//! gravity and %MAC positions, checks them against a profile's limits, and
//! simulates CG travel as fuel burns off. All inputs and outputs are
//! JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: a profile's stations and %MAC configuration are passed in
//!   on every call
//! - **Safe formulas**: user %MAC formulas are parsed into an expression tree,
//!   never executed as code
//! - **Rich Errors**: structured error types, not just strings
//!
//! ## Quick Start
//!
//! ```rust
//! use wb_core::calculations::WeightBalanceReport;
//! use wb_core::templates::AircraftTemplate;
//!
//! let mut profile = AircraftTemplate::Cessna172N.to_profile();
//! profile.stations[1].weight = 170.0; // pilot
//! profile.stations[6].weight = 240.0; // fuel
//!
//! let report = WeightBalanceReport::compute(&profile.stations, &profile.mac_config, profile.unit);
//! assert!(report.validation.all_in_limits);
//! ```
//!
//! ## Modules
//!
//! - [`formula`] - %MAC formula parsing and evaluation
//! - [`calculations`] - Envelope, limit checks and fuel sequencing
//! - [`station`] - Loading stations and their validation
//! - [`cargo`] - Ad-hoc cargo stations
//! - [`templates`] - Built-in aircraft profiles
//! - [`profile`] - Profiles, saved calculations and the profile library
//! - [`export`] - JSON export document
//! - [`units`] - Unit systems, conversions and display formatting
//! - [`errors`] - Structured error types
//! - [`file_io`] - Library files with atomic saves and locking

pub mod calculations;
pub mod cargo;
pub mod errors;
pub mod export;
#[cfg(not(target_arch = "wasm32"))]
pub mod file_io;
pub mod formula;
pub mod profile;
pub mod station;
pub mod templates;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use calculations::{EnvelopeData, LimitValidation, Summaries, WeightBalanceReport};
pub use errors::{CalcError, CalcResult};
pub use export::ExportDocument;
#[cfg(not(target_arch = "wasm32"))]
pub use file_io::{load_library, save_library, FileLock};
pub use formula::{MacConfig, MacFormula};
pub use profile::{AircraftProfile, Calculation, ProfileLibrary};
pub use station::{Station, StationType};
pub use units::UnitSystem;
