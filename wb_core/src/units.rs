//! # Unit Types
//!
//! Unit systems, conversions and display formatting for weight & balance
//! values.
//!
//! ## Imperial vs Metric
//!
//! A profile is entered either in imperial (lb, in) or metric (kg, m) units.
//! Moments are kept in whatever weight x length unit the stations use, so the
//! engine never converts stored data. The one place a conversion is forced is
//! the %MAC formula: formulas are always written against a CG in inches (see
//! [`crate::calculations::envelope`]).
//!
//! ## Example
//!
//! ```rust
//! use wb_core::units::{convert_units, Inches, Meters, Quantity, UnitSystem};
//!
//! let arm: Meters = Inches(39.37).into();
//! assert!((arm.0 - 1.0).abs() < 1e-3);
//!
//! let kg = convert_units(100.0, UnitSystem::Imperial, UnitSystem::Metric, Quantity::Weight);
//! assert!((kg - 45.359237).abs() < 1e-9);
//! ```

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

use serde::{Deserialize, Serialize};

/// Meters per inch
pub const IN_TO_M: f64 = 0.0254;

/// Kilograms per pound
pub const LB_TO_KG: f64 = 0.45359237;

/// Moments are displayed divided by this reduction factor
pub const MOMENT_DIVISOR: f64 = 100.0;

// ============================================================================
// Unit System
// ============================================================================

/// Unit system a profile's stations are entered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// Pounds and inches
    #[default]
    Imperial,
    /// Kilograms and meters
    Metric,
}

impl UnitSystem {
    pub fn is_metric(self) -> bool {
        self == UnitSystem::Metric
    }

    /// Weight label ("lb" or "kg")
    pub fn weight_label(self) -> &'static str {
        match self {
            UnitSystem::Imperial => "lb",
            UnitSystem::Metric => "kg",
        }
    }

    /// Length label ("in" or "m")
    pub fn length_label(self) -> &'static str {
        match self {
            UnitSystem::Imperial => "in",
            UnitSystem::Metric => "m",
        }
    }

    /// Decimal places used when displaying a length (arm or CG)
    pub fn length_decimals(self) -> usize {
        match self {
            UnitSystem::Imperial => 3,
            UnitSystem::Metric => 4,
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitSystem::Imperial => write!(f, "imperial"),
            UnitSystem::Metric => write!(f, "metric"),
        }
    }
}

/// Physical quantity selector for [`convert_units`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quantity {
    Weight,
    Length,
}

// ============================================================================
// Weight Units
// ============================================================================

/// Weight in pounds
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pounds(pub f64);

/// Weight in kilograms
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kilograms(pub f64);

impl From<Pounds> for Kilograms {
    fn from(lb: Pounds) -> Self {
        Kilograms(lb.0 * LB_TO_KG)
    }
}

impl From<Kilograms> for Pounds {
    fn from(kg: Kilograms) -> Self {
        Pounds(kg.0 / LB_TO_KG)
    }
}

// ============================================================================
// Length Units
// ============================================================================

/// Length in inches
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inches(pub f64);

/// Length in meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

impl From<Inches> for Meters {
    fn from(inches: Inches) -> Self {
        Meters(inches.0 * IN_TO_M)
    }
}

impl From<Meters> for Inches {
    fn from(m: Meters) -> Self {
        Inches(m.0 / IN_TO_M)
    }
}

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }
        }
    };
}

impl_arithmetic!(Pounds);
impl_arithmetic!(Kilograms);
impl_arithmetic!(Inches);
impl_arithmetic!(Meters);

// ============================================================================
// Conversion & Formatting
// ============================================================================

/// Convert a raw value between unit systems.
///
/// Returns `value` unchanged when `from == to`.
pub fn convert_units(value: f64, from: UnitSystem, to: UnitSystem, quantity: Quantity) -> f64 {
    if from == to {
        return value;
    }

    match (quantity, from) {
        (Quantity::Weight, UnitSystem::Imperial) => Kilograms::from(Pounds(value)).0,
        (Quantity::Weight, UnitSystem::Metric) => Pounds::from(Kilograms(value)).0,
        (Quantity::Length, UnitSystem::Imperial) => Meters::from(Inches(value)).0,
        (Quantity::Length, UnitSystem::Metric) => Inches::from(Meters(value)).0,
    }
}

/// Format a weight with one decimal and its unit label, e.g. `"1500.0 lb"`.
pub fn format_weight(weight: f64, unit: UnitSystem) -> String {
    format!("{:.1} {}", weight, unit.weight_label())
}

/// Format a length (arm or CG), e.g. `"39.000 in"` or `"0.9906 m"`.
pub fn format_length(length: f64, unit: UnitSystem) -> String {
    format!("{:.*} {}", unit.length_decimals(), length, unit.length_label())
}

/// Format a moment reduced by [`MOMENT_DIVISOR`], e.g. `58500 -> "585.00"`.
pub fn format_moment(moment: f64) -> String {
    format!("{:.2}", moment / MOMENT_DIVISOR)
}
