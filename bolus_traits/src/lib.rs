//! Collaborator contracts for the bolus engine.
//!
//! The dose calculator itself is pure; the data it consumes comes from a
//! user-profile store owned by the surrounding service. This crate holds the
//! plain profile record and the lookup trait so store backends do not need to
//! depend on the calculation crate.

pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

use std::fmt;

/// Opaque user identity used to key profile lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Per-user medical profile as stored by the profile store.
///
/// Values are stored as-is; validation (positivity, defaults for the
/// adjustment percentages) happens when the profile is resolved for a
/// calculation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MedicalProfile {
    /// Units of insulin per gram of carbohydrate ("1:10" is stored as 0.1).
    pub insulin_carb_ratio: Option<f32>,
    /// mg/dL glucose drop per unit of insulin.
    pub correction_factor: Option<f32>,
    /// Target glucose in mg/dL.
    pub target_glucose: Option<u16>,
    pub sick_day_percent: Option<u8>,
    pub stress_percent: Option<u8>,
    pub light_exercise_percent: Option<u8>,
    pub intense_exercise_percent: Option<u8>,
}

/// Read-only profile lookup keyed by user identity.
///
/// `Ok(None)` means the user has no stored profile; that is not an error.
pub trait ProfileStore {
    fn profile(
        &self,
        user: &UserId,
    ) -> Result<Option<MedicalProfile>, Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: ProfileStore + ?Sized> ProfileStore for Box<T> {
    fn profile(
        &self,
        user: &UserId,
    ) -> Result<Option<MedicalProfile>, Box<dyn std::error::Error + Send + Sync>> {
        (**self).profile(user)
    }
}
