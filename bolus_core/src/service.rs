//! Service layer: profile lookup, calculation mode selection and dosing.

use bolus_traits::{MedicalProfile, ProfileStore, UserId};

use crate::calculator::{CalculationMode, DoseBreakdown, DoseCalculator, DoseRequest};
use crate::config::AdjustmentPercents;
use crate::error::{DoseError, Result};
use crate::profile::{ResolvedParams, resolve};

/// Service-layer entry point: profile lookup, mode selection, calculation.
///
/// Every call reads the current profile and recomputes; results are not cached.
pub struct BolusService<S> {
    store: S,
    calculator: DoseCalculator,
    default_mode: Option<CalculationMode>,
}

impl<S: ProfileStore> BolusService<S> {
    pub fn new(store: S, calculator: DoseCalculator) -> Self {
        Self {
            store,
            calculator,
            default_mode: None,
        }
    }

    /// Mode used when a call does not name one. `None` infers per request.
    pub fn with_default_mode(mut self, mode: Option<CalculationMode>) -> Self {
        self.default_mode = mode;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn calculator(&self) -> &DoseCalculator {
        &self.calculator
    }

    /// Fetch a stored profile, mapping store failures to `DoseError::ProfileStore`.
    pub fn lookup(&self, user: &UserId) -> Result<Option<MedicalProfile>> {
        self.store.profile(user).map_err(|e| {
            tracing::error!(user = %user, error = %e, "profile lookup failed");
            eyre::Report::new(DoseError::ProfileStore(e.to_string()))
        })
    }

    /// Resolve a user's stored profile without calculating anything.
    pub fn resolved_profile(&self, user: &UserId) -> Result<ResolvedParams> {
        let profile = self.lookup(user)?;
        Ok(resolve(profile.as_ref(), &self.adjustment_defaults()))
    }

    /// Calculate a dose. Without a user the calculation runs with no profile.
    ///
    /// Mode precedence: `mode` argument, then the service default, then
    /// `CalculationMode::infer`.
    pub fn dose(
        &self,
        user: Option<&UserId>,
        request: &DoseRequest,
        mode: Option<CalculationMode>,
    ) -> Result<DoseBreakdown> {
        let profile = match user {
            Some(u) => self.lookup(u)?,
            None => None,
        };
        let mode = mode
            .or(self.default_mode)
            .unwrap_or_else(|| CalculationMode::infer(request));
        tracing::debug!(
            user = user.map(UserId::as_str),
            mode = mode.as_str(),
            profile_found = profile.is_some(),
            "dose requested"
        );
        self.calculator.calculate(mode, request, profile.as_ref())
    }

    /// Calculate a dose for a stored user.
    pub fn dose_for(
        &self,
        user: &UserId,
        request: &DoseRequest,
        mode: Option<CalculationMode>,
    ) -> Result<DoseBreakdown> {
        self.dose(Some(user), request, mode)
    }

    fn adjustment_defaults(&self) -> AdjustmentPercents {
        self.calculator.cfg().adjustments
    }
}
