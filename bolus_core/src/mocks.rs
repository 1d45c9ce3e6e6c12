//! Test and helper mocks for bolus_core

use bolus_traits::{MedicalProfile, ProfileStore, UserId};

/// A profile store that always fails; useful for exercising the
/// store-error path of `BolusService`.
pub struct UnavailableProfileStore;

impl ProfileStore for UnavailableProfileStore {
    fn profile(
        &self,
        _user: &UserId,
    ) -> Result<Option<MedicalProfile>, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("profile store unavailable")))
    }
}
