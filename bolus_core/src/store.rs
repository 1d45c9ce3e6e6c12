//! In-memory profile store, loaded from the profile CSV or filled directly.

use std::collections::HashMap;

use bolus_traits::{MedicalProfile, ProfileStore, UserId};

use crate::conversions::profile_from_row;
use crate::error::{DoseError, Result};

#[derive(Debug, Default, Clone)]
pub struct InMemoryProfileStore {
    profiles: HashMap<UserId, MedicalProfile>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a profile, returning the previous one.
    pub fn insert(&mut self, user: UserId, profile: MedicalProfile) -> Option<MedicalProfile> {
        self.profiles.insert(user, profile)
    }

    /// Build a store from CSV rows. Duplicate user ids are rejected.
    pub fn from_rows(rows: &[bolus_config::ProfileRow]) -> Result<Self> {
        let mut store = Self::new();
        for row in rows {
            let profile = profile_from_row(row)?;
            if store.insert(UserId::new(&row.user_id), profile).is_some() {
                return Err(eyre::Report::new(DoseError::Config(format!(
                    "duplicate profile for user '{}'",
                    row.user_id
                ))));
            }
        }
        tracing::debug!(profiles = store.len(), "profile store loaded");
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// User ids in sorted order.
    pub fn users(&self) -> Vec<&UserId> {
        let mut v: Vec<&UserId> = self.profiles.keys().collect();
        v.sort();
        v
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn profile(
        &self,
        user: &UserId,
    ) -> std::result::Result<Option<MedicalProfile>, Box<dyn std::error::Error + Send + Sync>>
    {
        Ok(self.profiles.get(user).cloned())
    }
}
