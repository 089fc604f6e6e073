//! Profile repository over a key-value store
//!
//! Each profile is stored as one JSON record under `profile:<id>`; the current
//! profile id lives under its own scalar key. Loading never fails: a missing or
//! malformed record materializes the profile's template instead.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::constants::storage::{CURRENT_PROFILE_KEY, PROFILE_KEY_PREFIX};
use crate::profile::{Profile, ProfileId};
use crate::store::KeyValueStore;

/// One row of [`ProfileRepository::list`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSummary {
    pub id: ProfileId,
    pub name: String,
    pub persisted: bool,
}

#[derive(Clone)]
pub struct ProfileRepository {
    store: Arc<dyn KeyValueStore>,
}

impl ProfileRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key(id: ProfileId) -> String {
        format!("{PROFILE_KEY_PREFIX}{id}")
    }

    /// Read and validate the persisted record, `None` if absent or unusable
    fn load_persisted(&self, id: ProfileId) -> Option<Profile> {
        let raw = match self.store.get(&Self::key(id)) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(profile = %id, error = ?e, "Failed to read stored profile, using default");
                return None;
            }
        };

        match serde_json::from_str::<Profile>(&raw) {
            Ok(mut profile) => {
                profile.validate_and_clamp();
                Some(profile)
            }
            Err(e) => {
                warn!(profile = %id, error = %e, "Stored profile is malformed, using default");
                None
            }
        }
    }

    /// Load the profile for `id`, falling back to its template
    pub fn load(&self, id: ProfileId) -> Profile {
        if let Some(profile) = self.load_persisted(id) {
            debug!(profile = %id, name = %profile.name, "Loaded stored profile");
            return profile;
        }
        info!(profile = %id, "No usable stored profile, materializing default");
        Profile::default_for(id)
    }

    /// Serialize and write the whole profile under `id`'s key
    pub fn save(&self, id: ProfileId, profile: &Profile) -> Result<()> {
        let json = serde_json::to_string_pretty(profile)
            .with_context(|| format!("Failed to serialize profile '{id}'"))?;
        self.store
            .put(&Self::key(id), &json)
            .with_context(|| format!("Failed to persist profile '{id}'"))?;
        debug!(profile = %id, "Saved profile");
        Ok(())
    }

    /// Every well-known profile with its name and whether it has been persisted
    pub fn list(&self) -> Vec<ProfileSummary> {
        ProfileId::ALL
            .into_iter()
            .map(|id| {
                let persisted = self.load_persisted(id);
                ProfileSummary {
                    id,
                    name: persisted
                        .as_ref()
                        .map_or_else(|| id.display_name().to_string(), |p| p.name.clone()),
                    persisted: persisted.is_some(),
                }
            })
            .collect()
    }

    /// The last persisted current profile id, if any
    pub fn load_current_id(&self) -> Option<ProfileId> {
        match self.store.get(CURRENT_PROFILE_KEY) {
            Ok(Some(raw)) => raw
                .parse()
                .inspect_err(|e| warn!(value = %raw, error = %e, "Ignoring invalid stored current profile"))
                .ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(error = ?e, "Failed to read current profile id");
                None
            }
        }
    }

    pub fn save_current_id(&self, id: ProfileId) -> Result<()> {
        self.store
            .put(CURRENT_PROFILE_KEY, id.as_str())
            .with_context(|| format!("Failed to persist current profile '{id}'"))
    }
}
