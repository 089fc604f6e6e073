//! Active session: which profile is in effect
//!
//! All well-known profiles are materialized up front (stored copy or
//! template). Only the current profile id is persisted when switching; the
//! profile blobs are written by the synchronizer's save cycles.

use anyhow::Result;
use std::collections::BTreeMap;
use tracing::{error, info};

use crate::profile::{Profile, ProfileId};
use crate::repository::ProfileRepository;

pub struct ActiveSession {
    repo: ProfileRepository,
    profiles: BTreeMap<ProfileId, Profile>,
    current: Option<ProfileId>,
}

impl ActiveSession {
    pub fn new(repo: ProfileRepository) -> Self {
        let profiles = ProfileId::ALL
            .into_iter()
            .map(|id| (id, repo.load(id)))
            .collect();
        Self {
            repo,
            profiles,
            current: None,
        }
    }

    pub fn repository(&self) -> &ProfileRepository {
        &self.repo
    }

    /// Make `id` current and persist the id. Returns the profile to apply.
    ///
    /// Persisting the id is best effort: a storage failure is logged and the
    /// switch still happens in memory.
    pub fn set_current(&mut self, id: ProfileId) -> &Profile {
        self.current = Some(id);
        if let Err(e) = self.repo.save_current_id(id) {
            error!(profile = %id, error = ?e, "Failed to persist current profile id");
        }
        let profile = self.profile(id);
        info!(profile = %id, name = %profile.name, "Switched current profile");
        profile
    }

    /// Current profile id, falling back to the id persisted by a previous run
    pub fn current(&self) -> Option<ProfileId> {
        self.current.or_else(|| self.repo.load_current_id())
    }

    /// Profile activated in this process, if any.
    /// Unlike [`current`](Self::current) this ignores ids from earlier runs.
    pub fn active(&self) -> Option<ProfileId> {
        self.current
    }

    pub fn profile(&self, id: ProfileId) -> &Profile {
        // Every id is inserted by `new`
        &self.profiles[&id]
    }

    pub fn active_profile(&self) -> Option<&Profile> {
        self.current.map(|id| self.profile(id))
    }

    pub fn active_profile_mut(&mut self) -> Option<(ProfileId, &mut Profile)> {
        let id = self.current?;
        self.profiles.get_mut(&id).map(|profile| (id, profile))
    }

    /// Write the in-memory copy of `id` to storage
    pub fn persist(&self, id: ProfileId) -> Result<()> {
        self.repo.save(id, self.profile(id))
    }

    /// Re-read `id` from storage, replacing the in-memory copy
    pub fn reload(&mut self, id: ProfileId) -> &Profile {
        let profile = self.repo.load(id);
        self.profiles.insert(id, profile);
        self.profile(id)
    }
}
