//! Settings synchronizer: profile ↔ UI subsystems
//!
//! Apply pushes the active profile into every registered subsystem. Collect
//! pulls patches back from them and merges into the active profile, then the
//! profile is persisted. Nothing in here returns an error to the UI layer:
//! storage failures are logged and reported as a [`SaveOutcome`].

use chrono::Utc;
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

use super::subsystem::{HostShell, Subsystem};
use crate::profile::{Category, CategoryPatch, CategoryValues, ProfileId, Screen};
use crate::session::ActiveSession;

/// Where a save cycle currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Collecting,
    Persisting,
}

/// Result of one collect/persist cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Profile collected and written
    Saved(ProfileId),
    /// No profile activated yet, nothing collected or written
    NoActiveProfile,
    /// Collected in memory but the write failed (already logged)
    Failed(ProfileId),
}

pub struct Synchronizer {
    session: ActiveSession,
    subsystems: Vec<Box<dyn Subsystem>>,
    shell: Option<Box<dyn HostShell>>,
    /// Values for categories no registered subsystem owned at apply time
    pending: BTreeMap<Category, CategoryValues>,
    /// Screen reported by the latest screen change
    last_screen: Option<Screen>,
    state: CycleState,
}

impl Synchronizer {
    pub fn new(session: ActiveSession) -> Self {
        Self {
            session,
            subsystems: Vec::new(),
            shell: None,
            pending: BTreeMap::new(),
            last_screen: None,
            state: CycleState::Idle,
        }
    }

    pub fn session(&self) -> &ActiveSession {
        &self.session
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Categories still waiting for an owning subsystem
    pub fn pending_categories(&self) -> Vec<Category> {
        self.pending.keys().copied().collect()
    }

    /// Register a subsystem and bring it up to date.
    ///
    /// Pending values for its categories are flushed into it; categories with
    /// nothing pending get the active profile's values.
    pub fn register(&mut self, mut subsystem: Box<dyn Subsystem>) {
        let categories = subsystem.categories().to_vec();
        info!(subsystem = subsystem.name(), ?categories, "Registering subsystem");

        for category in categories {
            let values = self.pending.remove(&category).or_else(|| {
                self.session
                    .active_profile()
                    .map(|profile| profile.preferences.values(category))
            });
            if let Some(values) = values {
                debug!(subsystem = subsystem.name(), %category, "Late apply");
                subsystem.load_state(&values);
            }
        }

        self.subsystems.push(subsystem);
    }

    /// Attach the host shell; it receives display values on every apply
    pub fn attach_shell(&mut self, mut shell: Box<dyn HostShell>) {
        if let Some(profile) = self.session.active_profile() {
            shell.apply_display(&profile.preferences.display);
        }
        self.shell = Some(shell);
    }

    /// Switch to `id` and apply it.
    ///
    /// The outgoing profile is collected and saved first so changes made
    /// since the last autosave are not lost by the switch. Re-activating the
    /// active profile collects before re-applying for the same reason.
    pub fn activate(&mut self, id: ProfileId) {
        match self.session.active() {
            Some(previous) if previous != id => {
                info!(from = %previous, to = %id, "Saving outgoing profile before switch");
                self.save_current();
            }
            Some(_) => {
                debug!(profile = %id, "Re-activating current profile");
                self.collect();
                self.state = CycleState::Idle;
            }
            None => {}
        }
        self.session.set_current(id);
        self.apply();
    }

    /// Push every category of the active profile to its owners
    pub fn apply(&mut self) {
        let Some(profile) = self.session.active_profile() else {
            debug!("Apply requested with no active profile");
            return;
        };

        for category in Category::ALL {
            let values = profile.preferences.values(category);
            let mut delivered = false;
            for subsystem in self
                .subsystems
                .iter_mut()
                .filter(|s| s.categories().contains(&category))
            {
                subsystem.load_state(&values);
                delivered = true;
            }

            if delivered {
                self.pending.remove(&category);
            } else {
                debug!(%category, "No subsystem registered, deferring apply");
                self.pending.insert(category, values);
            }
        }

        if let Some(shell) = self.shell.as_mut() {
            shell.apply_display(&profile.preferences.display);
        }

        info!(profile = %profile.name, "Profile applied");
    }

    /// Remember the screen the user switched to
    pub fn record_screen(&mut self, screen: Screen) {
        self.last_screen = Some(screen);
    }

    /// Pull live values from subsystems into the active profile (in memory).
    /// Returns the id collected into, `None` if no profile is active.
    pub fn collect(&mut self) -> Option<ProfileId> {
        let Some((id, profile)) = self.session.active_profile_mut() else {
            debug!("Collect skipped: no active profile");
            return None;
        };
        self.state = CycleState::Collecting;

        let mut theme_reported = false;
        for subsystem in &self.subsystems {
            for &category in subsystem.categories() {
                let Some(patch) = subsystem.collect(category) else {
                    debug!(subsystem = subsystem.name(), %category, "Nothing to collect");
                    continue;
                };
                if patch.category() != category {
                    warn!(
                        subsystem = subsystem.name(),
                        expected = %category,
                        got = %patch.category(),
                        "Subsystem returned a patch for the wrong category, ignoring"
                    );
                    continue;
                }
                if let CategoryPatch::Display(display) = &patch {
                    theme_reported |= display.theme.is_some();
                }
                if profile.preferences.merge(patch) {
                    warn!(profile = %id, subsystem = subsystem.name(), %category, "Clamped collected values");
                }
            }
        }

        // Theme: settings state first, then the shell's root attribute
        if !theme_reported
            && let Some(theme) = self.shell.as_ref().and_then(|shell| shell.theme_attribute())
        {
            profile.preferences.display.theme = theme;
        }

        let screen = self
            .last_screen
            .or_else(|| self.shell.as_ref().and_then(|shell| shell.current_screen()));
        if let Some(screen) = screen {
            profile.last_state.last_screen = screen;
        }
        profile.last_state.timestamp = Utc::now();

        Some(id)
    }

    /// One full cycle: collect into the active profile, then persist it
    pub fn save_current(&mut self) -> SaveOutcome {
        let Some(id) = self.collect() else {
            self.state = CycleState::Idle;
            return SaveOutcome::NoActiveProfile;
        };

        self.state = CycleState::Persisting;
        let outcome = match self.session.persist(id) {
            Ok(()) => {
                debug!(profile = %id, "Profile saved");
                SaveOutcome::Saved(id)
            }
            Err(e) => {
                error!(profile = %id, error = ?e, "Failed to save profile");
                SaveOutcome::Failed(id)
            }
        };
        self.state = CycleState::Idle;
        outcome
    }

    /// Push-style change from a subsystem: merge its values, then save
    pub fn on_change(&mut self, patch: CategoryPatch) -> SaveOutcome {
        let category = patch.category();
        match self.session.active_profile_mut() {
            Some((id, profile)) => {
                debug!(profile = %id, %category, "Setting changed");
                profile.preferences.merge(patch);
            }
            None => {
                debug!(%category, "Setting changed with no active profile, ignoring");
                return SaveOutcome::NoActiveProfile;
            }
        }
        self.save_current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{
        ClimatePrefs, DisplayPatch, MediaSource, Profile, SystemPatch, Theme,
    };
    use crate::repository::ProfileRepository;
    use crate::store::{KeyValueStore, MemoryStore};
    use anyhow::bail;
    use std::sync::{Arc, Mutex};

    /// Subsystem double recording what it was given
    #[derive(Clone, Default)]
    struct Probe {
        categories: Vec<Category>,
        loaded: Arc<Mutex<Vec<CategoryValues>>>,
        reply: Arc<Mutex<Vec<CategoryPatch>>>,
    }

    impl Probe {
        fn owning(categories: &[Category]) -> Self {
            Self {
                categories: categories.to_vec(),
                ..Self::default()
            }
        }

        fn loaded(&self) -> Vec<CategoryValues> {
            self.loaded.lock().unwrap().clone()
        }

        fn reply_with(&self, patch: CategoryPatch) {
            self.reply.lock().unwrap().push(patch);
        }
    }

    impl Subsystem for Probe {
        fn name(&self) -> &str {
            "probe"
        }

        fn categories(&self) -> &[Category] {
            &self.categories
        }

        fn load_state(&mut self, values: &CategoryValues) {
            self.loaded.lock().unwrap().push(values.clone());
        }

        fn collect(&self, _category: Category) -> Option<CategoryPatch> {
            // Answers with whatever was queued, matching category or not
            self.reply.lock().unwrap().first().cloned()
        }
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Ok(None)
        }

        fn put(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            bail!("disk full")
        }
    }

    fn synchronizer() -> (Arc<MemoryStore>, Synchronizer) {
        let store = Arc::new(MemoryStore::new());
        let session = ActiveSession::new(ProfileRepository::new(store.clone()));
        (store, Synchronizer::new(session))
    }

    fn stored(store: &MemoryStore, id: ProfileId) -> Option<Profile> {
        store
            .get(&format!("profile:{id}"))
            .unwrap()
            .map(|raw| serde_json::from_str(&raw).unwrap())
    }

    #[test]
    fn test_collect_before_activation_is_noop() {
        let (store, mut sync) = synchronizer();
        let probe = Probe::owning(&[Category::Display]);
        probe.reply_with(CategoryPatch::Display(DisplayPatch {
            brightness: Some(40),
            ..DisplayPatch::default()
        }));
        sync.register(Box::new(probe));

        assert_eq!(sync.save_current(), SaveOutcome::NoActiveProfile);
        assert!(store.is_empty());
        assert_eq!(sync.state(), CycleState::Idle);
    }

    #[test]
    fn test_apply_defers_until_registration() {
        let (_store, mut sync) = synchronizer();
        sync.activate(ProfileId::Driver1);
        assert_eq!(sync.pending_categories(), Category::ALL.to_vec());

        let climate = Probe::owning(&[Category::Climate]);
        sync.register(Box::new(climate.clone()));
        assert_eq!(climate.loaded(), vec![CategoryValues::Climate(ClimatePrefs::default())]);
        assert!(!sync.pending_categories().contains(&Category::Climate));
    }

    #[test]
    fn test_second_owner_gets_active_values() {
        let (_store, mut sync) = synchronizer();
        sync.activate(ProfileId::Guest);
        sync.register(Box::new(Probe::owning(&[Category::Vehicle])));

        let late = Probe::owning(&[Category::Vehicle]);
        sync.register(Box::new(late.clone()));
        assert_eq!(late.loaded().len(), 1);
        assert_eq!(late.loaded()[0].category(), Category::Vehicle);
    }

    #[test]
    fn test_register_before_activation_loads_nothing() {
        let (_store, mut sync) = synchronizer();
        let probe = Probe::owning(&[Category::Media]);
        sync.register(Box::new(probe.clone()));
        assert!(probe.loaded().is_empty());

        sync.activate(ProfileId::Driver2);
        assert_eq!(probe.loaded().len(), 1);
    }

    #[test]
    fn test_collect_merges_and_clamps() {
        let (store, mut sync) = synchronizer();
        let display = Probe::owning(&[Category::Display]);
        sync.register(Box::new(display.clone()));
        sync.activate(ProfileId::Driver1);

        display.reply_with(CategoryPatch::Display(DisplayPatch {
            brightness: Some(150),
            ..DisplayPatch::default()
        }));
        assert_eq!(sync.save_current(), SaveOutcome::Saved(ProfileId::Driver1));

        let saved = stored(&store, ProfileId::Driver1).unwrap();
        assert_eq!(saved.preferences.display.brightness, 100);
        assert_eq!(saved.preferences.display.theme, Theme::Dark);
    }

    #[test]
    fn test_wrong_category_patch_is_ignored() {
        let (store, mut sync) = synchronizer();
        let rogue = Probe::owning(&[Category::Display]);
        rogue.reply_with(CategoryPatch::System(SystemPatch {
            system_volume: Some(10),
            ..SystemPatch::default()
        }));
        sync.register(Box::new(rogue));
        sync.activate(ProfileId::Driver1);
        assert_eq!(sync.save_current(), SaveOutcome::Saved(ProfileId::Driver1));

        let saved = stored(&store, ProfileId::Driver1).unwrap();
        assert_eq!(saved.preferences.system.system_volume, 75);
    }

    #[test]
    fn test_on_change_merges_and_persists() {
        let (store, mut sync) = synchronizer();
        sync.activate(ProfileId::Driver2);

        let outcome = sync.on_change(CategoryPatch::System(SystemPatch {
            key_click_sound: Some(true),
            ..SystemPatch::default()
        }));
        assert_eq!(outcome, SaveOutcome::Saved(ProfileId::Driver2));
        assert!(stored(&store, ProfileId::Driver2).unwrap().preferences.system.key_click_sound);
    }

    #[test]
    fn test_on_change_without_profile_is_noop() {
        let (store, mut sync) = synchronizer();
        let outcome = sync.on_change(CategoryPatch::System(SystemPatch::default()));
        assert_eq!(outcome, SaveOutcome::NoActiveProfile);
        assert!(store.is_empty());
    }

    #[test]
    fn test_switch_saves_outgoing_profile() {
        let (store, mut sync) = synchronizer();
        let media = Probe::owning(&[Category::Media]);
        sync.register(Box::new(media.clone()));
        sync.activate(ProfileId::Driver1);

        media.reply_with(CategoryPatch::Media(crate::profile::MediaPatch {
            last_source: Some(MediaSource::Bluetooth),
            ..Default::default()
        }));
        sync.activate(ProfileId::Guest);

        let saved = stored(&store, ProfileId::Driver1).unwrap();
        assert_eq!(saved.preferences.media.last_source, MediaSource::Bluetooth);
        assert_eq!(sync.session().current(), Some(ProfileId::Guest));
    }

    #[test]
    fn test_reactivating_keeps_uncollected_changes() {
        let (_store, mut sync) = synchronizer();
        let media = Probe::owning(&[Category::Media]);
        sync.register(Box::new(media.clone()));
        sync.activate(ProfileId::Driver1);

        media.reply_with(CategoryPatch::Media(crate::profile::MediaPatch {
            volume: Some(12),
            ..Default::default()
        }));
        sync.activate(ProfileId::Driver1);

        let CategoryValues::Media(reapplied) = media.loaded().last().cloned().unwrap() else {
            panic!("expected media values");
        };
        assert_eq!(reapplied.volume, 12);
        assert_eq!(sync.state(), CycleState::Idle);
    }

    #[test]
    fn test_storage_failure_is_reported_not_raised() {
        let session = ActiveSession::new(ProfileRepository::new(Arc::new(FailingStore)));
        let mut sync = Synchronizer::new(session);
        sync.activate(ProfileId::Driver1);

        assert_eq!(sync.save_current(), SaveOutcome::Failed(ProfileId::Driver1));
        assert_eq!(sync.state(), CycleState::Idle);
        // Still current in memory despite the id write failing too
        assert_eq!(sync.session().active(), Some(ProfileId::Driver1));
    }

    #[test]
    fn test_recorded_screen_lands_in_last_state() {
        let (store, mut sync) = synchronizer();
        sync.activate(ProfileId::Driver1);
        sync.record_screen(Screen::Climate);
        sync.save_current();

        let saved = stored(&store, ProfileId::Driver1).unwrap();
        assert_eq!(saved.last_state.last_screen, Screen::Climate);
    }

    struct FixedShell {
        screen: Option<Screen>,
        theme: Option<Theme>,
        applied: Arc<Mutex<Vec<crate::profile::DisplayPrefs>>>,
    }

    impl HostShell for FixedShell {
        fn current_screen(&self) -> Option<Screen> {
            self.screen
        }

        fn theme_attribute(&self) -> Option<Theme> {
            self.theme
        }

        fn apply_display(&mut self, display: &crate::profile::DisplayPrefs) {
            self.applied.lock().unwrap().push(display.clone());
        }
    }

    fn shell(screen: Option<Screen>, theme: Option<Theme>) -> (FixedShell, Arc<Mutex<Vec<crate::profile::DisplayPrefs>>>) {
        let applied = Arc::new(Mutex::new(Vec::new()));
        let shell = FixedShell {
            screen,
            theme,
            applied: applied.clone(),
        };
        (shell, applied)
    }

    #[test]
    fn test_theme_falls_back_to_shell_attribute() {
        let (store, mut sync) = synchronizer();
        let (host, _) = shell(Some(Screen::Media), Some(Theme::Light));
        sync.attach_shell(Box::new(host));
        sync.activate(ProfileId::Driver1);
        sync.save_current();

        let saved = stored(&store, ProfileId::Driver1).unwrap();
        assert_eq!(saved.preferences.display.theme, Theme::Light);
        assert_eq!(saved.last_state.last_screen, Screen::Media);
    }

    #[test]
    fn test_settings_theme_wins_over_shell_attribute() {
        let (store, mut sync) = synchronizer();
        let (host, _) = shell(None, Some(Theme::Light));
        sync.attach_shell(Box::new(host));
        let settings = Probe::owning(&[Category::Display]);
        settings.reply_with(CategoryPatch::Display(DisplayPatch {
            theme: Some(Theme::Auto),
            ..DisplayPatch::default()
        }));
        sync.register(Box::new(settings));
        sync.activate(ProfileId::Driver1);
        sync.save_current();

        let saved = stored(&store, ProfileId::Driver1).unwrap();
        assert_eq!(saved.preferences.display.theme, Theme::Auto);
    }

    #[test]
    fn test_no_theme_source_keeps_stored_theme() {
        let (store, mut sync) = synchronizer();
        sync.activate(ProfileId::Guest);
        sync.save_current();
        let saved = stored(&store, ProfileId::Guest).unwrap();
        assert_eq!(saved.preferences.display.theme, Theme::Dark);
    }

    #[test]
    fn test_apply_reaches_shell() {
        let (_store, mut sync) = synchronizer();
        let (host, applied) = shell(None, None);
        sync.attach_shell(Box::new(host));
        assert!(applied.lock().unwrap().is_empty());

        sync.activate(ProfileId::Driver2);
        assert_eq!(applied.lock().unwrap().len(), 1);
        assert_eq!(applied.lock().unwrap()[0].brightness, 80);
    }

    #[test]
    fn test_recorded_screen_wins_over_shell() {
        let (store, mut sync) = synchronizer();
        let (host, _) = shell(Some(Screen::Home), None);
        sync.attach_shell(Box::new(host));
        sync.activate(ProfileId::Driver1);
        sync.record_screen(Screen::Phone);
        sync.save_current();

        let saved = stored(&store, ProfileId::Driver1).unwrap();
        assert_eq!(saved.last_state.last_screen, Screen::Phone);
    }
}
