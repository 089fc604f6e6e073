//! Navigation panel

use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::lock;
use crate::profile::{Category, CategoryPatch, CategoryValues, NavigationPatch, NavigationPrefs};
use crate::sync::{AutosaveHandle, Subsystem};

#[derive(Clone)]
pub struct NavigationPanel {
    state: Arc<Mutex<NavigationPrefs>>,
    autosave: AutosaveHandle,
}

impl NavigationPanel {
    pub fn new(autosave: AutosaveHandle) -> Self {
        Self {
            state: Arc::new(Mutex::new(NavigationPrefs::default())),
            autosave,
        }
    }

    pub fn snapshot(&self) -> NavigationPrefs {
        lock(&self.state).clone()
    }

    fn update(&self, f: impl FnOnce(&mut NavigationPrefs)) {
        f(&mut lock(&self.state));
        self.autosave.setting_changed(Category::Navigation);
    }

    pub fn set_home(&self, address: &str) {
        self.update(|nav| nav.home_address = address.trim().to_string());
    }

    pub fn set_work(&self, address: &str) {
        self.update(|nav| nav.work_address = address.trim().to_string());
    }

    /// Start guidance; the destination becomes the most recent one
    pub fn navigate_to(&self, destination: &str) {
        info!(destination, "Starting guidance");
        self.update(|nav| nav.push_recent(destination));
    }
}

impl Subsystem for NavigationPanel {
    fn name(&self) -> &str {
        "navigation"
    }

    fn categories(&self) -> &[Category] {
        &[Category::Navigation]
    }

    fn load_state(&mut self, values: &CategoryValues) {
        if let CategoryValues::Navigation(nav) = values {
            debug!(recent = nav.recent_destinations.len(), "Loading navigation state");
            *lock(&self.state) = nav.clone();
        }
    }

    fn collect(&self, _category: Category) -> Option<CategoryPatch> {
        let nav = lock(&self.state);
        Some(CategoryPatch::Navigation(NavigationPatch {
            home_address: Some(nav.home_address.clone()),
            work_address: Some(nav.work_address.clone()),
            recent_destinations: Some(nav.recent_destinations.clone()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigate_to_records_recent() {
        let nav = NavigationPanel::new(AutosaveHandle::detached());
        nav.navigate_to("Office");
        nav.navigate_to("Gym");
        nav.navigate_to("Office");
        assert_eq!(nav.snapshot().recent_destinations, vec!["Office", "Gym"]);
    }

    #[test]
    fn test_addresses_are_trimmed() {
        let nav = NavigationPanel::new(AutosaveHandle::detached());
        nav.set_home("  1 Main St ");
        nav.set_work("Plant 4");
        let snapshot = nav.snapshot();
        assert_eq!(snapshot.home_address, "1 Main St");
        assert_eq!(snapshot.work_address, "Plant 4");
    }
}
