//! Media player panel

use std::sync::{Arc, Mutex};
use tracing::debug;

use super::lock;
use crate::constants::limits::{MAX_VOLUME, MIN_VOLUME};
use crate::profile::{Category, CategoryPatch, CategoryValues, MediaPatch, MediaPrefs, MediaSource};
use crate::sync::{AutosaveHandle, Subsystem};

#[derive(Clone)]
pub struct MediaPanel {
    state: Arc<Mutex<MediaPrefs>>,
    autosave: AutosaveHandle,
}

impl MediaPanel {
    pub fn new(autosave: AutosaveHandle) -> Self {
        Self {
            state: Arc::new(Mutex::new(MediaPrefs::default())),
            autosave,
        }
    }

    pub fn snapshot(&self) -> MediaPrefs {
        lock(&self.state).clone()
    }

    fn update(&self, f: impl FnOnce(&mut MediaPrefs)) {
        f(&mut lock(&self.state));
        self.autosave.setting_changed(Category::Media);
    }

    pub fn select_source(&self, source: MediaSource) {
        self.update(|media| media.last_source = source);
    }

    pub fn set_volume(&self, volume: i32) {
        self.update(|media| media.volume = volume.clamp(MIN_VOLUME, MAX_VOLUME));
    }

    /// Tune the radio; switches the source to radio as well
    pub fn tune(&self, station: u32) {
        self.update(|media| {
            media.last_source = MediaSource::Radio;
            media.last_radio_station = station;
        });
    }

    /// Returns true if the station is now a favorite
    pub fn toggle_favorite(&self, station: u32) -> bool {
        let mut favorite = false;
        self.update(|media| favorite = media.toggle_favorite(station));
        favorite
    }
}

impl Subsystem for MediaPanel {
    fn name(&self) -> &str {
        "media"
    }

    fn categories(&self) -> &[Category] {
        &[Category::Media]
    }

    fn load_state(&mut self, values: &CategoryValues) {
        if let CategoryValues::Media(media) = values {
            debug!(source = ?media.last_source, volume = media.volume, "Loading media state");
            *lock(&self.state) = media.clone();
        }
    }

    fn collect(&self, _category: Category) -> Option<CategoryPatch> {
        let media = lock(&self.state);
        Some(CategoryPatch::Media(MediaPatch {
            last_source: Some(media.last_source),
            volume: Some(media.volume),
            last_radio_station: Some(media.last_radio_station),
            favorite_stations: Some(media.favorite_stations.clone()),
        }))
    }
}
