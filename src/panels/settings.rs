//! Settings screen: display, system and vehicle unit preferences

use std::sync::{Arc, Mutex};
use tracing::debug;

use super::lock;
use crate::constants::limits::{MAX_BRIGHTNESS, MAX_VOLUME, MIN_BRIGHTNESS, MIN_VOLUME};
use crate::profile::{
    Category, CategoryPatch, CategoryValues, DisplayPatch, DisplayPrefs, DistanceUnit, DriveMode,
    SystemPatch, SystemPrefs, TemperatureUnit, Theme, UnitSystem, VehiclePatch, VehiclePrefs,
};
use crate::sync::{AutosaveHandle, Subsystem};

#[derive(Debug, Clone, Default)]
struct SettingsState {
    display: DisplayPrefs,
    system: SystemPrefs,
    vehicle: VehiclePrefs,
}

#[derive(Clone)]
pub struct SettingsPanel {
    state: Arc<Mutex<SettingsState>>,
    autosave: AutosaveHandle,
}

impl SettingsPanel {
    pub fn new(autosave: AutosaveHandle) -> Self {
        Self {
            state: Arc::new(Mutex::new(SettingsState::default())),
            autosave,
        }
    }

    pub fn display(&self) -> DisplayPrefs {
        lock(&self.state).display.clone()
    }

    pub fn system(&self) -> SystemPrefs {
        lock(&self.state).system.clone()
    }

    pub fn vehicle(&self) -> VehiclePrefs {
        lock(&self.state).vehicle.clone()
    }

    fn update(&self, category: Category, f: impl FnOnce(&mut SettingsState)) {
        f(&mut lock(&self.state));
        self.autosave.setting_changed(category);
    }

    pub fn set_brightness(&self, brightness: i32) {
        self.update(Category::Display, |s| {
            s.display.brightness = brightness.clamp(MIN_BRIGHTNESS, MAX_BRIGHTNESS);
        });
    }

    pub fn set_night_mode(&self, enabled: bool) {
        self.update(Category::Display, |s| s.display.night_mode = enabled);
    }

    pub fn set_theme(&self, theme: Theme) {
        self.update(Category::Display, |s| s.display.theme = theme);
    }

    pub fn set_language(&self, language: &str) {
        self.update(Category::System, |s| s.system.language = language.to_string());
    }

    pub fn set_key_click_sound(&self, enabled: bool) {
        self.update(Category::System, |s| s.system.key_click_sound = enabled);
    }

    pub fn set_startup_sound(&self, enabled: bool) {
        self.update(Category::System, |s| s.system.startup_sound = enabled);
    }

    pub fn set_navigation_voice(&self, enabled: bool) {
        self.update(Category::System, |s| s.system.navigation_voice = enabled);
    }

    pub fn set_system_volume(&self, volume: i32) {
        self.update(Category::System, |s| s.system.system_volume = volume.clamp(MIN_VOLUME, MAX_VOLUME));
    }

    /// Switching the unit system moves the temperature and distance units with it
    pub fn set_units(&self, units: UnitSystem) {
        self.update(Category::Vehicle, |s| {
            s.vehicle.preferred_units = units;
            (s.vehicle.temperature_unit, s.vehicle.distance_unit) = match units {
                UnitSystem::Imperial => (TemperatureUnit::Fahrenheit, DistanceUnit::Miles),
                UnitSystem::Metric => (TemperatureUnit::Celsius, DistanceUnit::Kilometers),
            };
        });
    }

    pub fn set_temperature_unit(&self, unit: TemperatureUnit) {
        self.update(Category::Vehicle, |s| s.vehicle.temperature_unit = unit);
    }

    pub fn set_distance_unit(&self, unit: DistanceUnit) {
        self.update(Category::Vehicle, |s| s.vehicle.distance_unit = unit);
    }

    pub fn set_drive_mode(&self, mode: DriveMode) {
        self.update(Category::Vehicle, |s| s.vehicle.drive_mode = mode);
    }
}

impl Subsystem for SettingsPanel {
    fn name(&self) -> &str {
        "settings"
    }

    fn categories(&self) -> &[Category] {
        &[Category::Display, Category::System, Category::Vehicle]
    }

    fn load_state(&mut self, values: &CategoryValues) {
        let mut state = lock(&self.state);
        match values {
            CategoryValues::Display(prefs) => {
                debug!(theme = ?prefs.theme, brightness = prefs.brightness, "Loading display settings");
                state.display = prefs.clone();
            }
            CategoryValues::System(system) => state.system = system.clone(),
            CategoryValues::Vehicle(vehicle) => state.vehicle = vehicle.clone(),
            _ => {}
        }
    }

    fn collect(&self, category: Category) -> Option<CategoryPatch> {
        let state = lock(&self.state);
        match category {
            Category::Display => Some(CategoryPatch::Display(DisplayPatch {
                brightness: Some(state.display.brightness),
                night_mode: Some(state.display.night_mode),
                theme: Some(state.display.theme),
            })),
            Category::System => Some(CategoryPatch::System(SystemPatch {
                language: Some(state.system.language.clone()),
                key_click_sound: Some(state.system.key_click_sound),
                startup_sound: Some(state.system.startup_sound),
                navigation_voice: Some(state.system.navigation_voice),
                system_volume: Some(state.system.system_volume),
            })),
            // Best lap belongs to the lap timer
            Category::Vehicle => Some(CategoryPatch::Vehicle(VehiclePatch {
                preferred_units: Some(state.vehicle.preferred_units),
                drive_mode: Some(state.vehicle.drive_mode),
                temperature_unit: Some(state.vehicle.temperature_unit),
                distance_unit: Some(state.vehicle.distance_unit),
                best_lap_time: None,
            })),
            _ => None,
        }
    }
}
