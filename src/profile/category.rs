//! Preference categories and the partial updates collected from subsystems
//!
//! A subsystem reports what it currently knows as a patch: every field is
//! optional, and a `None` field leaves the stored value untouched. Merging
//! never resets a field to its default.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::lap_time::LapTime;
use super::model::{
    ClimatePrefs, DisplayPrefs, DistanceUnit, DriveMode, MediaPrefs, MediaSource,
    NavigationPrefs, Preferences, SystemPrefs, TemperatureUnit, Theme, UnitSystem, VehiclePrefs,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Climate,
    Media,
    Display,
    Navigation,
    Vehicle,
    System,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Climate,
        Category::Media,
        Category::Display,
        Category::Navigation,
        Category::Vehicle,
        Category::System,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Climate => "climate",
            Category::Media => "media",
            Category::Display => "display",
            Category::Navigation => "navigation",
            Category::Vehicle => "vehicle",
            Category::System => "system",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full values of one category, pushed to subsystems on apply
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryValues {
    Climate(ClimatePrefs),
    Media(MediaPrefs),
    Display(DisplayPrefs),
    Navigation(NavigationPrefs),
    Vehicle(VehiclePrefs),
    System(SystemPrefs),
}

impl CategoryValues {
    pub fn category(&self) -> Category {
        match self {
            CategoryValues::Climate(_) => Category::Climate,
            CategoryValues::Media(_) => Category::Media,
            CategoryValues::Display(_) => Category::Display,
            CategoryValues::Navigation(_) => Category::Navigation,
            CategoryValues::Vehicle(_) => Category::Vehicle,
            CategoryValues::System(_) => Category::System,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClimatePatch {
    pub driver_temp: Option<i32>,
    pub passenger_temp: Option<i32>,
    pub fan_speed: Option<i32>,
    pub auto: Option<bool>,
    pub ac: Option<bool>,
    pub dual_zone: Option<bool>,
    pub seat_heat_driver: Option<bool>,
    pub seat_cool_driver: Option<bool>,
    pub seat_heat_passenger: Option<bool>,
    pub seat_cool_passenger: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaPatch {
    pub last_source: Option<MediaSource>,
    pub volume: Option<i32>,
    pub last_radio_station: Option<u32>,
    pub favorite_stations: Option<Vec<u32>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayPatch {
    pub brightness: Option<i32>,
    pub night_mode: Option<bool>,
    pub theme: Option<Theme>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationPatch {
    pub home_address: Option<String>,
    pub work_address: Option<String>,
    pub recent_destinations: Option<Vec<String>>,
}

/// `best_lap_time: None` means "no lap recorded", never "clear the stored lap"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehiclePatch {
    pub preferred_units: Option<UnitSystem>,
    pub drive_mode: Option<DriveMode>,
    pub temperature_unit: Option<TemperatureUnit>,
    pub distance_unit: Option<DistanceUnit>,
    pub best_lap_time: Option<LapTime>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemPatch {
    pub language: Option<String>,
    pub key_click_sound: Option<bool>,
    pub startup_sound: Option<bool>,
    pub navigation_voice: Option<bool>,
    pub system_volume: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CategoryPatch {
    Climate(ClimatePatch),
    Media(MediaPatch),
    Display(DisplayPatch),
    Navigation(NavigationPatch),
    Vehicle(VehiclePatch),
    System(SystemPatch),
}

impl CategoryPatch {
    pub fn category(&self) -> Category {
        match self {
            CategoryPatch::Climate(_) => Category::Climate,
            CategoryPatch::Media(_) => Category::Media,
            CategoryPatch::Display(_) => Category::Display,
            CategoryPatch::Navigation(_) => Category::Navigation,
            CategoryPatch::Vehicle(_) => Category::Vehicle,
            CategoryPatch::System(_) => Category::System,
        }
    }
}

/// Copy every `Some` field of a patch onto the target
macro_rules! merge_fields {
    ($target:expr, $patch:expr; $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = $patch.$field {
                $target.$field = value;
            }
        )+
    };
}

impl ClimatePrefs {
    pub fn merge(&mut self, patch: ClimatePatch) {
        merge_fields!(self, patch;
            driver_temp, passenger_temp, fan_speed, auto, ac, dual_zone,
            seat_heat_driver, seat_cool_driver, seat_heat_passenger, seat_cool_passenger,
        );
    }
}

impl MediaPrefs {
    pub fn merge(&mut self, patch: MediaPatch) {
        merge_fields!(self, patch; last_source, volume, last_radio_station, favorite_stations);
    }
}

impl DisplayPrefs {
    pub fn merge(&mut self, patch: DisplayPatch) {
        merge_fields!(self, patch; brightness, night_mode, theme);
    }
}

impl NavigationPrefs {
    pub fn merge(&mut self, patch: NavigationPatch) {
        merge_fields!(self, patch; home_address, work_address, recent_destinations);
    }
}

impl VehiclePrefs {
    pub fn merge(&mut self, patch: VehiclePatch) {
        merge_fields!(self, patch; preferred_units, drive_mode, temperature_unit, distance_unit);
        if let Some(lap) = patch.best_lap_time {
            self.best_lap_time = Some(lap);
        }
    }
}

impl SystemPrefs {
    pub fn merge(&mut self, patch: SystemPatch) {
        merge_fields!(self, patch;
            language, key_click_sound, startup_sound, navigation_voice, system_volume,
        );
    }
}

impl Preferences {
    /// Snapshot one category for pushing to a subsystem
    pub fn values(&self, category: Category) -> CategoryValues {
        match category {
            Category::Climate => CategoryValues::Climate(self.climate.clone()),
            Category::Media => CategoryValues::Media(self.media.clone()),
            Category::Display => CategoryValues::Display(self.display.clone()),
            Category::Navigation => CategoryValues::Navigation(self.navigation.clone()),
            Category::Vehicle => CategoryValues::Vehicle(self.vehicle.clone()),
            Category::System => CategoryValues::System(self.system.clone()),
        }
    }

    /// Merge a patch into its category, then clamp that category.
    /// Returns true if clamping had to correct a value.
    pub fn merge(&mut self, patch: CategoryPatch) -> bool {
        match patch {
            CategoryPatch::Climate(p) => {
                self.climate.merge(p);
                self.climate.validate_and_clamp()
            }
            CategoryPatch::Media(p) => {
                self.media.merge(p);
                self.media.validate_and_clamp()
            }
            CategoryPatch::Display(p) => {
                self.display.merge(p);
                self.display.validate_and_clamp()
            }
            CategoryPatch::Navigation(p) => {
                self.navigation.merge(p);
                self.navigation.validate_and_clamp()
            }
            CategoryPatch::Vehicle(p) => {
                self.vehicle.merge(p);
                false
            }
            CategoryPatch::System(p) => {
                self.system.merge(p);
                self.system.validate_and_clamp()
            }
        }
    }
}
