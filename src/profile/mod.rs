//! Driver profile model
//!
//! - **model**: the profile tree, its templates and clamping rules
//! - **category**: per-category values and the patches merged during collect
//! - **lap_time**: `mm:ss.hh` lap times

pub mod category;
pub mod lap_time;
pub mod model;

pub use category::{
    Category, CategoryPatch, CategoryValues, ClimatePatch, DisplayPatch, MediaPatch,
    NavigationPatch, SystemPatch, VehiclePatch,
};
pub use lap_time::LapTime;
pub use model::{
    ClimatePrefs, DisplayPrefs, DistanceUnit, DriveMode, LastState, MediaPrefs, MediaSource,
    NavigationPrefs, Preferences, Profile, ProfileId, Screen, SystemPrefs, TemperatureUnit, Theme,
    UnitSystem, VehiclePrefs,
};
