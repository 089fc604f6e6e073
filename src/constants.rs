//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the crate, providing a single source of truth for constant values.

/// Config file location constants
pub mod config {
    /// Directory name under the platform config/data dirs
    pub const APP_DIR: &str = "driver-profiles";

    /// Config file name
    pub const FILENAME: &str = "config.json";
}

/// Key-value storage layout
pub mod storage {
    /// Prefix for per-profile records (`profile:<id>`)
    pub const PROFILE_KEY_PREFIX: &str = "profile:";

    /// Scalar key holding the current profile id
    pub const CURRENT_PROFILE_KEY: &str = "current_profile";

    /// Extension for files written by the file-backed store
    pub const FILE_EXTENSION: &str = "json";
}

/// Bounds applied to every write of a bounded preference
pub mod limits {
    /// Climate setpoints in degrees Fahrenheit
    pub const MIN_TEMP_F: i32 = 60;
    pub const MAX_TEMP_F: i32 = 85;

    /// Fan speed steps
    pub const MIN_FAN_SPEED: i32 = 1;
    pub const MAX_FAN_SPEED: i32 = 10;

    /// Media and system volume percentage
    pub const MIN_VOLUME: i32 = 0;
    pub const MAX_VOLUME: i32 = 100;

    /// Display brightness percentage
    pub const MIN_BRIGHTNESS: i32 = 20;
    pub const MAX_BRIGHTNESS: i32 = 100;

    /// Recent navigation destinations kept per profile
    pub const MAX_RECENT_DESTINATIONS: usize = 10;
}

/// Autosave policy constants
pub mod autosave {
    /// Periodic save interval
    pub const DEFAULT_INTERVAL_SECS: u64 = 30;

    /// Accepted range for a configured interval
    pub const MIN_INTERVAL_SECS: u64 = 5;
    pub const MAX_INTERVAL_SECS: u64 = 3600;
}
