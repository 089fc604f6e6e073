//! Driver profile data model
//!
//! One profile per driver identity, each holding a complete preference tree
//! plus the screen that was active when the driver last left.

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use super::lap_time::LapTime;
use crate::constants::limits;

/// Well-known driver identities (two named drivers + one guest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileId {
    Driver1,
    Driver2,
    Guest,
}

impl ProfileId {
    pub const ALL: [ProfileId; 3] = [ProfileId::Driver1, ProfileId::Driver2, ProfileId::Guest];

    pub fn as_str(self) -> &'static str {
        match self {
            ProfileId::Driver1 => "driver1",
            ProfileId::Driver2 => "driver2",
            ProfileId::Guest => "guest",
        }
    }

    /// Name given to a freshly materialized profile
    pub fn display_name(self) -> &'static str {
        match self {
            ProfileId::Driver1 => "Driver 1",
            ProfileId::Driver2 => "Driver 2",
            ProfileId::Guest => "Guest",
        }
    }

    pub fn is_guest(self) -> bool {
        matches!(self, ProfileId::Guest)
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProfileId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow!("unknown profile '{s}' (expected driver1, driver2 or guest)"))
    }
}

/// Head unit screens, recorded as the driver's last screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    #[default]
    Home,
    Climate,
    Media,
    Radio,
    Navigation,
    Phone,
    Settings,
    Assistant,
    Vehicle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MediaSource {
    #[default]
    Radio,
    Bluetooth,
    #[serde(rename = "USB")]
    Usb,
    Spotify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Imperial,
    Metric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveMode {
    #[default]
    Comfort,
    Sport,
    Eco,
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[default]
    Fahrenheit,
    Celsius,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceUnit {
    #[default]
    Miles,
    Kilometers,
}

/// Profile - a named bundle of every preference category plus last-used screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub preferences: Preferences,
    pub last_state: LastState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastState {
    pub last_screen: Screen,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Preferences {
    pub climate: ClimatePrefs,
    pub media: MediaPrefs,
    pub display: DisplayPrefs,
    pub navigation: NavigationPrefs,
    pub vehicle: VehiclePrefs,
    pub system: SystemPrefs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClimatePrefs {
    pub driver_temp: i32,
    pub passenger_temp: i32,
    pub fan_speed: i32,
    pub auto: bool,
    pub ac: bool,
    pub dual_zone: bool,
    pub seat_heat_driver: bool,
    pub seat_cool_driver: bool,
    pub seat_heat_passenger: bool,
    pub seat_cool_passenger: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaPrefs {
    pub last_source: MediaSource,
    pub volume: i32,
    /// Index into the radio station list
    pub last_radio_station: u32,
    #[serde(default)]
    pub favorite_stations: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayPrefs {
    pub brightness: i32,
    pub night_mode: bool,
    pub theme: Theme,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationPrefs {
    pub home_address: String,
    pub work_address: String,
    /// Most recent first, capped at `limits::MAX_RECENT_DESTINATIONS`
    #[serde(default)]
    pub recent_destinations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePrefs {
    pub preferred_units: UnitSystem,
    pub drive_mode: DriveMode,
    pub temperature_unit: TemperatureUnit,
    pub distance_unit: DistanceUnit,
    #[serde(default)]
    pub best_lap_time: Option<LapTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemPrefs {
    pub language: String,
    pub key_click_sound: bool,
    pub startup_sound: bool,
    pub navigation_voice: bool,
    pub system_volume: i32,
}

impl Default for ClimatePrefs {
    fn default() -> Self {
        Self {
            driver_temp: 72,
            passenger_temp: 72,
            fan_speed: 5,
            auto: true,
            ac: true,
            dual_zone: false,
            seat_heat_driver: false,
            seat_cool_driver: false,
            seat_heat_passenger: false,
            seat_cool_passenger: false,
        }
    }
}

impl Default for MediaPrefs {
    fn default() -> Self {
        Self {
            last_source: MediaSource::Radio,
            volume: 50,
            last_radio_station: 0,
            favorite_stations: Vec::new(),
        }
    }
}

impl Default for DisplayPrefs {
    fn default() -> Self {
        Self {
            brightness: 80,
            night_mode: false,
            theme: Theme::Dark,
        }
    }
}

impl Default for SystemPrefs {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            key_click_sound: false,
            startup_sound: true,
            navigation_voice: true,
            system_volume: 75,
        }
    }
}

impl Default for LastState {
    fn default() -> Self {
        Self {
            last_screen: Screen::Home,
            timestamp: Utc::now(),
        }
    }
}

impl Profile {
    /// Template for a named driver (touch sounds off)
    pub fn driver_default(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            preferences: Preferences::default(),
            last_state: LastState::default(),
        }
    }

    /// Template for the guest seat (touch sounds on)
    pub fn guest_default() -> Self {
        let mut profile = Self::driver_default(ProfileId::Guest.display_name());
        profile.preferences.system.key_click_sound = true;
        profile
    }

    /// Materialize the template matching `id`
    pub fn default_for(id: ProfileId) -> Self {
        if id.is_guest() {
            Self::guest_default()
        } else {
            Self::driver_default(id.display_name())
        }
    }

    /// Clamp every bounded field to its range.
    /// Returns true if anything had to be corrected.
    pub fn validate_and_clamp(&mut self) -> bool {
        let changed = self.preferences.validate_and_clamp();
        if changed {
            info!(profile = %self.name, "Corrected out-of-range preferences");
        }
        changed
    }
}

impl Preferences {
    pub fn validate_and_clamp(&mut self) -> bool {
        // Non-short-circuiting so every category gets checked
        self.climate.validate_and_clamp()
            | self.media.validate_and_clamp()
            | self.display.validate_and_clamp()
            | self.navigation.validate_and_clamp()
            | self.system.validate_and_clamp()
    }
}

/// Clamp a single field, logging the correction
fn clamp_field(field: &'static str, value: &mut i32, min: i32, max: i32) -> bool {
    let clamped = (*value).clamp(min, max);
    if clamped == *value {
        return false;
    }
    warn!(field, value = *value, min, max, "Preference out of range, clamping");
    *value = clamped;
    true
}

impl ClimatePrefs {
    pub fn validate_and_clamp(&mut self) -> bool {
        use limits::{MAX_FAN_SPEED, MAX_TEMP_F, MIN_FAN_SPEED, MIN_TEMP_F};

        clamp_field("climate.driverTemp", &mut self.driver_temp, MIN_TEMP_F, MAX_TEMP_F)
            | clamp_field("climate.passengerTemp", &mut self.passenger_temp, MIN_TEMP_F, MAX_TEMP_F)
            | clamp_field("climate.fanSpeed", &mut self.fan_speed, MIN_FAN_SPEED, MAX_FAN_SPEED)
    }
}

impl MediaPrefs {
    pub fn validate_and_clamp(&mut self) -> bool {
        let mut changed =
            clamp_field("media.volume", &mut self.volume, limits::MIN_VOLUME, limits::MAX_VOLUME);

        let before = self.favorite_stations.len();
        let mut seen = Vec::with_capacity(before);
        self.favorite_stations.retain(|station| {
            if seen.contains(station) {
                false
            } else {
                seen.push(*station);
                true
            }
        });
        if self.favorite_stations.len() != before {
            warn!(removed = before - self.favorite_stations.len(), "Dropped duplicate favorite stations");
            changed = true;
        }
        changed
    }

    /// Add or remove a station from favorites. Returns true if it is now a favorite.
    pub fn toggle_favorite(&mut self, station: u32) -> bool {
        if let Some(idx) = self.favorite_stations.iter().position(|s| *s == station) {
            self.favorite_stations.remove(idx);
            false
        } else {
            self.favorite_stations.push(station);
            true
        }
    }
}

impl DisplayPrefs {
    pub fn validate_and_clamp(&mut self) -> bool {
        clamp_field(
            "display.brightness",
            &mut self.brightness,
            limits::MIN_BRIGHTNESS,
            limits::MAX_BRIGHTNESS,
        )
    }
}

impl NavigationPrefs {
    pub fn validate_and_clamp(&mut self) -> bool {
        let max = limits::MAX_RECENT_DESTINATIONS;
        if self.recent_destinations.len() > max {
            warn!(count = self.recent_destinations.len(), max, "Too many recent destinations, truncating");
            self.recent_destinations.truncate(max);
            return true;
        }
        false
    }

    /// Record a destination as the most recent one.
    /// An existing entry moves to the front instead of being duplicated.
    pub fn push_recent(&mut self, destination: &str) {
        let destination = destination.trim();
        if destination.is_empty() {
            return;
        }
        self.recent_destinations.retain(|d| d != destination);
        self.recent_destinations.insert(0, destination.to_string());
        self.recent_destinations.truncate(limits::MAX_RECENT_DESTINATIONS);
    }
}

impl SystemPrefs {
    pub fn validate_and_clamp(&mut self) -> bool {
        clamp_field(
            "system.systemVolume",
            &mut self.system_volume,
            limits::MIN_VOLUME,
            limits::MAX_VOLUME,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_default_has_touch_sounds_on() {
        let guest = Profile::default_for(ProfileId::Guest);
        assert_eq!(guest.name, "Guest");
        assert!(guest.preferences.system.key_click_sound);
    }

    #[test]
    fn test_driver_default_has_touch_sounds_off() {
        for id in [ProfileId::Driver1, ProfileId::Driver2] {
            let profile = Profile::default_for(id);
            assert_eq!(profile.name, id.display_name());
            assert!(!profile.preferences.system.key_click_sound);
        }
    }

    #[test]
    fn test_templates_differ_only_in_touch_sounds() {
        let mut guest = Profile::guest_default().preferences;
        let driver = Profile::driver_default("Driver 1").preferences;
        guest.system.key_click_sound = false;
        assert_eq!(guest, driver);
    }

    #[test]
    fn test_profile_id_parse() {
        assert_eq!("driver1".parse::<ProfileId>().unwrap(), ProfileId::Driver1);
        assert_eq!(" GUEST ".parse::<ProfileId>().unwrap(), ProfileId::Guest);
        assert!("driver3".parse::<ProfileId>().is_err());
    }

    #[test]
    fn test_clamp_climate_and_display() {
        let mut profile = Profile::default_for(ProfileId::Driver1);
        profile.preferences.climate.driver_temp = 999;
        profile.preferences.climate.passenger_temp = -4;
        profile.preferences.climate.fan_speed = 0;
        profile.preferences.display.brightness = 150;

        assert!(profile.validate_and_clamp());
        assert_eq!(profile.preferences.climate.driver_temp, 85);
        assert_eq!(profile.preferences.climate.passenger_temp, 60);
        assert_eq!(profile.preferences.climate.fan_speed, 1);
        assert_eq!(profile.preferences.display.brightness, 100);
    }

    #[test]
    fn test_clamp_is_noop_for_defaults() {
        let mut profile = Profile::default_for(ProfileId::Driver2);
        let before = profile.clone();
        assert!(!profile.validate_and_clamp());
        assert_eq!(profile, before);
    }

    #[test]
    fn test_clamp_volumes() {
        let mut prefs = Preferences::default();
        prefs.media.volume = 101;
        prefs.system.system_volume = -1;
        assert!(prefs.validate_and_clamp());
        assert_eq!(prefs.media.volume, 100);
        assert_eq!(prefs.system.system_volume, 0);
    }

    #[test]
    fn test_push_recent_moves_existing_to_front() {
        let mut nav = NavigationPrefs::default();
        nav.push_recent("Airport");
        nav.push_recent("Office");
        nav.push_recent("Airport");
        assert_eq!(nav.recent_destinations, vec!["Airport", "Office"]);
    }

    #[test]
    fn test_push_recent_caps_length() {
        let mut nav = NavigationPrefs::default();
        for i in 0..15 {
            nav.push_recent(&format!("Stop {i}"));
        }
        assert_eq!(nav.recent_destinations.len(), limits::MAX_RECENT_DESTINATIONS);
        assert_eq!(nav.recent_destinations[0], "Stop 14");
    }

    #[test]
    fn test_push_recent_ignores_blank() {
        let mut nav = NavigationPrefs::default();
        nav.push_recent("   ");
        assert!(nav.recent_destinations.is_empty());
    }

    #[test]
    fn test_toggle_favorite() {
        let mut media = MediaPrefs::default();
        assert!(media.toggle_favorite(3));
        assert!(media.toggle_favorite(7));
        assert!(!media.toggle_favorite(3));
        assert_eq!(media.favorite_stations, vec![7]);
    }

    #[test]
    fn test_duplicate_favorites_removed_on_clamp() {
        let mut media = MediaPrefs {
            favorite_stations: vec![1, 2, 1, 3, 2],
            ..MediaPrefs::default()
        };
        assert!(media.validate_and_clamp());
        assert_eq!(media.favorite_stations, vec![1, 2, 3]);
    }

    #[test]
    fn test_serialized_field_names() {
        let profile = Profile::default_for(ProfileId::Driver1);
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["preferences"]["climate"]["driverTemp"], 72);
        assert_eq!(json["preferences"]["media"]["lastSource"], "Radio");
        assert_eq!(json["preferences"]["display"]["theme"], "dark");
        assert_eq!(json["preferences"]["vehicle"]["temperatureUnit"], "Fahrenheit");
        assert!(json["preferences"]["vehicle"]["bestLapTime"].is_null());
        assert_eq!(json["lastState"]["lastScreen"], "home");
    }

    #[test]
    fn test_usb_source_wire_name() {
        let json = serde_json::to_string(&MediaSource::Usb).unwrap();
        assert_eq!(json, "\"USB\"");
    }
}
