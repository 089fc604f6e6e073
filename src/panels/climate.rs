//! Climate control panel

use std::sync::{Arc, Mutex};
use tracing::debug;

use super::lock;
use crate::constants::limits::{MAX_FAN_SPEED, MAX_TEMP_F, MIN_FAN_SPEED, MIN_TEMP_F};
use crate::profile::{Category, CategoryPatch, CategoryValues, ClimatePatch, ClimatePrefs};
use crate::sync::{AutosaveHandle, Subsystem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    Driver,
    Passenger,
}

#[derive(Clone)]
pub struct ClimatePanel {
    state: Arc<Mutex<ClimatePrefs>>,
    autosave: AutosaveHandle,
}

impl ClimatePanel {
    pub fn new(autosave: AutosaveHandle) -> Self {
        Self {
            state: Arc::new(Mutex::new(ClimatePrefs::default())),
            autosave,
        }
    }

    pub fn snapshot(&self) -> ClimatePrefs {
        lock(&self.state).clone()
    }

    fn update(&self, f: impl FnOnce(&mut ClimatePrefs)) {
        f(&mut lock(&self.state));
        self.autosave.setting_changed(Category::Climate);
    }

    /// Step a zone temperature; stays within the supported range
    pub fn adjust_temp(&self, seat: Seat, delta: i32) -> i32 {
        let mut temp = 0;
        self.update(|climate| {
            let target = match seat {
                Seat::Driver => &mut climate.driver_temp,
                Seat::Passenger => &mut climate.passenger_temp,
            };
            *target = target.saturating_add(delta).clamp(MIN_TEMP_F, MAX_TEMP_F);
            temp = *target;
        });
        temp
    }

    pub fn set_fan_speed(&self, speed: i32) {
        self.update(|climate| climate.fan_speed = speed.clamp(MIN_FAN_SPEED, MAX_FAN_SPEED));
    }

    /// Automatic climate needs the compressor, so enabling auto forces A/C on
    pub fn toggle_auto(&self) -> bool {
        let mut on = false;
        self.update(|climate| {
            climate.auto = !climate.auto;
            if climate.auto {
                climate.ac = true;
            }
            on = climate.auto;
        });
        on
    }

    pub fn toggle_ac(&self) -> bool {
        let mut on = false;
        self.update(|climate| {
            climate.ac = !climate.ac;
            on = climate.ac;
        });
        on
    }

    pub fn toggle_dual_zone(&self) -> bool {
        let mut on = false;
        self.update(|climate| {
            climate.dual_zone = !climate.dual_zone;
            on = climate.dual_zone;
        });
        on
    }

    /// Heating a seat switches its cooling off
    pub fn toggle_seat_heat(&self, seat: Seat) -> bool {
        let mut on = false;
        self.update(|climate| {
            let (heat, cool) = seat_flags(climate, seat);
            *heat = !*heat;
            if *heat {
                *cool = false;
            }
            on = *heat;
        });
        on
    }

    /// Cooling a seat switches its heating off
    pub fn toggle_seat_cool(&self, seat: Seat) -> bool {
        let mut on = false;
        self.update(|climate| {
            let (heat, cool) = seat_flags(climate, seat);
            *cool = !*cool;
            if *cool {
                *heat = false;
            }
            on = *cool;
        });
        on
    }
}

fn seat_flags(climate: &mut ClimatePrefs, seat: Seat) -> (&mut bool, &mut bool) {
    match seat {
        Seat::Driver => (&mut climate.seat_heat_driver, &mut climate.seat_cool_driver),
        Seat::Passenger => (&mut climate.seat_heat_passenger, &mut climate.seat_cool_passenger),
    }
}

impl Subsystem for ClimatePanel {
    fn name(&self) -> &str {
        "climate"
    }

    fn categories(&self) -> &[Category] {
        &[Category::Climate]
    }

    fn load_state(&mut self, values: &CategoryValues) {
        if let CategoryValues::Climate(climate) = values {
            debug!(driver_temp = climate.driver_temp, fan_speed = climate.fan_speed, "Loading climate state");
            *lock(&self.state) = climate.clone();
        }
    }

    fn collect(&self, _category: Category) -> Option<CategoryPatch> {
        let climate = lock(&self.state);
        Some(CategoryPatch::Climate(ClimatePatch {
            driver_temp: Some(climate.driver_temp),
            passenger_temp: Some(climate.passenger_temp),
            fan_speed: Some(climate.fan_speed),
            auto: Some(climate.auto),
            ac: Some(climate.ac),
            dual_zone: Some(climate.dual_zone),
            seat_heat_driver: Some(climate.seat_heat_driver),
            seat_cool_driver: Some(climate.seat_cool_driver),
            seat_heat_passenger: Some(climate.seat_heat_passenger),
            seat_cool_passenger: Some(climate.seat_cool_passenger),
        }))
    }
}
