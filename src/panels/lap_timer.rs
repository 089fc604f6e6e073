//! Lap timer on the vehicle screen

use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::info;

use super::lock;
use crate::profile::{Category, CategoryPatch, CategoryValues, LapTime, VehiclePatch};
use crate::sync::{AutosaveHandle, Subsystem};

#[derive(Debug, Default)]
struct TimerState {
    started: Option<Instant>,
    last: Option<LapTime>,
    best: Option<LapTime>,
}

#[derive(Clone)]
pub struct LapTimer {
    state: Arc<Mutex<TimerState>>,
    autosave: AutosaveHandle,
}

impl LapTimer {
    pub fn new(autosave: AutosaveHandle) -> Self {
        Self {
            state: Arc::new(Mutex::new(TimerState::default())),
            autosave,
        }
    }

    pub fn best(&self) -> Option<LapTime> {
        lock(&self.state).best
    }

    pub fn last(&self) -> Option<LapTime> {
        lock(&self.state).last
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).started.is_some()
    }

    pub fn start(&self) {
        lock(&self.state).started = Some(Instant::now());
    }

    /// Stop the running lap and record it. `None` if no lap was running.
    pub fn stop(&self) -> Option<LapTime> {
        let started = lock(&self.state).started.take()?;
        let lap = LapTime::from_duration(started.elapsed());
        self.record(lap);
        Some(lap)
    }

    /// Record a finished lap. Returns true if it is a new best.
    pub fn record(&self, lap: LapTime) -> bool {
        let improved = {
            let mut state = lock(&self.state);
            state.last = Some(lap);
            let improved = state.best.is_none_or(|best| lap < best);
            if improved {
                state.best = Some(lap);
            }
            improved
        };

        if improved {
            info!(lap = %lap, "New best lap");
            self.autosave.setting_changed(Category::Vehicle);
        }
        improved
    }
}

impl Subsystem for LapTimer {
    fn name(&self) -> &str {
        "lap-timer"
    }

    fn categories(&self) -> &[Category] {
        &[Category::Vehicle]
    }

    fn load_state(&mut self, values: &CategoryValues) {
        if let CategoryValues::Vehicle(vehicle) = values {
            let mut state = lock(&self.state);
            state.best = vehicle.best_lap_time;
            state.last = None;
        }
    }

    fn collect(&self, _category: Category) -> Option<CategoryPatch> {
        Some(CategoryPatch::Vehicle(VehiclePatch {
            best_lap_time: lock(&self.state).best,
            ..VehiclePatch::default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::VehiclePrefs;

    #[test]
    fn test_keeps_best_lap() {
        let timer = LapTimer::new(AutosaveHandle::detached());
        assert!(timer.record(LapTime::from_hundredths(9_000)));
        assert!(!timer.record(LapTime::from_hundredths(9_500)));
        assert!(timer.record(LapTime::from_hundredths(8_700)));

        assert_eq!(timer.best(), Some(LapTime::from_hundredths(8_700)));
        assert_eq!(timer.last(), Some(LapTime::from_hundredths(8_700)));
    }

    #[test]
    fn test_stop_without_start() {
        let timer = LapTimer::new(AutosaveHandle::detached());
        assert_eq!(timer.stop(), None);

        timer.start();
        assert!(timer.is_running());
        assert!(timer.stop().is_some());
        assert!(!timer.is_running());
    }

    #[test]
    fn test_no_lap_collects_none() {
        let timer = LapTimer::new(AutosaveHandle::detached());
        let Some(CategoryPatch::Vehicle(patch)) = timer.collect(Category::Vehicle) else {
            panic!("expected a vehicle patch");
        };
        assert_eq!(patch, VehiclePatch::default());
    }

    #[test]
    fn test_stored_best_must_be_beaten() {
        let mut timer = LapTimer::new(AutosaveHandle::detached());
        let vehicle = VehiclePrefs {
            best_lap_time: Some(LapTime::from_hundredths(7_000)),
            ..VehiclePrefs::default()
        };
        timer.load_state(&CategoryValues::Vehicle(vehicle));
        assert!(!timer.record(LapTime::from_hundredths(7_100)));
        assert_eq!(timer.best(), Some(LapTime::from_hundredths(7_000)));
    }
}
