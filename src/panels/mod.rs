//! In-memory head unit panels
//!
//! Each panel holds its live state behind an `Arc<Mutex<_>>` so the handle the
//! UI keeps and the copy registered with the synchronizer see the same values.
//! User actions update the state and then notify autosave.

mod climate;
mod lap_timer;
mod media;
mod navigation;
mod settings;
mod shell;

pub use climate::{ClimatePanel, Seat};
pub use lap_timer::LapTimer;
pub use media::MediaPanel;
pub use navigation::NavigationPanel;
pub use settings::SettingsPanel;
pub use shell::HeadUnitShell;

use std::sync::{Mutex, MutexGuard, PoisonError};

fn lock<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
