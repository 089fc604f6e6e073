//! Head unit shell: screen router and root display attributes

use std::sync::{Arc, Mutex};
use tracing::debug;

use super::lock;
use crate::profile::{DisplayPrefs, Screen, Theme};
use crate::sync::{AutosaveHandle, HostShell};

#[derive(Debug, Clone, Default)]
struct ShellState {
    screen: Option<Screen>,
    theme: Option<Theme>,
    brightness: Option<i32>,
    night_mode: bool,
}

#[derive(Clone)]
pub struct HeadUnitShell {
    state: Arc<Mutex<ShellState>>,
    autosave: AutosaveHandle,
}

impl HeadUnitShell {
    pub fn new(autosave: AutosaveHandle) -> Self {
        Self {
            state: Arc::new(Mutex::new(ShellState::default())),
            autosave,
        }
    }

    /// Navigate to `screen`
    pub fn show(&self, screen: Screen) {
        let changed = {
            let mut state = lock(&self.state);
            let changed = state.screen != Some(screen);
            state.screen = Some(screen);
            changed
        };
        if changed {
            debug!(?screen, "Screen changed");
            self.autosave.screen_changed(screen);
        }
    }

    pub fn screen(&self) -> Option<Screen> {
        lock(&self.state).screen
    }

    pub fn theme(&self) -> Option<Theme> {
        lock(&self.state).theme
    }

    pub fn brightness(&self) -> Option<i32> {
        lock(&self.state).brightness
    }

    pub fn night_mode(&self) -> bool {
        lock(&self.state).night_mode
    }

    /// Set the root theme attribute directly (quick toggle outside settings)
    pub fn set_theme_attribute(&self, theme: Theme) {
        lock(&self.state).theme = Some(theme);
    }
}

impl HostShell for HeadUnitShell {
    fn current_screen(&self) -> Option<Screen> {
        self.screen()
    }

    fn theme_attribute(&self) -> Option<Theme> {
        self.theme()
    }

    fn apply_display(&mut self, display: &DisplayPrefs) {
        let mut state = lock(&self.state);
        state.theme = Some(display.theme);
        state.brightness = Some(display.brightness);
        state.night_mode = display.night_mode;
    }
}
