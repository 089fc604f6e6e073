//! Interfaces between the synchronizer and the UI subsystems it serves

use crate::profile::{Category, CategoryPatch, CategoryValues, DisplayPrefs, Screen, Theme};

/// A UI subsystem owning one or more preference categories.
///
/// Subsystems register with the [`Synchronizer`](super::Synchronizer) once
/// constructed. Apply pushes stored values through `load_state`; collect pulls
/// the live values back through `collect`.
pub trait Subsystem: Send {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Categories this subsystem owns
    fn categories(&self) -> &[Category];

    /// Update widgets and internal state from stored values.
    /// Called once per owned category on every apply.
    fn load_state(&mut self, values: &CategoryValues);

    /// Current values for `category`, `None` while nothing can be read.
    /// Fields the subsystem cannot resolve stay `None` in the patch.
    fn collect(&self, category: Category) -> Option<CategoryPatch>;
}

/// The head unit's outer shell (screen router and root theme attribute)
pub trait HostShell: Send {
    /// Screen currently shown
    fn current_screen(&self) -> Option<Screen>;

    /// Theme attribute on the root element, used when no settings state reports one
    fn theme_attribute(&self) -> Option<Theme>;

    /// Apply theme, brightness and night mode to the root element
    fn apply_display(&mut self, _display: &DisplayPrefs) {}
}
