//! Keeping the active profile and the live UI in step

mod autosave;
mod subsystem;
mod synchronizer;

pub use autosave::{run_cycle, Autosave, AutosaveHandle, AutosavePolicy, SaveTrigger};
pub use subsystem::{HostShell, Subsystem};
pub use synchronizer::{CycleState, SaveOutcome, Synchronizer};
