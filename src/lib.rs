#![forbid(unsafe_code)]

//! Driver profiles for an automotive head unit
//!
//! - **profile**: the profile model, templates and clamping
//! - **store** / **repository**: durable key-value storage of profiles
//! - **session**: which profile is current
//! - **sync**: apply/collect between the active profile and UI subsystems, plus autosave
//! - **panels**: in-memory head unit panels implementing the subsystem interfaces
//! - **config**: host configuration file

pub mod config;
pub mod constants;
pub mod panels;
pub mod profile;
pub mod repository;
pub mod session;
pub mod store;
pub mod sync;

pub use profile::{Category, Profile, ProfileId, Screen};
pub use repository::ProfileRepository;
pub use session::ActiveSession;
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use sync::{Autosave, AutosaveHandle, AutosavePolicy, SaveOutcome, Synchronizer};
