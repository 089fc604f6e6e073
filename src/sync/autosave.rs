//! Autosave task
//!
//! A single task owns the save schedule. UI code never saves directly; it
//! sends a [`SaveTrigger`] through an [`AutosaveHandle`] and the task runs at
//! most one collect/persist cycle at a time. Triggers queued while a cycle is
//! running are coalesced into the next one.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::synchronizer::{SaveOutcome, Synchronizer};
use crate::profile::{Category, Screen};

/// Why a save was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTrigger {
    SettingChanged(Category),
    ScreenChanged(Screen),
    PeriodicTick,
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutosavePolicy {
    pub interval: Duration,
    pub on_setting_change: bool,
    pub on_screen_change: bool,
    pub on_shutdown: bool,
}

impl Default for AutosavePolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(crate::constants::autosave::DEFAULT_INTERVAL_SECS),
            on_setting_change: true,
            on_screen_change: true,
            on_shutdown: true,
        }
    }
}

impl AutosavePolicy {
    /// Whether `trigger` should start a save cycle
    pub fn allows(&self, trigger: SaveTrigger) -> bool {
        match trigger {
            SaveTrigger::SettingChanged(_) => self.on_setting_change,
            SaveTrigger::ScreenChanged(_) => self.on_screen_change,
            SaveTrigger::PeriodicTick => true,
            SaveTrigger::Shutdown => self.on_shutdown,
        }
    }
}

/// Cheap, clonable sender side handed to UI subsystems
#[derive(Debug, Clone)]
pub struct AutosaveHandle {
    tx: mpsc::UnboundedSender<SaveTrigger>,
}

impl AutosaveHandle {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SaveTrigger>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Handle whose triggers go nowhere, for subsystems used without autosave
    pub fn detached() -> Self {
        Self::channel().0
    }

    pub fn send(&self, trigger: SaveTrigger) {
        // Receiver gone means the autosave task already shut down
        if self.tx.send(trigger).is_err() {
            debug!(?trigger, "Autosave task not running, dropping trigger");
        }
    }

    pub fn setting_changed(&self, category: Category) {
        self.send(SaveTrigger::SettingChanged(category));
    }

    pub fn screen_changed(&self, screen: Screen) {
        self.send(SaveTrigger::ScreenChanged(screen));
    }

    pub fn shutdown(&self) {
        self.send(SaveTrigger::Shutdown);
    }
}

pub struct Autosave {
    policy: AutosavePolicy,
    sync: Arc<Mutex<Synchronizer>>,
    rx: mpsc::UnboundedReceiver<SaveTrigger>,
}

impl Autosave {
    pub fn new(
        policy: AutosavePolicy,
        sync: Arc<Mutex<Synchronizer>>,
        rx: mpsc::UnboundedReceiver<SaveTrigger>,
    ) -> Self {
        Self { policy, sync, rx }
    }

    /// Run until a shutdown trigger arrives or every handle is dropped.
    /// Returns the outcome of the final cycle, if one ran.
    pub async fn run(mut self) -> Option<SaveOutcome> {
        let mut ticker = time::interval_at(Instant::now() + self.policy.interval, self.policy.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = self.policy.interval.as_secs(), "Autosave started");

        loop {
            let first = tokio::select! {
                _ = ticker.tick() => SaveTrigger::PeriodicTick,
                received = self.rx.recv() => received.unwrap_or(SaveTrigger::Shutdown),
            };

            let mut batch = vec![first];
            while let Ok(next) = self.rx.try_recv() {
                batch.push(next);
            }

            let outcome = run_cycle(&self.sync, &self.policy, &batch);
            if batch.contains(&SaveTrigger::Shutdown) {
                info!(?outcome, "Autosave stopped");
                return outcome;
            }
        }
    }
}

/// Handle one coalesced batch of triggers; runs at most one save.
///
/// Screen changes are recorded even when screen-change saves are disabled so
/// the next save still carries the right last screen.
pub fn run_cycle(
    sync: &Mutex<Synchronizer>,
    policy: &AutosavePolicy,
    batch: &[SaveTrigger],
) -> Option<SaveOutcome> {
    let mut sync = sync.lock().unwrap_or_else(PoisonError::into_inner);

    for trigger in batch {
        if let SaveTrigger::ScreenChanged(screen) = trigger {
            sync.record_screen(*screen);
        }
    }

    if !batch.iter().any(|trigger| policy.allows(*trigger)) {
        debug!(?batch, "Triggers disabled by policy, skipping save");
        return None;
    }

    if batch.len() > 1 {
        debug!(count = batch.len(), "Coalesced save triggers");
    }

    let outcome = sync.save_current();
    if let SaveOutcome::Failed(id) = outcome {
        warn!(profile = %id, "Autosave cycle failed, will retry on next trigger");
    }
    Some(outcome)
}
