#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use driver_profiles::config::{parse_log_level, AppConfig};
use driver_profiles::panels::{
    ClimatePanel, HeadUnitShell, LapTimer, MediaPanel, NavigationPanel, SettingsPanel,
};
use driver_profiles::{
    ActiveSession, Autosave, AutosaveHandle, ProfileId, ProfileRepository, Synchronizer,
};

/// Driver profile host for the head unit
#[derive(Parser)]
#[command(name = "driver-profiles", version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding profile records (overrides config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error (LOG_LEVEL wins if set)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Periodic autosave interval in seconds (overrides config)
    #[arg(long, global = true)]
    interval: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the head unit host until SIGINT/SIGTERM
    Run {
        /// Profile to activate (defaults to the last used one, then driver1)
        #[arg(short, long)]
        profile: Option<ProfileId>,
    },
    /// List profiles and whether they are stored
    List,
    /// Print a profile as JSON
    Show { id: ProfileId },
}

/// Level from `LOG_LEVEL`, then the `--log-level` flag
fn requested_log_level(cli_level: Option<&str>) -> Option<Level> {
    std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|value| parse_log_level(&value))
        .or_else(|| cli_level.and_then(parse_log_level))
}

/// Load the config with a provisional subscriber installed so problems with
/// the file are reported before the configured level is known
fn load_config<S>(path: &Path, provisional: S) -> AppConfig
where
    S: tracing::Subscriber + Send + Sync + 'static,
{
    tracing::subscriber::with_default(provisional, || AppConfig::load(path))
}

fn init_logging(requested: Option<Level>, config: &AppConfig) -> Result<()> {
    let log_level = requested
        .or_else(|| parse_log_level(&config.log_level))
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let requested_level = requested_log_level(cli.log_level.as_deref());
    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let provisional = FmtSubscriber::builder()
        .with_max_level(requested_level.unwrap_or(Level::INFO))
        .finish();
    let mut config = load_config(&config_path, provisional);
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = Some(dir);
    }
    if let Some(secs) = cli.interval {
        config.autosave_interval_secs = secs;
    }

    init_logging(requested_level, &config)?;
    config.validate_and_clamp();
    info!(path = %config_path.display(), "Loaded config");

    let store = config.store();
    info!(data_dir = %store.root().display(), "Using profile store");
    let repo = ProfileRepository::new(Arc::new(store));

    match cli.command {
        Command::Run { profile } => run(&config, repo, profile),
        Command::List => {
            for summary in repo.list() {
                let marker = if summary.persisted { "stored" } else { "default" };
                println!("{:<8} {:<24} {marker}", summary.id, summary.name);
            }
            Ok(())
        }
        Command::Show { id } => {
            let profile = repo.load(id);
            let json = serde_json::to_string_pretty(&profile)
                .with_context(|| format!("Failed to serialize profile '{id}'"))?;
            println!("{json}");
            Ok(())
        }
    }
}

fn run(config: &AppConfig, repo: ProfileRepository, requested: Option<ProfileId>) -> Result<()> {
    let (handle, rx) = AutosaveHandle::channel();

    let session = ActiveSession::new(repo);
    let id = requested.or_else(|| session.current()).unwrap_or(ProfileId::Driver1);

    let shell = HeadUnitShell::new(handle.clone());
    let mut sync = Synchronizer::new(session);
    sync.attach_shell(Box::new(shell.clone()));
    sync.register(Box::new(ClimatePanel::new(handle.clone())));
    sync.register(Box::new(MediaPanel::new(handle.clone())));
    sync.register(Box::new(SettingsPanel::new(handle.clone())));
    sync.register(Box::new(NavigationPanel::new(handle.clone())));
    sync.register(Box::new(LapTimer::new(handle.clone())));
    sync.activate(id);

    let last_screen = sync.session().profile(id).last_state.last_screen;
    shell.show(last_screen);

    #[cfg(unix)]
    spawn_signal_listener(handle.clone())?;
    #[cfg(not(unix))]
    warn!("Signal handling unavailable on this platform, no final save on exit");

    let sync = Arc::new(Mutex::new(sync));
    let autosave = Autosave::new(config.autosave_policy(), sync, rx);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to build tokio runtime")?;

    info!(profile = %id, "Head unit running");
    let outcome = runtime.block_on(autosave.run());
    match outcome {
        Some(outcome) => info!(?outcome, "Shut down"),
        None => warn!("Shut down without a final save"),
    }

    drop(handle);
    Ok(())
}

#[cfg(unix)]
fn spawn_signal_listener(handle: AutosaveHandle) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("Failed to register signal handlers")?;
    std::thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            if let Some(signal) = signals.forever().next() {
                info!(signal, "Received shutdown signal");
                handle.shutdown();
            }
        })
        .context("Failed to spawn signal listener")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// Collects formatted log output
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn capturing_subscriber(captured: &Captured) -> impl tracing::Subscriber + Send + Sync + 'static {
        let writer = captured.clone();
        FmtSubscriber::builder()
            .with_max_level(Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish()
    }

    #[test]
    fn test_generated_config_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let captured = Captured::default();

        let config = load_config(&path, capturing_subscriber(&captured));
        assert_eq!(config, AppConfig::default());
        assert!(captured.text().contains("Generated config file"));
    }

    #[test]
    fn test_broken_config_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ nope").unwrap();
        let captured = Captured::default();

        load_config(&path, capturing_subscriber(&captured));
        assert!(captured.text().contains("Failed to parse config file"));
    }
}
