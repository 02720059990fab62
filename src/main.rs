use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use app_versioning::analytics::TracingAnalytics;
use app_versioning::config::{self, VersioningConfig};
use app_versioning::engine::{PlatformServices, VersionManager, VersionManagerDeps};
use app_versioning::logging::init_logging;
use app_versioning::source::command::LaunchTarget;
use app_versioning::source::detector::{StaticPackageInspector, UpdateSourceResolver};
use app_versioning::source::factory::UpdateCommandBuilder;
use app_versioning::version::cache::{Preferences, SqliteStore};
use app_versioning::version::debug_state::DebugState;
use app_versioning::version::network::WatchNetworkMonitor;
use app_versioning::version::registries::HttpVersionService;
use app_versioning::version::settings::SettingsHolder;
use app_versioning::version::staleness::NoStoreProbe;
use app_versioning::version::types::UpdateStatus;

#[derive(Parser)]
#[command(name = "app-versioning")]
#[command(version, about = "Version compatibility checks and update dispatch")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the compatibility check and print the resulting status
    Check {
        #[arg(long)]
        config: PathBuf,
        /// Preferences database, defaults to the data directory
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Print the update actions for the configured application
    Sources {
        #[arg(long)]
        config: PathBuf,
        /// Package installed on the device, repeatable
        #[arg(long = "installed")]
        installed: Vec<String>,
        /// Package that installed the application
        #[arg(long)]
        installer: Option<String>,
    },
    /// Inspect or edit the persisted debug override
    Debug {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        db: Option<PathBuf>,
        #[command(subcommand)]
        action: DebugAction,
    },
}

#[derive(Subcommand)]
enum DebugAction {
    Show,
    SetVersion {
        version: String,
    },
    SetStatus {
        #[arg(value_parser = parse_status)]
        status: UpdateStatus,
    },
    Clear,
}

fn parse_status(value: &str) -> Result<UpdateStatus, String> {
    value
        .parse()
        .map_err(|_| format!("unknown status {value:?}, expected empty|recommended|mandatory"))
}

fn load_config(path: &Path) -> anyhow::Result<VersioningConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config {}", path.display()))
}

fn open_store(db: Option<PathBuf>) -> anyhow::Result<Arc<SqliteStore>> {
    let db_path = db.unwrap_or_else(config::db_path);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(Arc::new(SqliteStore::open(&db_path)?))
}

async fn run_check(config: VersioningConfig, db: Option<PathBuf>) -> anyhow::Result<()> {
    let service = HttpVersionService::new(&config.service)?;
    let deps = VersionManagerDeps::assemble(
        config,
        open_store(db)?,
        PlatformServices {
            service: Arc::new(service),
            network: Arc::new(WatchNetworkMonitor::new(true)),
            probe: Arc::new(NoStoreProbe),
            inspector: Arc::new(StaticPackageInspector::default()),
            analytics: Arc::new(TracingAnalytics),
        },
    );
    let manager = VersionManager::new(deps);

    manager.init();
    manager.settle().await;

    let remote = manager.settings().remote();
    println!("status: {}", manager.status());
    println!(
        "critical: {}",
        remote.critical.as_ref().map_or("-", |v| v.as_str())
    );
    println!(
        "recommended: {}",
        remote.recommended.as_ref().map_or("-", |v| v.as_str())
    );
    manager.shutdown();
    Ok(())
}

fn run_sources(config: VersioningConfig, installed: Vec<String>, installer: Option<String>) {
    let settings = Arc::new(SettingsHolder::new(config));
    let resolver = UpdateSourceResolver::new(
        Arc::new(StaticPackageInspector::new(installed, installer)),
        settings.update_sources().to_vec(),
    );
    let (command, has_google_play) = UpdateCommandBuilder::new(settings, resolver).create();

    for action in command.actions() {
        match &action.target {
            LaunchTarget::Store { package, uri } => {
                println!("{}\t{}\t{}", action.source, package, uri)
            }
            LaunchTarget::WebPage { url, embedded } => {
                println!("{}\t{}\tembedded={}", action.source, url, embedded)
            }
            LaunchTarget::InstalledApp { package, .. } => {
                println!("{}\t{}", action.source, package)
            }
        }
    }
    println!("google play available: {}", has_google_play);
}

fn run_debug(
    config: VersioningConfig,
    db: Option<PathBuf>,
    action: DebugAction,
) -> anyhow::Result<()> {
    let settings = Arc::new(SettingsHolder::new(config));
    let debug_state = DebugState::new(Preferences::new(open_store(db)?), settings.clone());

    match action {
        DebugAction::Show => {}
        DebugAction::SetVersion { version } => debug_state.set_debug_version(&version),
        DebugAction::SetStatus { status } => debug_state.set_update_debug_status(status),
        DebugAction::Clear => debug_state.clear(),
    }

    println!("real version: {}", settings.app_version());
    println!("debug version: {}", debug_state.peek_debug_version());
    println!("debug status: {}", debug_state.update_debug_status());
    println!("debug mode: {}", debug_state.is_mode_on());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Check { config, db } => {
            let config = load_config(&config)?;
            let _guard = init_logging(&config::log_path(), config.log_format)?;
            tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?
                .block_on(run_check(config, db))
        }
        Command::Sources {
            config,
            installed,
            installer,
        } => {
            run_sources(load_config(&config)?, installed, installer);
            Ok(())
        }
        Command::Debug { config, db, action } => run_debug(load_config(&config)?, db, action),
    }
}
