//! Application startup
//!
//! Parses arguments, loads configuration, initialises logging, runs one scan
//! through the orchestrator while a progress line follows its events, and
//! maps the outcome to the process exit code.

use std::sync::Arc;
use thiserror::Error;

use super::cli::args::Args;
use super::cli::config::{load_config_file, AppConfig};
use super::cli::error::ConfigError;
use super::progress::{should_show_progress, watch_scan, ProgressError, ProgressLine, ScanOutcome};
use super::summary::{print_summary, render_json};
use crate::core::error_handling::{describe_for_user, log_error_with_context, ContextualError};
use crate::core::logging::init_logging;
use crate::core::shutdown::{ShutdownCoordinator, INTERRUPTED_EXIT_CODE};
use crate::core::styles::colors_enabled;
use crate::core::version::long_version;
use crate::notifications::api::{
    Event, EventFilter, EventSink, NotificationError, NotificationManager, SystemEvent,
    SystemEventType,
};
use crate::scanner::api::{ScanError, ScanOrchestrator};
use crate::storage::api::{JsonDirStore, MemoryStore, ScanStore, StorageError};

pub const SUCCESS_EXIT_CODE: i32 = 0;
pub const FATAL_EXIT_CODE: i32 = 1;

const PROGRESS_SUBSCRIBER: &str = "cli-progress";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to initialise logging: {0}")]
    Logging(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Notification(#[from] NotificationError),

    #[error(transparent)]
    Progress(#[from] ProgressError),

    #[error("could not render result as JSON: {0}")]
    Render(#[from] serde_json::Error),
}

impl ContextualError for StartupError {
    fn is_user_actionable(&self) -> bool {
        match self {
            StartupError::Config(e) => e.is_user_actionable(),
            StartupError::Storage(e) => e.is_user_actionable(),
            StartupError::Scan(e) => e.is_user_actionable(),
            _ => false,
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            StartupError::Config(e) => e.user_message(),
            StartupError::Storage(e) => e.user_message(),
            StartupError::Scan(e) => e.user_message(),
            _ => None,
        }
    }
}

/// Entry point used by `main`; returns the process exit code
pub async fn startup() -> i32 {
    let args = Args::parse_styled(colors_enabled(None));
    run(args).await
}

pub async fn run(args: Args) -> i32 {
    let config = match resolve_config(&args).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", describe_for_user(&e, "Loading configuration"));
            return FATAL_EXIT_CODE;
        }
    };
    let colors = colors_enabled(config.color);

    let log_file = config
        .log_file
        .as_ref()
        .map(|path| path.to_string_lossy().into_owned());
    if let Err(e) = init_logging(
        config.log_level.as_deref(),
        config.log_format.as_deref(),
        log_file.as_deref(),
        colors,
    ) {
        eprintln!("Error: {}", StartupError::Logging(e.to_string()));
        return FATAL_EXIT_CODE;
    }
    log::info!("watchdog {} starting", long_version());

    let shutdown = ShutdownCoordinator::new();
    shutdown.install_signal_handlers();

    let show_progress = should_show_progress();
    match execute_scan(&config, &shutdown, show_progress).await {
        Ok(ScanOutcome::Completed(result)) => {
            if config.json {
                match render_json(&result) {
                    Ok(json) => println!("{}", json),
                    Err(e) => return report_fatal(&StartupError::from(e)),
                }
            } else {
                print_summary(&result, colors);
            }
            SUCCESS_EXIT_CODE
        }
        Ok(ScanOutcome::Cancelled(progress)) => {
            match progress {
                Some(p) => eprintln!(
                    "Scan cancelled at {:.0}% ({})",
                    p.percentage, p.current_stage
                ),
                None => eprintln!("Scan cancelled"),
            }
            INTERRUPTED_EXIT_CODE
        }
        Err(e) => report_fatal(&e),
    }
}

fn report_fatal(error: &StartupError) -> i32 {
    log_error_with_context(error, "Scan failed");
    eprintln!("Error: {}", describe_for_user(error, "Scan failed"));
    FATAL_EXIT_CODE
}

async fn resolve_config(args: &Args) -> Result<AppConfig, ConfigError> {
    let file = load_config_file(args.config_file.as_deref()).await?;
    AppConfig::resolve(args, file.as_ref())
}

pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn ScanStore>, StorageError> {
    Ok(match &config.output_dir {
        Some(dir) => {
            let store = JsonDirStore::open(dir).await?;
            log::info!("Results are written to {}", store.dir().display());
            Arc::new(store)
        }
        None => Arc::new(MemoryStore::new()),
    })
}

/// Run one scan to its end. A completed outcome carries the result as read
/// back from the store, falling back to the one the completion event carried.
pub async fn execute_scan(
    config: &AppConfig,
    shutdown: &ShutdownCoordinator,
    show_progress: bool,
) -> Result<ScanOutcome, StartupError> {
    let store = open_store(config).await?;
    let notifications = Arc::new(NotificationManager::new());
    let events = notifications.subscribe(
        PROGRESS_SUBSCRIBER.to_string(),
        EventFilter::ScanOnly,
        "startup".to_string(),
    )?;
    notify_system(&notifications, SystemEventType::Startup, long_version());

    let orchestrator = ScanOrchestrator::builder()
        .store(Arc::clone(&store))
        .event_sink(Arc::clone(&notifications) as Arc<dyn EventSink>)
        .root_token(shutdown.token())
        .build();

    let scan_id = orchestrator.try_start_scan(&config.url, &config.scan)?;
    let outcome = watch_scan(events, &scan_id, ProgressLine::new(show_progress)).await;

    notify_system(&notifications, SystemEventType::Shutdown, scan_id.clone());
    notifications.unsubscribe(PROGRESS_SUBSCRIBER);

    match outcome? {
        ScanOutcome::Completed(from_event) => {
            let stored = match store.load_result(&scan_id).await {
                Ok(Some(result)) => Arc::new(result),
                Ok(None) => from_event,
                Err(e) => {
                    log::warn!("Could not read back result for {}: {}", scan_id, e);
                    from_event
                }
            };
            Ok(ScanOutcome::Completed(stored))
        }
        cancelled => Ok(cancelled),
    }
}

fn notify_system(notifications: &NotificationManager, event_type: SystemEventType, message: String) {
    if let Err(e) = notifications.emit(Event::System(SystemEvent::with_message(event_type, message))) {
        log::debug!("System event dropped: {}", e);
    }
}
