//! Simple Timers - countdown timers and alarms with escalating warnings
//!
//! This is the main entry point for the terminal application.

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use simple_timers::{
    clock::SystemClock,
    config::Config,
    console::{console_task, render_task},
    persistence::FileStore,
    sound::TerminalSound,
    state::AppState,
    tasks::tick_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Logs go to stderr; stdout belongs to the timer display
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("simple_timers={}", config.log_level())));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting simple-timers v{}", env!("CARGO_PKG_VERSION"));
    let storage_path = config.storage_path();
    info!(
        "Configuration: storage={}, namespace={}",
        storage_path.display(),
        config.namespace
    );

    let store = Arc::new(FileStore::open(&storage_path));

    // Create application state
    let state = Arc::new(AppState::new(
        Arc::new(SystemClock),
        store,
        &config.namespace,
        Arc::new(TerminalSound::new()),
    ));

    // Render task snapshots the store on start, so restored timers show up either way
    let render_state = Arc::clone(&state);
    tokio::spawn(async move {
        render_task(render_state).await;
    });

    let restored = state.rehydrate()?;
    if restored > 0 {
        info!("Restored {} timers", restored);
    }

    if let Some(minutes) = config.min_before {
        state.set_default_min_before(minutes)?;
    }
    if config.mute {
        state.set_sound_enabled(false)?;
    }
    if let Some(path) = &config.buzzer {
        match state.install_buzzer(path) {
            Ok(buzzer) => info!("Installed buzzer '{}'", buzzer.name),
            Err(e) => warn!("Could not use {} as buzzer: {}", path.display(), e),
        }
    }

    // Start the tick background task
    let tick_state = Arc::clone(&state);
    tokio::spawn(async move {
        tick_task(tick_state).await;
    });

    let console = console_task(Arc::clone(&state));

    tokio::select! {
        _ = console => {
            info!("Input closed");
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.sound().stop_loop();
    if let Err(e) = state.save() {
        error!("Failed to save timers on exit: {}", e);
    }

    info!("Shutdown complete");
    Ok(())
}
