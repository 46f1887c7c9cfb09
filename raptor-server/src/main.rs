use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};

use raptor_server::cache::JourneyCache;
use raptor_server::config::{Cli, Command, PrecomputeConfig, ServerConfig};
use raptor_server::logging;
use raptor_server::patterns::{JsonDirectoryRepository, PatternError, all_origins, precompute};
use raptor_server::planner::{CalendarFilter, ScheduleIndex};
use raptor_server::schedule::{ScheduleData, ScheduleError};
use raptor_server::web::{AppState, create_router, health_router};

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Patterns(#[from] PatternError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref());

    let result = match cli.command {
        Command::Serve(config) => serve(config).await,
        Command::Patterns(config) => patterns(config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "exiting");
            ExitCode::FAILURE
        }
    }
}

async fn load_index(path: PathBuf) -> Result<ScheduleIndex, RunError> {
    info!(path = %path.display(), "loading schedule");
    let index = tokio::task::spawn_blocking(move || ScheduleData::load(&path)?.into_index()).await??;
    Ok(index)
}

async fn serve(config: ServerConfig) -> Result<(), RunError> {
    let index = load_index(config.planner.schedule.clone()).await?;
    let cache = JourneyCache::new(&config.cache_config());
    let state = AppState::new(index, config.search_config(), cache);

    if let Some(addr) = config.health_bind {
        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "health check listening");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, health_router()).await {
                error!(error = %e, "health check server stopped");
            }
        });
    }

    let listener = TcpListener::bind(config.bind).await?;
    info!(addr = %config.bind, "journey planner listening");
    info!("endpoints: GET / (range summary), GET /detail (range detail), GET /first-arrival, GET /health");

    axum::serve(listener, create_router(state)).await?;
    Ok(())
}

async fn patterns(config: PrecomputeConfig) -> Result<(), RunError> {
    let index = load_index(config.planner.schedule.clone()).await?;
    let date = config.date.unwrap_or_else(|| Local::now().date_naive());
    let workers = config.worker_count();
    let filter = CalendarFilter::from_enabled(config.filter_calendars);
    let repository = JsonDirectoryRepository::new(&config.output);

    let summary = tokio::task::spawn_blocking(move || {
        precompute(&index, date, filter, all_origins(&index), workers, &repository)
    })
    .await??;

    info!(
        origins = summary.origins,
        workers = summary.workers,
        output = %config.output.display(),
        "precompute complete"
    );
    Ok(())
}
