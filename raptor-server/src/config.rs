//! Command-line configuration.
//!
//! Every flag can also be set through the environment, so the same binary
//! runs unchanged from a shell or a container.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::cache::CacheConfig;
use crate::planner::SearchConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Round-based public transit journey planner", long_about = None)]
pub struct Cli {
    /// Log filter, e.g. `info` or `raptor_server=debug`. Falls back to
    /// `RUST_LOG`, then `info`.
    #[arg(long, global = true, env = "RAPTOR_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve journey queries over HTTP
    Serve(ServerConfig),
    /// Precompute transfer patterns for every stop
    Patterns(PrecomputeConfig),
}

/// Options shared by every command that plans over a schedule.
#[derive(Args, Debug, Clone)]
pub struct PlannerArgs {
    /// Schedule document to load
    #[arg(long, env = "RAPTOR_SCHEDULE")]
    pub schedule: PathBuf,

    /// Journeys with more legs than this are dropped
    #[arg(long, default_value_t = 4)]
    pub max_legs: usize,

    /// Let every range pass improve arrivals beyond the destination's
    #[arg(long)]
    pub no_destination_pruning: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ServerConfig {
    #[command(flatten)]
    pub planner: PlannerArgs,

    /// Address to serve queries on
    #[arg(long, env = "RAPTOR_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Separate address for the health check, if any
    #[arg(long, env = "RAPTOR_HEALTH_BIND")]
    pub health_bind: Option<SocketAddr>,

    /// Use every trip regardless of its calendar
    #[arg(long)]
    pub no_calendar_filter: bool,

    /// Seconds a cached result stays valid
    #[arg(long, default_value_t = 3600)]
    pub cache_ttl_secs: u64,

    /// Cached results kept per result shape
    #[arg(long, default_value_t = 10_000)]
    pub cache_capacity: u64,
}

impl ServerConfig {
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig::new(
            self.planner.max_legs,
            !self.planner.no_destination_pruning,
            !self.no_calendar_filter,
        )
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            ttl: Duration::from_secs(self.cache_ttl_secs),
            max_capacity: self.cache_capacity,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct PrecomputeConfig {
    #[command(flatten)]
    pub planner: PlannerArgs,

    /// Service date to precompute, defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Worker threads, defaults to one fewer than the available cores
    #[arg(long)]
    pub workers: Option<usize>,

    /// Directory to write one JSON file per origin into
    #[arg(long, default_value = "patterns")]
    pub output: PathBuf,

    /// Only use trips running on the date
    #[arg(long)]
    pub filter_calendars: bool,
}

impl PrecomputeConfig {
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(default_workers).max(1)
    }
}

/// One fewer than the available parallelism, leaving a core for the
/// dispatcher, and never zero.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map_or(1, |n| n.get().saturating_sub(1))
        .max(1)
}
