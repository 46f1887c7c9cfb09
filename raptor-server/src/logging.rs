//! Tracing subscriber setup.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: LevelFilter = LevelFilter::INFO;

/// The filter directive to use: `level` if given, else `RUST_LOG`, else
/// `info`.
pub fn filter_directive(level: Option<&str>) -> String {
    level
        .map(str::to_string)
        .or_else(|| std::env::var(EnvFilter::DEFAULT_ENV).ok())
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string())
}

/// Install a global fmt subscriber. An unparsable directive falls back to
/// `info`.
pub fn init(level: Option<&str>) {
    let directive = filter_directive(level);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|err| {
        eprintln!("invalid log filter {directive:?}, falling back to '{DEFAULT_LEVEL}': {err}");
        EnvFilter::new(DEFAULT_LEVEL.to_string())
    });

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
