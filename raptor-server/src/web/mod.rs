//! Web layer for the journey planner.
//!
//! Provides HTTP endpoints for time-range and first-arrival queries, plus a
//! health check that can be served on its own address.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router, health_router};
pub use state::AppState;
