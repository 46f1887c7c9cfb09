//! Round-based public transit journey planner.
//!
//! A service that answers: "leaving here at this time, or any time in this
//! window, how do I get there, and what is the fastest way with each number
//! of changes?" It can also precompute, for every stop, the distinct
//! sequences of changes its journeys use over a whole day.

pub mod cache;
pub mod config;
pub mod domain;
pub mod logging;
pub mod patterns;
pub mod planner;
pub mod schedule;
pub mod web;
