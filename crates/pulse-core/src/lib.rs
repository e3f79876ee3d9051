//! Shared plumbing for Voter Pulse services: configuration loading, tracing
//! setup, JSON error bodies, health checks and request-id middleware.

pub mod config;
pub mod error;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
