//! # wksp-retrain
//!
//! Triggers retraining of Watson Assistant workspaces by rewriting the
//! description of one intent (or entity) per workspace.
//!
//! Provides the rate-limited retraining sweep, the assistant collaborator
//! interface with a REST implementation, and OpenTelemetry observability.

pub mod assistant;
pub mod config;
pub mod error;
pub mod model;
pub mod sweep;
pub mod telemetry;
