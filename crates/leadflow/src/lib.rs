//! Lead lifecycle and notification pipeline.
//!
//! Turns raw form submissions into durable, scored, routed, auditable
//! sales records and drives downstream notification delivery, while
//! tolerating concurrent mutation from multiple operators through a
//! role-scoped console API.

pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod leads;
pub mod notifications;
pub mod telemetry;
