//! Observability Module
//!
//! - `events`: structured registration lifecycle events with consistent fields
//! - `tracing`: subscriber setup (text or JSON) with `RUST_LOG` filtering

pub mod events;
pub mod tracing;

pub use self::tracing::{init_tracing, LogFormat, TracingConfig};
