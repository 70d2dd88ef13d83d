//! Caseflow Events - Failure Reporting and Telemetry
//!
//! - `ErrorReporter`: singleton broadcast of structured write failures
//! - `telemetry`: tracing subscriber setup shared by every binary and test

mod reporter;
pub mod telemetry;

pub use reporter::{ErrorReporter, ErrorSubscription, DEFAULT_CAPACITY};
pub use telemetry::{init_tracing, LogFormat, TelemetryConfig};
