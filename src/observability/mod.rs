//! Observability: dispatch metrics, tracing spans, and logging setup.
//!
//! Enable the `logging` feature to install a stderr subscriber from
//! [`LoggingSettings`]:
//!
//! ```toml
//! cql-gate = { version = "0.1", features = ["logging"] }
//! ```

mod logging;
mod metrics;
mod spans;

#[cfg(feature = "logging")]
pub use logging::init_tracing;
pub use logging::{DEFAULT_LOG_LEVEL, LoggingSettings};
pub use metrics::{Counter, Histogram, MetricsRegistry, MetricsSummary};
pub use spans::DispatchSpan;
