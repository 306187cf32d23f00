//! A framework for pluggable, scrape-driven metric collectors

pub mod agent;
pub mod collector;
pub mod collectors;
pub mod config;
pub mod context;
pub mod error;
pub mod exposition;
pub mod metric;
pub mod process;
pub mod registry;
pub mod source;
pub mod util;

/// Re-export of commonly used types for convenience
pub mod prelude {
    pub use crate::agent::{Agent, CollectorOutcome, ScrapeReport};
    pub use crate::collector::{Collector, CommandCollector, Emitter, FieldSpec, QueryCollector, QueryRow};
    pub use crate::collectors::CollectorKind;
    pub use crate::config::{ConfigBuilder, ExporterConfig, LogLevel};
    pub use crate::context::ScrapeContext;
    pub use crate::error::{CollectError, ExporterError, Result};
    pub use crate::metric::{MetricDescriptor, Sample, ValueKind};
    pub use crate::registry::{BuildContext, CollectorRegistry, RegistryError};
    pub use crate::source::{QueryError, QuerySource};
}

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
