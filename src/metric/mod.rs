//! Metric descriptors and samples
//!
//! A descriptor is built once when a collector is constructed and shared for
//! the lifetime of the process. Samples are created per scrape and consumed
//! by the exposition layer.

mod descriptor;
mod sample;

pub use descriptor::{build_fq_name, MetricDescriptor, ValueKind};
pub use sample::Sample;
