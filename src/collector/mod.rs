mod command;
mod core;
mod query;

// Re-export public items
pub use command::CommandCollector;
pub use core::{Collector, Emitter};
pub use query::{FieldSpec, QueryCollector, QueryRow, AGGREGATE_ROW};
