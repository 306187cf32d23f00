//! Bounded execution of external commands
//!
//! Collectors that source their data from command-line tools run the command
//! once per scrape under a hard deadline, capture its output and derive a
//! fixed set of values from the text.

mod command;
mod error;
pub mod parsers;

pub use command::{run_bounded, Command, ProcessHandle};
pub use error::{ProcessError, ProcessResult};

/// Derives numeric facts from the captured output of a command
pub trait OutputExtractor: Send + Sync + 'static {
    /// Extract one value per declared fact, in declaration order
    fn extract(&self, output: &str) -> ProcessResult<Vec<f64>>;
}

impl<F> OutputExtractor for F
where
    F: Fn(&str) -> ProcessResult<Vec<f64>> + Send + Sync + 'static,
{
    fn extract(&self, output: &str) -> ProcessResult<Vec<f64>> {
        self(output)
    }
}
