use std::io;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Result type for process operations
pub type ProcessResult<T> = std::result::Result<T, ProcessError>;

/// Errors that can occur while running a command for a scrape
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to spawn process: {0}")]
    Spawn(#[from] io::Error),

    #[error("Process timed out after {0:?}")]
    Timeout(Duration),

    #[error("Process cancelled with the scrape")]
    Cancelled,

    /// The command ran but exited abnormally; `output` holds whatever it
    /// printed, for diagnostics only
    #[error("Process exited with {status}")]
    NonZeroExit { status: ExitStatus, output: String },

    #[error("Failed to read from process: {0}")]
    Read(io::Error),

    #[error("Process output parse error: {0}")]
    Parse(String),
}

impl ProcessError {
    /// Captured output of a failed command, if any
    pub fn output(&self) -> Option<&str> {
        match self {
            ProcessError::NonZeroExit { output, .. } if !output.is_empty() => Some(output),
            _ => None,
        }
    }
}
