//! Structured tabular data sources
//!
//! A query source answers "give me every row of class X" with one JSON
//! object per monitored entity. Collectors decode those objects into typed
//! rows.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use log::{debug, trace};
use serde_json::Value;
use thiserror::Error;

use crate::context::ScrapeContext;
use crate::process::{run_bounded, Command, ProcessError};

/// Errors raised while querying a structured source
#[derive(Error, Debug)]
pub enum QueryError {
    /// The backing service could not be reached or refused the query
    #[error("Query source unavailable: {0}")]
    Unavailable(String),

    /// The rows did not match the expected schema
    #[error("Schema mismatch for {class}: {source}")]
    Schema {
        class: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    #[error("Query cancelled with the scrape")]
    Cancelled,
}

/// Trait for sources that answer structured row queries
#[async_trait::async_trait]
pub trait QuerySource: Send + Sync + 'static {
    /// Return every row of `class`, in source order
    async fn query(&self, ctx: &ScrapeContext, class: &str) -> Result<Vec<Value>, QueryError>;

    /// Get the source name
    fn name(&self) -> &str;
}

/// In-memory rows keyed by class.
///
/// Classes that were never loaded are reported as unavailable.
#[derive(Debug, Default)]
pub struct StaticQuerySource {
    rows: RwLock<HashMap<String, Vec<Value>>>,
}

impl StaticQuerySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the rows returned for `class`
    pub fn set_rows(&self, class: impl Into<String>, rows: Vec<Value>) {
        // poisoned map is still consistent: inserts are single operations
        let mut table = self.rows.write().unwrap_or_else(|e| e.into_inner());
        table.insert(class.into(), rows);
    }

    /// Builder-style variant of [`set_rows`](Self::set_rows)
    pub fn with_rows(self, class: impl Into<String>, rows: Vec<Value>) -> Self {
        self.set_rows(class, rows);
        self
    }
}

#[async_trait::async_trait]
impl QuerySource for StaticQuerySource {
    async fn query(&self, ctx: &ScrapeContext, class: &str) -> Result<Vec<Value>, QueryError> {
        if ctx.is_cancelled() {
            return Err(QueryError::Cancelled);
        }

        let table = self.rows.read().unwrap_or_else(|e| e.into_inner());
        table
            .get(class)
            .cloned()
            .ok_or_else(|| QueryError::Unavailable(format!("no rows loaded for class {}", class)))
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Queries CIM classes through PowerShell's `Get-CimInstance`.
///
/// Each query runs one bounded PowerShell process whose JSON output is
/// returned as rows.
#[derive(Debug, Clone)]
pub struct CimQuerySource {
    program: String,
    timeout: Duration,
}

impl CimQuerySource {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    fn command(&self, class: &str) -> Command {
        let script = format!(
            "Get-CimInstance -ClassName {} | Select-Object -Property * -ExcludeProperty Cim* | ConvertTo-Json -Compress",
            class
        );
        Command::new(&self.program)
            .args(["-NoProfile", "-NonInteractive", "-Command"])
            .arg(script)
    }
}

#[async_trait::async_trait]
impl QuerySource for CimQuerySource {
    async fn query(&self, ctx: &ScrapeContext, class: &str) -> Result<Vec<Value>, QueryError> {
        debug!("Querying {} via {}", class, self.program);

        let output = run_bounded(ctx, &self.command(class), self.timeout)
            .await
            .map_err(|e| match e {
                ProcessError::Timeout(after) => QueryError::Timeout(after),
                ProcessError::Cancelled => QueryError::Cancelled,
                other => QueryError::Unavailable(other.to_string()),
            })?;

        trace!("{} returned {} bytes", class, output.len());
        parse_rows(class, &output)
    }

    fn name(&self) -> &str {
        "cim"
    }
}

/// Decode `ConvertTo-Json` output into rows.
///
/// PowerShell emits nothing for an empty result set and a bare object rather
/// than a one-element array for a single row.
pub fn parse_rows(class: &str, output: &str) -> Result<Vec<Value>, QueryError> {
    let output = output.trim();
    if output.is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(output).map_err(|source| QueryError::Schema {
        class: class.to_string(),
        source,
    })?;

    match value {
        Value::Array(rows) => Ok(rows),
        Value::Null => Ok(Vec::new()),
        row => Ok(vec![row]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_static_source_returns_rows() {
        let source = StaticQuerySource::new().with_rows("Widget", vec![json!({"Name": "a"})]);
        let ctx = ScrapeContext::unbounded();

        let rows = source.query(&ctx, "Widget").await.unwrap();
        assert_eq!(rows, vec![json!({"Name": "a"})]);

        let err = source.query(&ctx, "Gadget").await.unwrap_err();
        assert!(matches!(err, QueryError::Unavailable(_)));
    }

    #[test]
    fn test_parse_rows_shapes() {
        assert!(parse_rows("X", "").unwrap().is_empty());
        assert_eq!(parse_rows("X", r#"{"Name":"a"}"#).unwrap().len(), 1);
        assert_eq!(parse_rows("X", r#"[{"Name":"a"},{"Name":"b"}]"#).unwrap().len(), 2);
        assert!(matches!(
            parse_rows("X", "not json"),
            Err(QueryError::Schema { .. })
        ));
    }

    #[test]
    fn test_cim_command_line() {
        let source = CimQuerySource::new("powershell", Duration::from_secs(5));
        let cmd = source.command("Win32_Foo");
        assert_eq!(cmd.program(), "powershell");
        assert!(cmd.get_args()[3].starts_with("Get-CimInstance -ClassName Win32_Foo"));
    }
}
