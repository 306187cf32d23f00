//! Collectors backed by the output of an external command
use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace};

use super::core::{Collector, Emitter};
use crate::context::ScrapeContext;
use crate::error::CollectError;
use crate::metric::{MetricDescriptor, Sample};
use crate::process::{run_bounded, Command, OutputExtractor, ProcessError};

/// Runs a command once per scrape and derives unlabeled facts from its
/// output.
///
/// The command is bounded by the collector's own timeout and by the scrape
/// deadline. Nothing is emitted unless the command exits cleanly and the
/// extractor accepts its output.
pub struct CommandCollector<X> {
    name: String,
    command: Command,
    timeout: Duration,
    descriptors: Vec<Arc<MetricDescriptor>>,
    extractor: X,
}

impl<X: OutputExtractor> CommandCollector<X> {
    /// `facts` must be unlabeled and listed in the order the extractor
    /// returns its values.
    pub fn new(
        name: impl Into<String>,
        command: Command,
        timeout: Duration,
        facts: Vec<MetricDescriptor>,
        extractor: X,
    ) -> Self {
        Self {
            name: name.into(),
            command,
            timeout,
            descriptors: facts.into_iter().map(Arc::new).collect(),
            extractor,
        }
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait::async_trait]
impl<X: OutputExtractor> Collector for CommandCollector<X> {
    fn name(&self) -> &str {
        &self.name
    }

    fn descriptors(&self) -> &[Arc<MetricDescriptor>] {
        &self.descriptors
    }

    async fn collect(&self, ctx: &ScrapeContext, out: &Emitter) -> Result<(), CollectError> {
        debug!("[{}] running {}", self.name, self.command);

        let output = run_bounded(ctx, &self.command, self.timeout)
            .await
            .map_err(|e| match e {
                ProcessError::Cancelled => CollectError::Cancelled,
                ProcessError::Timeout(_) if ctx.expired() => CollectError::DeadlineExceeded,
                other => CollectError::Process(other),
            })?;

        let values = self.extractor.extract(&output)?;
        assert_eq!(
            values.len(),
            self.descriptors.len(),
            "collector {} extracted {} values for {} facts",
            self.name,
            values.len(),
            self.descriptors.len()
        );
        trace!("[{}] extracted {:?}", self.name, values);

        for (descriptor, value) in self.descriptors.iter().zip(values) {
            out.emit(Sample::unlabeled(descriptor, value))?;
        }

        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::metric::ValueKind;
    use crate::process::ProcessResult;

    fn lines_fact() -> Vec<MetricDescriptor> {
        vec![MetricDescriptor::new(
            "test",
            "cmd",
            "lines",
            "Lines printed",
            Vec::<String>::new(),
            ValueKind::Gauge,
        )]
    }

    fn count_lines(output: &str) -> ProcessResult<Vec<f64>> {
        Ok(vec![output.lines().count() as f64])
    }

    fn sh(script: &str) -> Command {
        Command::new("sh").arg("-c").arg(script)
    }

    async fn run<X: OutputExtractor>(
        collector: &CommandCollector<X>,
        ctx: &ScrapeContext,
    ) -> (Result<(), CollectError>, Vec<Sample>) {
        let (out, mut rx) = Emitter::channel(collector);
        let result = collector.collect(ctx, &out).await;
        drop(out);

        let mut samples = Vec::new();
        while let Some(sample) = rx.recv().await {
            samples.push(sample);
        }
        (result, samples)
    }

    #[tokio::test]
    async fn test_success_emits_facts() {
        let collector = CommandCollector::new(
            "lines",
            sh("printf 'a\\nb\\n'"),
            Duration::from_secs(5),
            lines_fact(),
            count_lines,
        );

        let (result, samples) = run(&collector, &ScrapeContext::unbounded()).await;
        result.unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value(), 2.0);
    }

    #[tokio::test]
    async fn test_timeout_emits_nothing() {
        let collector = CommandCollector::new(
            "hang",
            sh("sleep 10"),
            Duration::from_millis(100),
            lines_fact(),
            count_lines,
        );

        let (result, samples) = run(&collector, &ScrapeContext::unbounded()).await;
        assert!(matches!(
            result,
            Err(CollectError::Process(ProcessError::Timeout(_)))
        ));
        assert!(result.unwrap_err().is_timeout());
        assert!(samples.is_empty());
    }

    #[tokio::test]
    async fn test_scrape_deadline_shorter_than_timeout() {
        let collector = CommandCollector::new(
            "hang",
            sh("sleep 10"),
            Duration::from_secs(30),
            lines_fact(),
            count_lines,
        );

        let ctx = ScrapeContext::new(Duration::from_millis(100));
        let (result, samples) = run(&collector, &ctx).await;
        assert!(matches!(result, Err(CollectError::DeadlineExceeded)));
        assert!(samples.is_empty());
    }

    #[tokio::test]
    async fn test_exec_error_is_not_parsed() {
        let collector = CommandCollector::new(
            "fails",
            sh("echo partial; exit 1"),
            Duration::from_secs(5),
            lines_fact(),
            count_lines,
        );

        let (result, samples) = run(&collector, &ScrapeContext::unbounded()).await;
        match result {
            Err(CollectError::Process(err @ ProcessError::NonZeroExit { .. })) => {
                assert_eq!(err.output().map(str::trim), Some("partial"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(samples.is_empty());
    }

    #[tokio::test]
    async fn test_parse_error_propagates() {
        let collector = CommandCollector::new(
            "garbled",
            sh("echo nothing useful"),
            Duration::from_secs(5),
            lines_fact(),
            |_: &str| -> ProcessResult<Vec<f64>> { Err(ProcessError::Parse("bad".into())) },
        );

        let (result, samples) = run(&collector, &ScrapeContext::unbounded()).await;
        assert!(matches!(
            result,
            Err(CollectError::Process(ProcessError::Parse(_)))
        ));
        assert!(samples.is_empty());
    }
}
