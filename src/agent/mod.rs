//! Scrape orchestration
//!
//! One scrape round runs every resolved collector concurrently under a
//! shared [`ScrapeContext`]. A collector's samples are kept only if it
//! finishes cleanly, so a failing collector is absent from the output rather
//! than partially present.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::collector::{Collector, Emitter};
use crate::config::ExporterConfig;
use crate::context::ScrapeContext;
use crate::error::{CollectError, ExporterError};
use crate::metric::{MetricDescriptor, Sample, ValueKind};
use crate::registry::{BuildContext, CollectorRegistry};
use crate::source::QuerySource;

/// How one collector fared in a scrape round
#[derive(Debug)]
pub struct CollectorOutcome {
    pub name: String,
    pub duration: Duration,
    /// Samples kept from this collector
    pub samples: usize,
    pub error: Option<CollectError>,
}

impl CollectorOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of one scrape round
#[derive(Debug, Default)]
pub struct ScrapeReport {
    /// Samples of every successful collector followed by the per-collector
    /// status gauges
    pub samples: Vec<Sample>,
    /// One entry per collector, in resolution order
    pub outcomes: Vec<CollectorOutcome>,
}

impl ScrapeReport {
    /// Outcomes of collectors that failed this round
    pub fn failed(&self) -> impl Iterator<Item = &CollectorOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.succeeded())
    }
}

/// Runs scrape rounds over a fixed set of collectors
pub struct Agent {
    collectors: Vec<Arc<dyn Collector>>,
    timeout: Duration,
    duration_desc: Arc<MetricDescriptor>,
    success_desc: Arc<MetricDescriptor>,
}

impl Agent {
    /// Create an agent over already-built collectors
    pub fn new(namespace: &str, collectors: Vec<Arc<dyn Collector>>, timeout: Duration) -> Self {
        Self {
            collectors,
            timeout,
            duration_desc: Arc::new(MetricDescriptor::new(
                namespace,
                "exporter",
                "collector_duration_seconds",
                "Duration of a collection.",
                ["collector"],
                ValueKind::Gauge,
            )),
            success_desc: Arc::new(MetricDescriptor::new(
                namespace,
                "exporter",
                "collector_success",
                "Whether the collector was successful.",
                ["collector"],
                ValueKind::Gauge,
            )),
        }
    }

    /// Resolve the configured collectors from `registry` and build an agent
    pub fn from_config(
        config: &ExporterConfig,
        registry: &CollectorRegistry,
        query: Arc<dyn QuerySource>,
    ) -> Result<Self, ExporterError> {
        let ctx = BuildContext { config, query };
        let collectors = registry.resolve(config.collectors.enabled.as_slice(), &ctx)?;

        info!(
            "Enabled collectors: {}",
            collectors.iter().map(|c| c.name()).collect::<Vec<_>>().join(", ")
        );

        Ok(Self::new(&config.namespace, collectors, config.scrape_timeout()))
    }

    pub fn collector_names(&self) -> Vec<&str> {
        self.collectors.iter().map(|c| c.name()).collect()
    }

    /// Run one scrape round bounded by the configured timeout
    pub async fn scrape(&self) -> ScrapeReport {
        let ctx = ScrapeContext::new(self.timeout);
        self.scrape_with(&ctx).await
    }

    /// Run one scrape round under a caller-supplied context
    pub async fn scrape_with(&self, ctx: &ScrapeContext) -> ScrapeReport {
        let mut tasks = JoinSet::new();

        for (index, collector) in self.collectors.iter().enumerate() {
            let collector = Arc::clone(collector);
            let ctx = ctx.clone();
            tasks.spawn(async move {
                let (result, samples, duration) = run_collector(collector.as_ref(), &ctx).await;
                (index, result, samples, duration)
            });
        }

        let mut finished = Vec::with_capacity(self.collectors.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(done) => finished.push(done),
                // contract violations inside a collector are bugs, not scrape failures
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => error!("Collector task aborted: {}", e),
            }
        }
        finished.sort_by_key(|(index, ..)| *index);

        let mut report = ScrapeReport::default();
        let mut status = Vec::with_capacity(finished.len() * 2);

        for (index, result, samples, duration) in finished {
            let name = self.collectors[index].name().to_string();

            let (kept, error) = match result {
                Ok(()) => {
                    debug!("collector {} succeeded after {:?}", name, duration);
                    let kept = samples.len();
                    report.samples.extend(samples);
                    (kept, None)
                }
                Err(e) => {
                    error!("collector {} failed after {:?}: {}", name, duration, e);
                    (0, Some(e))
                }
            };

            status.push(Sample::new(&self.duration_desc, duration.as_secs_f64(), [name.as_str()]));
            status.push(Sample::new(
                &self.success_desc,
                if error.is_none() { 1.0 } else { 0.0 },
                [name.as_str()],
            ));

            report.outcomes.push(CollectorOutcome {
                name,
                duration,
                samples: kept,
                error,
            });
        }

        report.samples.extend(status);
        report
    }
}

/// Run one collector against its own output buffer.
///
/// The collector is abandoned as soon as the scrape is cancelled or runs out
/// of time, even if it does not watch the context itself.
async fn run_collector(
    collector: &dyn Collector,
    ctx: &ScrapeContext,
) -> (Result<(), CollectError>, Vec<Sample>, Duration) {
    let started = Instant::now();
    let (out, mut rx) = Emitter::channel(collector);

    let result = tokio::select! {
        res = collector.collect(ctx, &out) => res,
        err = ctx.done() => Err(err),
    };
    drop(out);

    let mut samples = Vec::new();
    if result.is_ok() {
        while let Some(sample) = rx.recv().await {
            samples.push(sample);
        }
    }

    (result, samples, started.elapsed())
}
