//! Core collector trait and output handle
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::context::ScrapeContext;
use crate::error::CollectError;
use crate::metric::{MetricDescriptor, Sample};

/// Base trait for all metric collectors.
///
/// A collector owns a fixed set of descriptors built at construction and
/// produces a bounded snapshot each time it is asked. Instances are reused
/// across scrapes and hold no per-scrape state.
#[async_trait::async_trait]
pub trait Collector: Send + Sync + 'static {
    /// Stable name the collector is registered and selected under
    fn name(&self) -> &str;

    /// Every descriptor this collector may emit samples for
    fn descriptors(&self) -> &[Arc<MetricDescriptor>];

    /// Emit this scrape's samples onto `out`.
    ///
    /// On error the orchestrator discards anything already emitted, so the
    /// collector's metrics are absent from the scrape rather than partial.
    async fn collect(&self, ctx: &ScrapeContext, out: &Emitter) -> Result<(), CollectError>;
}

/// Per-collector output channel.
///
/// Rejects samples for descriptors the collector does not own.
pub struct Emitter {
    collector: String,
    descriptors: Vec<Arc<MetricDescriptor>>,
    tx: mpsc::UnboundedSender<Sample>,
}

impl Emitter {
    /// Create an emitter for `collector` and the receiver draining it
    pub fn channel(collector: &dyn Collector) -> (Self, mpsc::UnboundedReceiver<Sample>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let emitter = Self {
            collector: collector.name().to_string(),
            descriptors: collector.descriptors().to_vec(),
            tx,
        };
        (emitter, rx)
    }

    /// Send one sample.
    ///
    /// # Panics
    ///
    /// Panics if the sample's descriptor is not one of the collector's own.
    pub fn emit(&self, sample: Sample) -> Result<(), CollectError> {
        assert!(
            self.owns(sample.descriptor()),
            "collector {} emitted a sample for foreign metric {}",
            self.collector,
            sample.descriptor().fq_name()
        );
        self.tx.send(sample).map_err(|_| CollectError::OutputClosed)
    }

    fn owns(&self, descriptor: &Arc<MetricDescriptor>) -> bool {
        self.descriptors.iter().any(|own| Arc::ptr_eq(own, descriptor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::ValueKind;

    struct Fixed {
        descriptors: Vec<Arc<MetricDescriptor>>,
    }

    #[async_trait::async_trait]
    impl Collector for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn descriptors(&self) -> &[Arc<MetricDescriptor>] {
            &self.descriptors
        }

        async fn collect(&self, _ctx: &ScrapeContext, out: &Emitter) -> Result<(), CollectError> {
            out.emit(Sample::unlabeled(&self.descriptors[0], 1.0))
        }
    }

    fn fixed() -> Fixed {
        Fixed {
            descriptors: vec![Arc::new(MetricDescriptor::new(
                "test",
                "fixed",
                "up",
                "Always one",
                Vec::<String>::new(),
                ValueKind::Gauge,
            ))],
        }
    }

    #[tokio::test]
    async fn test_emitter_forwards_own_samples() {
        let collector = fixed();
        let (out, mut rx) = Emitter::channel(&collector);

        collector.collect(&ScrapeContext::unbounded(), &out).await.unwrap();
        drop(out);

        let sample = rx.recv().await.unwrap();
        assert_eq!(sample.descriptor().fq_name(), "test_fixed_up");
        assert!(rx.recv().await.is_none());
    }

    #[test]
    #[should_panic(expected = "foreign metric")]
    fn test_emitter_rejects_foreign_descriptor() {
        let collector = fixed();
        let (out, _rx) = Emitter::channel(&collector);

        // same name, different instance
        let other = fixed();
        let _ = out.emit(Sample::unlabeled(&other.descriptors[0], 1.0));
    }

    #[test]
    fn test_emit_after_receiver_dropped() {
        let collector = fixed();
        let (out, rx) = Emitter::channel(&collector);
        drop(rx);

        let err = out.emit(Sample::unlabeled(&collector.descriptors[0], 1.0)).unwrap_err();
        assert!(matches!(err, CollectError::OutputClosed));
    }
}
