//! Collectors backed by a structured row query
use std::sync::Arc;

use log::{debug, trace};
use serde::de::DeserializeOwned;

use super::core::{Collector, Emitter};
use crate::context::ScrapeContext;
use crate::error::CollectError;
use crate::metric::{MetricDescriptor, Sample, ValueKind};
use crate::source::{QueryError, QuerySource};

/// Entity key of the pre-aggregated summary row sources add alongside the
/// real entities. It is never exported: summing over the real entities
/// would count it twice.
pub const AGGREGATE_ROW: &str = "_Total";

/// A typed row of a queryable class
pub trait QueryRow: DeserializeOwned + Send + Sync + 'static {
    /// Class queried for these rows
    const CLASS: &'static str;

    /// Value of the entity label for this row
    fn entity_key(&self) -> &str;
}

/// One exported field of a row type
pub struct FieldSpec<R> {
    /// Metric name, below the collector's subsystem
    pub name: &'static str,
    pub help: &'static str,
    /// Fixed at construction, never inferred from the data
    pub kind: ValueKind,
    /// Reads the field, already normalised to its natural unit
    pub value: fn(&R) -> f64,
}

impl<R> FieldSpec<R> {
    pub const fn counter(name: &'static str, help: &'static str, value: fn(&R) -> f64) -> Self {
        Self {
            name,
            help,
            kind: ValueKind::Counter,
            value,
        }
    }

    pub const fn gauge(name: &'static str, help: &'static str, value: fn(&R) -> f64) -> Self {
        Self {
            name,
            help,
            kind: ValueKind::Gauge,
            value,
        }
    }
}

/// Turns one query snapshot into one sample per (row, field) pair
pub struct QueryCollector<R> {
    name: String,
    source: Arc<dyn QuerySource>,
    fields: Vec<FieldSpec<R>>,
    descriptors: Vec<Arc<MetricDescriptor>>,
}

impl<R: QueryRow> QueryCollector<R> {
    /// Build the collector and its descriptors.
    ///
    /// Every descriptor carries the single `entity_label`.
    pub fn new(
        name: impl Into<String>,
        namespace: &str,
        subsystem: &str,
        entity_label: &str,
        fields: Vec<FieldSpec<R>>,
        source: Arc<dyn QuerySource>,
    ) -> Self {
        let descriptors = fields
            .iter()
            .map(|field| {
                Arc::new(MetricDescriptor::new(
                    namespace,
                    subsystem,
                    field.name,
                    field.help,
                    [entity_label],
                    field.kind,
                ))
            })
            .collect();

        Self {
            name: name.into(),
            source,
            fields,
            descriptors,
        }
    }

    fn decode(raw: Vec<serde_json::Value>) -> Result<Vec<R>, QueryError> {
        raw.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<R>, _>>()
            .map_err(|source| QueryError::Schema {
                class: R::CLASS.to_string(),
                source,
            })
    }
}

#[async_trait::async_trait]
impl<R: QueryRow> Collector for QueryCollector<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn descriptors(&self) -> &[Arc<MetricDescriptor>] {
        &self.descriptors
    }

    async fn collect(&self, ctx: &ScrapeContext, out: &Emitter) -> Result<(), CollectError> {
        debug!("[{}] querying {} from {}", self.name, R::CLASS, self.source.name());

        let raw = tokio::select! {
            biased;
            err = ctx.done() => return Err(err),
            res = self.source.query(ctx, R::CLASS) => res?,
        };
        let rows = Self::decode(raw)?;
        trace!("[{}] {} rows", self.name, rows.len());

        for row in rows.iter().filter(|row| row.entity_key() != AGGREGATE_ROW) {
            for (field, descriptor) in self.fields.iter().zip(&self.descriptors) {
                out.emit(Sample::new(descriptor, (field.value)(row), [row.entity_key()]))?;
            }
        }

        Ok(())
    }
}
