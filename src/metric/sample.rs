use std::sync::Arc;

use super::descriptor::{MetricDescriptor, ValueKind};

/// A single measurement produced during a scrape
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    descriptor: Arc<MetricDescriptor>,
    value: f64,
    label_values: Vec<String>,
}

impl Sample {
    /// Create a sample for the given descriptor.
    ///
    /// # Panics
    ///
    /// Panics if the number of label values differs from the descriptor's
    /// label names.
    pub fn new<S: Into<String>>(
        descriptor: &Arc<MetricDescriptor>,
        value: f64,
        label_values: impl IntoIterator<Item = S>,
    ) -> Self {
        let label_values: Vec<String> = label_values.into_iter().map(Into::into).collect();
        assert_eq!(
            label_values.len(),
            descriptor.label_names().len(),
            "label value count mismatch for {}",
            descriptor.fq_name()
        );

        Self {
            descriptor: Arc::clone(descriptor),
            value,
            label_values,
        }
    }

    /// Create a sample for a descriptor with no labels
    pub fn unlabeled(descriptor: &Arc<MetricDescriptor>, value: f64) -> Self {
        Self::new(descriptor, value, Vec::<String>::new())
    }

    pub fn descriptor(&self) -> &Arc<MetricDescriptor> {
        &self.descriptor
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    pub fn kind(&self) -> ValueKind {
        self.descriptor.kind()
    }

    /// Label name/value pairs in descriptor order
    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.descriptor
            .label_names()
            .iter()
            .map(String::as_str)
            .zip(self.label_values.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volume_desc() -> Arc<MetricDescriptor> {
        Arc::new(MetricDescriptor::new(
            "windows",
            "cluster_csv_fs",
            "flushes",
            "Flushes",
            ["volume"],
            ValueKind::Counter,
        ))
    }

    #[test]
    fn test_sample_labels() {
        let desc = volume_desc();
        let sample = Sample::new(&desc, 12.0, ["C:"]);

        assert_eq!(sample.value(), 12.0);
        assert_eq!(sample.kind(), ValueKind::Counter);
        assert_eq!(sample.labels().collect::<Vec<_>>(), vec![("volume", "C:")]);
        assert!(Arc::ptr_eq(sample.descriptor(), &desc));
    }

    #[test]
    #[should_panic(expected = "label value count mismatch")]
    fn test_missing_label_value_panics() {
        let desc = volume_desc();
        Sample::unlabeled(&desc, 1.0);
    }
}
