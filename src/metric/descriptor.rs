use std::collections::HashSet;
use std::fmt;

/// Value semantics of a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Monotonically non-decreasing accumulator
    Counter,
    /// Point-in-time level
    Gauge,
}

impl ValueKind {
    /// Name used in the `# TYPE` line of the exposition format
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Counter => "counter",
            ValueKind::Gauge => "gauge",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Join namespace, subsystem and name into a fully-qualified metric name.
///
/// Empty parts are skipped, so a collector without a subsystem still gets a
/// well-formed name.
pub fn build_fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    [namespace, subsystem, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

/// Immutable description of a metric
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricDescriptor {
    fq_name: String,
    help: String,
    label_names: Vec<String>,
    kind: ValueKind,
}

impl MetricDescriptor {
    /// Create a new descriptor.
    ///
    /// # Panics
    ///
    /// Descriptors are built once at startup, so a malformed one is a
    /// programming error: this panics if the fully-qualified name is empty or
    /// a label name is repeated.
    pub fn new<S: Into<String>>(
        namespace: &str,
        subsystem: &str,
        name: &str,
        help: impl Into<String>,
        label_names: impl IntoIterator<Item = S>,
        kind: ValueKind,
    ) -> Self {
        let fq_name = build_fq_name(namespace, subsystem, name);
        assert!(!fq_name.is_empty(), "metric descriptor needs a name");

        let label_names: Vec<String> = label_names.into_iter().map(Into::into).collect();
        let mut seen = HashSet::new();
        for label in &label_names {
            assert!(
                seen.insert(label.as_str()),
                "duplicate label name '{}' in descriptor {}",
                label,
                fq_name
            );
        }

        Self {
            fq_name,
            help: help.into(),
            label_names,
            kind,
        }
    }

    /// Fully-qualified metric name (`namespace_subsystem_name`)
    pub fn fq_name(&self) -> &str {
        &self.fq_name
    }

    /// Help text
    pub fn help(&self) -> &str {
        &self.help
    }

    /// Label names, in the order label values must be supplied
    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    /// Counter or gauge
    pub fn kind(&self) -> ValueKind {
        self.kind
    }
}
