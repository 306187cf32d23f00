//! Name-to-constructor table for collectors
//!
//! The registry is populated once at startup and only read afterwards.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use log::debug;
use thiserror::Error;

use crate::collector::Collector;
use crate::collectors::CollectorKind;
use crate::config::ExporterConfig;
use crate::source::QuerySource;

/// Errors raised while registering or resolving collectors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Collector '{0}' is already registered")]
    Duplicate(String),

    #[error("Unknown collector '{0}'")]
    Unknown(String),

    #[error("Failed to build collector '{name}': {reason}")]
    Build { name: String, reason: String },
}

/// Everything a constructor may need to build its collector
#[derive(Clone)]
pub struct BuildContext<'a> {
    pub config: &'a ExporterConfig,
    pub query: Arc<dyn QuerySource>,
}

/// Builds one collector instance
pub type Constructor =
    Box<dyn Fn(&BuildContext<'_>) -> Result<Arc<dyn Collector>, RegistryError> + Send + Sync>;

struct Entry {
    name: String,
    constructor: Constructor,
}

/// Registry of collector constructors, kept in registration order
#[derive(Default)]
pub struct CollectorRegistry {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl CollectorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in collector
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for kind in CollectorKind::ALL {
            registry
                .register(kind.name(), move |ctx: &BuildContext<'_>| Ok(kind.build(ctx)))
                .expect("built-in collector names must be unique");
        }
        registry
    }

    /// Register a constructor under `name`.
    ///
    /// A name can only be registered once.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F) -> Result<(), RegistryError>
    where
        F: Fn(&BuildContext<'_>) -> Result<Arc<dyn Collector>, RegistryError> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }

        debug!("Registering collector {}", name);
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push(Entry {
            name,
            constructor: Box::new(constructor),
        });
        Ok(())
    }

    /// Registered names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Instantiate the named collectors, or every registered one when
    /// `names` is empty.
    ///
    /// Instances come back in registration order whatever order `names` is
    /// in, and a name selected twice yields one instance.
    pub fn resolve<S: AsRef<str>>(
        &self,
        names: &[S],
        ctx: &BuildContext<'_>,
    ) -> Result<Vec<Arc<dyn Collector>>, RegistryError> {
        let selected: HashSet<&str> = names.iter().map(|name| name.as_ref()).collect();
        let mut requested = names.iter().map(|name| name.as_ref());
        if let Some(unknown) = requested.find(|name| !self.contains(name)) {
            return Err(RegistryError::Unknown(unknown.to_string()));
        }

        self.entries
            .iter()
            .filter(|entry| selected.is_empty() || selected.contains(entry.name.as_str()))
            .map(|entry| {
                debug!("Building collector {}", entry.name);
                (entry.constructor)(ctx)
            })
            .collect()
    }
}

impl fmt::Debug for CollectorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectorRegistry")
            .field("collectors", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticQuerySource;

    fn build_ctx(config: &ExporterConfig) -> BuildContext<'_> {
        BuildContext {
            config,
            query: Arc::new(StaticQuerySource::new()),
        }
    }

    #[test]
    fn test_builtin_names_in_order() {
        let registry = CollectorRegistry::with_builtin();
        assert_eq!(registry.names(), vec!["cluster_csv_fs", "tcp_ports"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = CollectorRegistry::with_builtin();
        let err = registry
            .register("tcp_ports", |ctx: &BuildContext<'_>| Ok(CollectorKind::TcpPorts.build(ctx)))
            .unwrap_err();

        assert!(matches!(err, RegistryError::Duplicate(ref name) if name == "tcp_ports"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_resolve_all_when_none_selected() {
        let registry = CollectorRegistry::with_builtin();
        let config = ExporterConfig::default();

        let collectors = registry.resolve::<&str>(&[], &build_ctx(&config)).unwrap();
        let names: Vec<&str> = collectors.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["cluster_csv_fs", "tcp_ports"]);
    }

    #[test]
    fn test_resolve_keeps_registration_order() {
        let registry = CollectorRegistry::with_builtin();
        let config = ExporterConfig::default();

        let collectors = registry
            .resolve(&["tcp_ports", "cluster_csv_fs", "tcp_ports"], &build_ctx(&config))
            .unwrap();
        let names: Vec<&str> = collectors.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["cluster_csv_fs", "tcp_ports"]);
    }

    #[test]
    fn test_resolve_unknown_name() {
        let registry = CollectorRegistry::with_builtin();
        let config = ExporterConfig::default();

        let err = registry
            .resolve(&["tcp_ports", "gpu"], &build_ctx(&config))
            .err()
            .unwrap();
        assert!(matches!(err, RegistryError::Unknown(ref name) if name == "gpu"));
    }

    #[test]
    fn test_constructor_failure_surfaces() {
        let mut registry = CollectorRegistry::new();
        registry
            .register("broken", |_: &BuildContext<'_>| {
                Err(RegistryError::Build {
                    name: "broken".into(),
                    reason: "no backend".into(),
                })
            })
            .unwrap();
        let config = ExporterConfig::default();

        let err = registry.resolve::<&str>(&[], &build_ctx(&config)).err().unwrap();
        assert!(matches!(err, RegistryError::Build { .. }));
    }
}
