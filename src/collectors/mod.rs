//! Built-in collectors
//!
//! Each built-in is a variant of [`CollectorKind`]; its name is part of the
//! public contract since hosts select collectors by name.

mod cluster_csv_fs;
mod tcp_ports;

use std::sync::Arc;

pub use cluster_csv_fs::{cluster_csv_fs_collector, ClusterCsvFsRow, SUBSYSTEM as CLUSTER_CSV_FS_SUBSYSTEM};
pub use tcp_ports::{parse_listening, tcp_ports_collector, SUBSYSTEM as TCP_PORTS_SUBSYSTEM};

use crate::collector::Collector;
use crate::registry::BuildContext;

/// Closed set of collectors shipped with the exporter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectorKind {
    /// Cluster shared volume file system counters, one series per volume
    ClusterCsvFs,
    /// Count of listening TCP sockets
    TcpPorts,
}

impl CollectorKind {
    /// Every built-in, in registration order
    pub const ALL: [CollectorKind; 2] = [CollectorKind::ClusterCsvFs, CollectorKind::TcpPorts];

    pub fn name(self) -> &'static str {
        match self {
            CollectorKind::ClusterCsvFs => "cluster_csv_fs",
            CollectorKind::TcpPorts => "tcp_ports",
        }
    }

    /// Construct the collector for this kind
    pub fn build(self, ctx: &BuildContext<'_>) -> Arc<dyn Collector> {
        match self {
            CollectorKind::ClusterCsvFs => Arc::new(cluster_csv_fs_collector(
                &ctx.config.namespace,
                Arc::clone(&ctx.query),
            )),
            CollectorKind::TcpPorts => Arc::new(tcp_ports_collector(
                &ctx.config.namespace,
                &ctx.config.tcp_ports,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_distinct() {
        let mut names: Vec<_> = CollectorKind::ALL.iter().map(|kind| kind.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CollectorKind::ALL.len());
    }
}
