//! Cluster shared volume file system counters
//!
//! Values are exported as the provider reports them in its raw performance
//! class. No field carries a percentage or fixed-point encoding. The
//! `*_latency` fields are accumulated timer ticks and the
//! `*_avg_queue_length` fields are the accumulators behind an average, so
//! both are counters; consumers derive averages from their rates.

use std::sync::Arc;

use serde::Deserialize;

use crate::collector::{FieldSpec, QueryCollector, QueryRow};
use crate::source::QuerySource;

pub const SUBSYSTEM: &str = "cluster_csv_fs";

/// One volume of `Win32_PerfRawData_CsvFsPerfProvider_ClusterCSVFileSystem`.
///
/// Only the exported properties are decoded; the class carries many more.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ClusterCsvFsRow {
    pub name: String,

    pub volume_state: u32,
    pub create_file: u64,
    pub files_opened: u32,
    pub flushes: u64,

    pub volume_pause_count_disk: u64,
    pub volume_pause_count_network: u64,
    pub volume_pause_count_other: u64,
    pub volume_pause_count_total: u64,

    pub reads: u64,
    pub writes: u64,
    #[serde(rename = "MetadataIO")]
    pub metadata_io: u64,
    pub read_latency: u32,
    pub write_latency: u32,
    pub read_queue_length: u64,
    pub write_queue_length: u64,

    #[serde(rename = "IOReads")]
    pub io_reads: u64,
    #[serde(rename = "IOWrites")]
    pub io_writes: u64,
    #[serde(rename = "IOReadBytes")]
    pub io_read_bytes: u64,
    #[serde(rename = "IOWriteBytes")]
    pub io_write_bytes: u64,
    #[serde(rename = "IOReadLatency")]
    pub io_read_latency: u32,
    #[serde(rename = "IOWriteLatency")]
    pub io_write_latency: u32,
    #[serde(rename = "IOReadAvgQueueLength")]
    pub io_read_avg_queue_length: u64,
    #[serde(rename = "IOWriteAvgQueueLength")]
    pub io_write_avg_queue_length: u64,

    pub redirected_reads: u64,
    pub redirected_writes: u64,
    pub redirected_read_bytes: u64,
    pub redirected_write_bytes: u64,
    pub redirected_read_latency: u32,
    pub redirected_write_latency: u32,
    pub redirected_reads_avg_queue_length: u64,
    pub redirected_writes_avg_queue_length: u64,
}

impl QueryRow for ClusterCsvFsRow {
    const CLASS: &'static str = "Win32_PerfRawData_CsvFsPerfProvider_ClusterCSVFileSystem";

    fn entity_key(&self) -> &str {
        &self.name
    }
}

fn fields() -> Vec<FieldSpec<ClusterCsvFsRow>> {
    vec![
        // general information
        FieldSpec::gauge(
            "volume_state",
            "State of the volume. 0 - Init, 1 - Paused, 2 - Draining, 3 - Set down level, 4 - Active.",
            |r| r.volume_state as f64,
        ),
        FieldSpec::counter(
            "create_file",
            "The number of files that were created on the volume.",
            |r| r.create_file as f64,
        ),
        FieldSpec::gauge(
            "files_opened",
            "Number of files opened on this volume including the volume opens.",
            |r| r.files_opened as f64,
        ),
        FieldSpec::counter(
            "flushes",
            "The number of flushes that were performed on the volume.",
            |r| r.flushes as f64,
        ),

        // why and how often the volume was paused
        FieldSpec::counter(
            "volume_pause_count_disk",
            "Number of times this volume was paused due to an error from a disk.",
            |r| r.volume_pause_count_disk as f64,
        ),
        FieldSpec::counter(
            "volume_pause_count_network",
            "Number of times this volume was paused due to an error from a network.",
            |r| r.volume_pause_count_network as f64,
        ),
        FieldSpec::counter(
            "volume_pause_count_other",
            "Number of times this volume was paused for reasons other than direct IO or network.",
            |r| r.volume_pause_count_other as f64,
        ),
        FieldSpec::counter(
            "volume_pause_count_total",
            "Number of times this volume was paused.",
            |r| r.volume_pause_count_total as f64,
        ),

        // all io
        FieldSpec::counter(
            "reads",
            "The number of reads that were performed on the volume.",
            |r| r.reads as f64,
        ),
        FieldSpec::counter(
            "writes",
            "The number of writes that were performed on the volume.",
            |r| r.writes as f64,
        ),
        FieldSpec::counter(
            "metadata_io",
            "The number of metadata operations that were performed against the volume.",
            |r| r.metadata_io as f64,
        ),
        FieldSpec::counter(
            "read_latency",
            "Accumulated latency between a read request arriving at the file system and its completion, in raw timer ticks.",
            |r| r.read_latency as f64,
        ),
        FieldSpec::counter(
            "write_latency",
            "Accumulated latency between a write request arriving at the file system and its completion, in raw timer ticks.",
            |r| r.write_latency as f64,
        ),
        FieldSpec::gauge(
            "read_queue_length",
            "The number of reads outstanding on this volume.",
            |r| r.read_queue_length as f64,
        ),
        FieldSpec::gauge(
            "write_queue_length",
            "The number of writes outstanding on this volume.",
            |r| r.write_queue_length as f64,
        ),

        // local io
        FieldSpec::counter(
            "io_reads",
            "The number of reads that were performed directly from the volume.",
            |r| r.io_reads as f64,
        ),
        FieldSpec::counter(
            "io_writes",
            "The number of writes that were performed directly to the volume.",
            |r| r.io_writes as f64,
        ),
        FieldSpec::counter(
            "io_read_bytes",
            "The number of bytes read directly from the volume.",
            |r| r.io_read_bytes as f64,
        ),
        FieldSpec::counter(
            "io_write_bytes",
            "The number of bytes written directly to the volume.",
            |r| r.io_write_bytes as f64,
        ),
        FieldSpec::counter(
            "io_read_latency",
            "Accumulated latency of reads sent to the disk using direct IO, in raw timer ticks.",
            |r| r.io_read_latency as f64,
        ),
        FieldSpec::counter(
            "io_write_latency",
            "Accumulated latency of writes sent to the disk using direct IO, in raw timer ticks.",
            |r| r.io_write_latency as f64,
        ),
        FieldSpec::counter(
            "io_read_avg_queue_length",
            "Accumulator behind the average number of read requests performed directly on the disk.",
            |r| r.io_read_avg_queue_length as f64,
        ),
        FieldSpec::counter(
            "io_write_avg_queue_length",
            "Accumulator behind the average number of write requests performed directly on the disk.",
            |r| r.io_write_avg_queue_length as f64,
        ),

        // redirected io
        FieldSpec::counter(
            "redirected_reads",
            "The number of reads that were redirected to the volume over the network.",
            |r| r.redirected_reads as f64,
        ),
        FieldSpec::counter(
            "redirected_writes",
            "The number of writes that were redirected to the volume over the network.",
            |r| r.redirected_writes as f64,
        ),
        FieldSpec::counter(
            "redirected_read_bytes",
            "The number of bytes read that were redirected to the volume over the network.",
            |r| r.redirected_read_bytes as f64,
        ),
        FieldSpec::counter(
            "redirected_write_bytes",
            "The number of bytes written that were redirected to the volume over the network.",
            |r| r.redirected_write_bytes as f64,
        ),
        FieldSpec::counter(
            "redirected_read_latency",
            "Accumulated latency of reads redirected to the volume through the network, in raw timer ticks.",
            |r| r.redirected_read_latency as f64,
        ),
        FieldSpec::counter(
            "redirected_write_latency",
            "Accumulated latency of writes redirected to the volume through the network, in raw timer ticks.",
            |r| r.redirected_write_latency as f64,
        ),
        FieldSpec::counter(
            "redirected_reads_avg_queue_length",
            "Accumulator behind the average number of redirected read requests.",
            |r| r.redirected_reads_avg_queue_length as f64,
        ),
        FieldSpec::counter(
            "redirected_writes_avg_queue_length",
            "Accumulator behind the average number of redirected write requests.",
            |r| r.redirected_writes_avg_queue_length as f64,
        ),
    ]
}

/// Build the `cluster_csv_fs` collector over `source`
pub fn cluster_csv_fs_collector(
    namespace: &str,
    source: Arc<dyn QuerySource>,
) -> QueryCollector<ClusterCsvFsRow> {
    QueryCollector::new("cluster_csv_fs", namespace, SUBSYSTEM, "volume", fields(), source)
}
