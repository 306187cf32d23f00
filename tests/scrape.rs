#![cfg(unix)]

use std::sync::Arc;

use scrapekit::collectors::ClusterCsvFsRow;
use scrapekit::collector::QueryRow;
use scrapekit::exposition;
use scrapekit::prelude::*;
use scrapekit::source::StaticQuerySource;
use serde_json::json;

const NETSTAT_OUTPUT: &str = "\
TCP 0.0.0.0:135 0.0.0.0:0 LISTENING 812
TCP 0.0.0.0:135 0.0.0.0:0 LISTENING 812
TCP 0.0.0.0:135 0.0.0.0:0 LISTENING 812
TCP 10.0.0.5:49700 52.1.1.1:443 ESTABLISHED 4120
";

fn config_with_netstat(script: &str, timeout_secs: u64) -> ExporterConfig {
    ConfigBuilder::new()
        .add_toml(format!(
            r#"
            namespace = "windows"

            [tcp_ports]
            program = "sh"
            args = ["-c", {script:?}]
            timeout_secs = {timeout_secs}
            "#
        ))
        .build()
        .unwrap()
}

fn volume(name: &str) -> serde_json::Value {
    let mut row = json!({ "Name": name });
    for key in [
        "VolumeState", "CreateFile", "FilesOpened", "Flushes",
        "VolumePauseCountDisk", "VolumePauseCountNetwork", "VolumePauseCountOther", "VolumePauseCountTotal",
        "Reads", "Writes", "MetadataIO", "ReadLatency", "WriteLatency", "ReadQueueLength", "WriteQueueLength",
        "IOReads", "IOWrites", "IOReadBytes", "IOWriteBytes", "IOReadLatency", "IOWriteLatency",
        "IOReadAvgQueueLength", "IOWriteAvgQueueLength",
        "RedirectedReads", "RedirectedWrites", "RedirectedReadBytes", "RedirectedWriteBytes",
        "RedirectedReadLatency", "RedirectedWriteLatency",
        "RedirectedReadsAvgQueueLength", "RedirectedWritesAvgQueueLength",
    ] {
        row[key] = json!(1);
    }
    row
}

#[tokio::test]
async fn test_full_scrape_renders_both_collectors() {
    let config = config_with_netstat(&format!("printf '{}'", NETSTAT_OUTPUT.replace('\n', "\\n")), 5);
    let source = StaticQuerySource::new().with_rows(
        ClusterCsvFsRow::CLASS,
        vec![volume("Volume1"), volume("_Total"), volume("Volume2")],
    );
    let registry = CollectorRegistry::with_builtin();

    let agent = Agent::from_config(&config, &registry, Arc::new(source)).unwrap();
    assert_eq!(agent.collector_names(), vec!["cluster_csv_fs", "tcp_ports"]);

    let report = agent.scrape().await;
    assert_eq!(report.failed().count(), 0, "{:?}", report.outcomes);

    let text = exposition::render(&report.samples);
    assert!(text.contains("# TYPE windows_tcp_ports_listen_count gauge\nwindows_tcp_ports_listen_count 3\n"));
    assert!(text.contains("windows_cluster_csv_fs_reads{volume=\"Volume1\"} 1\n"));
    assert!(text.contains("windows_cluster_csv_fs_reads{volume=\"Volume2\"} 1\n"));
    assert!(!text.contains("_Total"));
    assert!(text.contains("windows_exporter_collector_success{collector=\"tcp_ports\"} 1\n"));
}

#[tokio::test]
async fn test_unavailable_source_leaves_other_collector_intact() {
    let config = config_with_netstat(&format!("printf '{}'", NETSTAT_OUTPUT.replace('\n', "\\n")), 5);
    let registry = CollectorRegistry::with_builtin();

    let agent = Agent::from_config(&config, &registry, Arc::new(StaticQuerySource::new())).unwrap();
    let report = agent.scrape().await;

    let failed: Vec<&str> = report.failed().map(|o| o.name.as_str()).collect();
    assert_eq!(failed, vec!["cluster_csv_fs"]);

    let text = exposition::render(&report.samples);
    assert!(text.contains("windows_tcp_ports_listen_count 3\n"));
    assert!(!text.contains("windows_cluster_csv_fs_reads"));
    assert!(text.contains("windows_exporter_collector_success{collector=\"cluster_csv_fs\"} 0\n"));
}

#[tokio::test]
async fn test_hung_command_times_out() {
    let mut config = config_with_netstat("sleep 30", 1);
    config.collectors.enabled = vec!["tcp_ports".to_string()];
    let registry = CollectorRegistry::with_builtin();

    let agent = Agent::from_config(&config, &registry, Arc::new(StaticQuerySource::new())).unwrap();
    let started = std::time::Instant::now();
    let report = agent.scrape().await;

    assert!(started.elapsed() < std::time::Duration::from_secs(10));
    let outcome = &report.outcomes[0];
    assert!(outcome.error.as_ref().is_some_and(|e| e.is_timeout()));
    assert!(report
        .samples
        .iter()
        .all(|s| s.descriptor().fq_name() != "windows_tcp_ports_listen_count"));
}

#[tokio::test]
async fn test_unknown_collector_is_a_configuration_error() {
    let mut config = ExporterConfig::default();
    config.collectors.enabled = vec!["tcp_ports".into(), "gpu".into()];
    let registry = CollectorRegistry::with_builtin();

    let err = Agent::from_config(&config, &registry, Arc::new(StaticQuerySource::new()))
        .err()
        .unwrap();
    assert!(matches!(err, ExporterError::Registry(RegistryError::Unknown(ref name)) if name == "gpu"));
}
