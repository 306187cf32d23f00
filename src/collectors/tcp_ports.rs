//! Listening TCP socket count from `netstat`
use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;

use crate::collector::CommandCollector;
use crate::config::TcpPortsConfig;
use crate::metric::{MetricDescriptor, ValueKind};
use crate::process::parsers::PatternCounter;
use crate::process::{Command, ProcessResult};

pub const SUBSYSTEM: &str = "tcp_ports";

lazy_static! {
    // local address ending in :port, any fields, LISTENING, owning pid
    static ref LISTENING: Regex = Regex::new(r":(?P<port>\d+)\s+.*?LISTENING\s+(?P<pid>\d+)").unwrap();
    // column header netstat prints even when the table is empty
    static ref NETSTAT_HEADER: Regex = Regex::new(r"(?m)^\s*Proto\s+Local Address").unwrap();
}

fn listening_counter() -> PatternCounter {
    PatternCounter::new(LISTENING.clone()).allow_empty_when(NETSTAT_HEADER.clone())
}

/// Count listening sockets in `netstat -ano` output.
///
/// A table header with no listening rows is a genuine zero; text with
/// neither is a parse error.
pub fn parse_listening(output: &str) -> ProcessResult<usize> {
    listening_counter().count(output)
}

/// Build the `tcp_ports` collector
pub fn tcp_ports_collector(
    namespace: &str,
    config: &TcpPortsConfig,
) -> CommandCollector<PatternCounter> {
    let command = Command::new(&config.program).args(&config.args);
    let listen_count = MetricDescriptor::new(
        namespace,
        SUBSYSTEM,
        "listen_count",
        "Amount of listening tcp ports",
        Vec::<String>::new(),
        ValueKind::Gauge,
    );

    CommandCollector::new(
        "tcp_ports",
        command,
        Duration::from_secs(config.timeout_secs),
        vec![listen_count],
        listening_counter(),
    )
}
