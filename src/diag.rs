//! Diagnostic operations exposed to front ends.
//!
//! Each operation validates its input, pushes a header line, spawns the run
//! on the tokio runtime and returns immediately. Input errors are reported as
//! a single line and nothing is spawned.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::{Config, MAX_SAFE_HOPS, clamp_ping_count};
use crate::dns::{Resolver, run_dns_lookup};
use crate::host::{Target, is_valid_host};
use crate::sink::LineSink;
use crate::stream::{CommandLine, stream_command};

pub const INVALID_HOST_LINE: &str = "Invalid host";
pub const NO_DOMAIN_LINE: &str = "No domain provided";

/// Check whether `host` may be pinged or traced
pub fn validate(host: &str) -> bool {
    is_valid_host(host)
}

/// Parse a ping count typed by the user; unparseable input means the default
pub fn parse_count(input: &str, default: u32) -> u32 {
    match input.trim() {
        "" => clamp_ping_count(default as i64),
        s => s
            .parse::<i64>()
            .map(clamp_ping_count)
            .unwrap_or_else(|_| clamp_ping_count(default as i64)),
    }
}

/// `ping -c <count> <target>`
pub fn ping_command(target: &Target, count: u32) -> CommandLine {
    CommandLine::new("ping")
        .arg("-c")
        .arg(count.to_string())
        .arg(target.as_str())
}

/// `traceroute -m <max_hops> <target>`
pub fn traceroute_command(target: &Target, max_hops: u8) -> CommandLine {
    CommandLine::new("traceroute")
        .arg("-m")
        .arg(max_hops.clamp(1, MAX_SAFE_HOPS).to_string())
        .arg(target.as_str())
}

/// Entry points for the three diagnostics, sharing one configuration and
/// resolver capability.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    config: Config,
    resolver: Resolver,
}

impl Diagnostics {
    pub fn new(config: Config, resolver: Resolver) -> Self {
        Self { config, resolver }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Ping `host` `count` times (clamped to 1-20)
    pub fn stream_ping<S>(&self, host: &str, count: i64, sink: Arc<S>) -> Option<JoinHandle<()>>
    where
        S: LineSink + ?Sized + 'static,
    {
        let Some(target) = Target::parse(host) else {
            sink.push(INVALID_HOST_LINE.to_string());
            return None;
        };
        let count = clamp_ping_count(count);
        let command = ping_command(&target, count);
        let read_timeout = self.config.ping_timeout(count);
        info!(%target, count, "starting ping");

        Some(tokio::spawn(async move {
            sink.push(format!("PING {} (count={})", target, count));
            stream_command(&command, &*sink, read_timeout).await;
        }))
    }

    /// Trace the route to `host`
    pub fn stream_traceroute<S>(&self, host: &str, sink: Arc<S>) -> Option<JoinHandle<()>>
    where
        S: LineSink + ?Sized + 'static,
    {
        let Some(target) = Target::parse(host) else {
            sink.push(INVALID_HOST_LINE.to_string());
            return None;
        };
        let command = traceroute_command(&target, self.config.max_hops);
        let read_timeout = self.config.traceroute_timeout;
        info!(%target, max_hops = self.config.max_hops, "starting traceroute");

        Some(tokio::spawn(async move {
            sink.push(format!("Traceroute {}", target));
            stream_command(&command, &*sink, read_timeout).await;
        }))
    }

    /// Look up every supported record type for `domain`
    pub fn stream_dns<S>(&self, domain: &str, sink: Arc<S>) -> Option<JoinHandle<()>>
    where
        S: LineSink + ?Sized + 'static,
    {
        let domain = domain.trim().to_string();
        if domain.is_empty() {
            sink.push(NO_DOMAIN_LINE.to_string());
            return None;
        }
        let resolver = self.resolver.clone();
        let query_timeout = self.config.dns_timeout;
        info!(%domain, "starting DNS lookup");

        Some(tokio::spawn(async move {
            sink.push(format!("DNS Lookup for {}", domain));
            run_dns_lookup(&domain, &resolver, query_timeout, &*sink).await;
        }))
    }
}
