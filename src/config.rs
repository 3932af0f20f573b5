use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

use crate::cli::Args;

/// Ping count bounds; anything outside is clamped
pub const MIN_PING_COUNT: u32 = 1;
pub const MAX_PING_COUNT: u32 = 20;

/// Upper bound on traceroute hops
pub const MAX_SAFE_HOPS: u8 = 64;

/// Runtime configuration derived from CLI args
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Default ping count offered in the UI
    pub ping_count: u32,
    /// Ping read timeout before the per-request allowance
    #[serde(with = "duration_serde")]
    pub ping_base_timeout: Duration,
    /// Read timeout added per echo request
    #[serde(with = "duration_serde")]
    pub ping_probe_timeout: Duration,
    /// Traceroute read timeout
    #[serde(with = "duration_serde")]
    pub traceroute_timeout: Duration,
    /// Traceroute `-m` value
    pub max_hops: u8,
    /// Per-query DNS timeout
    #[serde(with = "duration_serde")]
    pub dns_timeout: Duration,
    /// Explicit nameserver (system configuration when None)
    pub nameserver: Option<IpAddr>,
    /// Lines retained by the ping log
    pub ping_log_lines: usize,
    /// Lines retained by the traceroute log
    pub traceroute_log_lines: usize,
    /// Lines retained by the DNS log
    pub dns_log_lines: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ping_count: 4,
            ping_base_timeout: Duration::from_secs(30),
            ping_probe_timeout: Duration::from_secs(5),
            traceroute_timeout: Duration::from_secs(120),
            max_hops: 30,
            dns_timeout: Duration::from_secs(5),
            nameserver: None,
            ping_log_lines: 500,
            traceroute_log_lines: 1000,
            dns_log_lines: 500,
        }
    }
}

impl Config {
    /// Read timeout for a ping run of `count` requests
    pub fn ping_timeout(&self, count: u32) -> Duration {
        self.ping_base_timeout
            .saturating_add(self.ping_probe_timeout.saturating_mul(count))
    }
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Self {
            ping_count: clamp_ping_count(args.count),
            ping_base_timeout: args.ping_timeout_duration(),
            traceroute_timeout: args.traceroute_timeout_duration(),
            max_hops: args.max_hops.clamp(1, MAX_SAFE_HOPS),
            dns_timeout: args.dns_timeout_duration(),
            nameserver: args.nameserver,
            ..Self::default()
        }
    }
}

/// Clamp a requested ping count into [MIN_PING_COUNT, MAX_PING_COUNT]
pub fn clamp_ping_count(count: i64) -> u32 {
    count.clamp(MIN_PING_COUNT as i64, MAX_PING_COUNT as i64) as u32
}

/// Serde helper for Duration
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_clamp_ping_count() {
        assert_eq!(clamp_ping_count(4), 4);
        assert_eq!(clamp_ping_count(0), 1);
        assert_eq!(clamp_ping_count(-7), 1);
        assert_eq!(clamp_ping_count(21), 20);
        assert_eq!(clamp_ping_count(i64::MAX), 20);
    }

    #[test]
    fn test_ping_timeout_scales_with_count() {
        let config = Config::default();
        assert_eq!(config.ping_timeout(1), Duration::from_secs(35));
        assert_eq!(config.ping_timeout(20), Duration::from_secs(130));
    }

    #[test]
    fn test_ping_timeout_saturates() {
        let config = Config {
            ping_base_timeout: Duration::MAX,
            ping_probe_timeout: Duration::MAX,
            ..Config::default()
        };
        assert_eq!(config.ping_timeout(20), Duration::MAX);
    }

    #[test]
    fn test_negative_count_clamps_to_one() {
        let args = Args::try_parse_from(["netassist", "-c", "-3", "example.com"]).unwrap();
        assert_eq!(Config::from(&args).ping_count, 1);
    }

    #[test]
    fn test_from_args() {
        let args = Args::try_parse_from([
            "netassist",
            "-c",
            "50",
            "--max-hops",
            "12",
            "--dns-timeout",
            "2.5",
            "--nameserver",
            "9.9.9.9",
        ])
        .unwrap();
        let config = Config::from(&args);
        assert_eq!(config.ping_count, 20);
        assert_eq!(config.max_hops, 12);
        assert_eq!(config.dns_timeout, Duration::from_millis(2500));
        assert_eq!(config.nameserver, Some("9.9.9.9".parse().unwrap()));
        assert_eq!(config.traceroute_log_lines, 1000);
    }

    #[test]
    fn test_duration_serde_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("dns_timeout = 5.0"));
        let loaded: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_negative_duration_rejected() {
        let mut toml_str = toml::to_string(&Config::default()).unwrap();
        toml_str = toml_str.replace("dns_timeout = 5.0", "dns_timeout = -1.0");
        assert!(toml::from_str::<Config>(&toml_str).is_err());
    }
}
