use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::MAX_SAFE_HOPS;

/// Ping, traceroute and DNS lookup with live streaming output
#[derive(Parser, Debug, Clone)]
#[command(name = "netassist")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Target host or IP address (pre-fills the TUI target field)
    pub target: Option<String>,

    /// Number of echo requests for ping (clamped to 1-20)
    #[arg(short = 'c', long = "count", default_value = "4", allow_negative_numbers = true)]
    pub count: i64,

    /// Maximum hops for traceroute
    #[arg(short = 'm', long = "max-hops", default_value = "30")]
    pub max_hops: u8,

    /// Base read timeout for ping in seconds (5s per echo request is added)
    #[arg(long = "ping-timeout", default_value = "30", allow_negative_numbers = true)]
    pub ping_timeout: f64,

    /// Read timeout for traceroute in seconds
    #[arg(long = "traceroute-timeout", default_value = "120", allow_negative_numbers = true)]
    pub traceroute_timeout: f64,

    /// Per-query DNS timeout in seconds
    #[arg(long = "dns-timeout", default_value = "5", allow_negative_numbers = true)]
    pub dns_timeout: f64,

    /// Query this nameserver instead of the system resolver configuration
    #[arg(long = "nameserver")]
    pub nameserver: Option<IpAddr>,

    /// Disable TUI and stream lines to stdout
    #[arg(long = "no-tui")]
    pub no_tui: bool,

    /// Run ping (streaming mode)
    #[arg(long = "ping")]
    pub ping: bool,

    /// Run traceroute (streaming mode)
    #[arg(long = "traceroute")]
    pub traceroute: bool,

    /// Run a DNS lookup (streaming mode)
    #[arg(long = "dns")]
    pub dns: bool,

    /// Color theme (default, dracula, nord, gruvbox, monochrome)
    #[arg(long = "theme", default_value = "default")]
    pub theme: String,

    /// Write diagnostics logs to this file (TUI mode logs nowhere otherwise)
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,
}

impl Args {
    // Out-of-range seconds saturate; validate() rejects them up front
    pub fn ping_timeout_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.ping_timeout).unwrap_or(Duration::MAX)
    }

    pub fn traceroute_timeout_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.traceroute_timeout).unwrap_or(Duration::MAX)
    }

    pub fn dns_timeout_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.dns_timeout).unwrap_or(Duration::MAX)
    }

    /// Check if running without the TUI
    pub fn is_streaming_mode(&self) -> bool {
        self.no_tui || self.ping || self.traceroute || self.dns
    }

    /// Operations to run in streaming mode: the selected ones, or all of them
    pub fn selected_operations(&self) -> (bool, bool, bool) {
        if self.ping || self.traceroute || self.dns {
            (self.ping, self.traceroute, self.dns)
        } else {
            (true, true, true)
        }
    }

    /// Validate arguments
    pub fn validate(&self) -> Result<(), String> {
        if self.is_streaming_mode() && self.target.as_deref().is_none_or(|t| t.trim().is_empty()) {
            return Err("Streaming mode (--no-tui, --ping, --traceroute, --dns) requires a target".into());
        }

        for (name, secs) in [
            ("Ping timeout", self.ping_timeout),
            ("Traceroute timeout", self.traceroute_timeout),
            ("DNS timeout", self.dns_timeout),
        ] {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(format!("{} must be positive", name));
            }
            if Duration::try_from_secs_f64(secs).is_err() {
                return Err(format!("{} is too large", name));
            }
        }

        if self.max_hops == 0 {
            return Err("Max hops must be at least 1".into());
        }
        if self.max_hops > MAX_SAFE_HOPS {
            return Err(format!("Max hops cannot exceed {}", MAX_SAFE_HOPS));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("netassist").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.count, 4);
        assert_eq!(args.max_hops, 30);
        assert_eq!(args.dns_timeout_duration(), Duration::from_secs(5));
        assert!(!args.is_streaming_mode());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_streaming_mode_requires_target() {
        assert!(parse(&["--no-tui"]).validate().is_err());
        assert!(parse(&["--ping", "  "]).validate().is_err());
        assert!(parse(&["--ping", "example.com"]).validate().is_ok());
    }

    #[test]
    fn test_selected_operations() {
        assert_eq!(parse(&["--no-tui", "x"]).selected_operations(), (true, true, true));
        assert_eq!(parse(&["--dns", "x"]).selected_operations(), (false, false, true));
        assert_eq!(
            parse(&["--ping", "--traceroute", "x"]).selected_operations(),
            (true, true, false)
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(parse(&["--max-hops", "0"]).validate().is_err());
        assert!(parse(&["--max-hops", "65"]).validate().is_err());
        assert!(parse(&["--dns-timeout", "0"]).validate().is_err());
        assert!(parse(&["--ping-timeout", "-1"]).validate().is_err());
        assert!(parse(&["--ping-timeout", "1e300"]).validate().is_err());
        assert!(parse(&["--dns-timeout", "inf"]).validate().is_err());
    }

    #[test]
    fn test_negative_count_is_accepted() {
        let args = parse(&["-c", "-3", "example.com"]);
        assert_eq!(args.count, -3);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_huge_timeout_does_not_panic() {
        let args = parse(&["--traceroute-timeout", "1e300"]);
        assert_eq!(args.traceroute_timeout_duration(), Duration::MAX);
    }

    #[test]
    fn test_nameserver_parses_ip() {
        let args = parse(&["--nameserver", "1.1.1.1"]);
        assert_eq!(args.nameserver, Some("1.1.1.1".parse().unwrap()));
        assert!(Args::try_parse_from(["netassist", "--nameserver", "dns.google"]).is_err());
    }
}
