//! Target syntax validation.
//!
//! Only well-formed targets are ever handed to `ping`/`traceroute`, so this
//! check runs before anything is spawned. It never touches the network.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Maximum length of a hostname in presentation format
pub const MAX_HOST_LEN: usize = 253;

/// Maximum length of a single dot-separated label
const MAX_LABEL_LEN: usize = 63;

/// Check whether `host` is an acceptable ping/traceroute target.
///
/// Accepts hostnames (dot-separated labels of 1-63 ASCII alphanumerics or
/// hyphens, no leading/trailing hyphen per label), IPv4 dotted quads and IPv6
/// literals. Surrounding whitespace is ignored.
pub fn is_valid_host(host: &str) -> bool {
    let host = host.trim();
    if host.is_empty() {
        return false;
    }
    if host.chars().count() > MAX_HOST_LEN {
        return false;
    }

    is_hostname(host) || host.parse::<Ipv4Addr>().is_ok() || host.parse::<Ipv6Addr>().is_ok()
}

fn is_hostname(host: &str) -> bool {
    host.split('.').all(is_label)
}

fn is_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_LABEL_LEN
        && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        && !label.starts_with('-')
        && !label.ends_with('-')
}

/// A validated diagnostic target.
///
/// Holds the trimmed input exactly as typed otherwise: no lowercasing, no
/// address normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target(String);

impl Target {
    /// Validate and wrap a user-supplied target
    pub fn parse(input: &str) -> Option<Self> {
        if is_valid_host(input) {
            Some(Self(input.trim().to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Target {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
