//! DNS record enumeration.
//!
//! Queries a fixed list of record types one after another. Each type stands
//! alone: a failed query produces a single error line for that type and the
//! lookup moves on.

use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::rr::RecordType;
use hickory_resolver::{ResolveError, TokioResolver};
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::sink::LineSink;

/// Record types queried, in the order their lines appear
pub const RECORD_KINDS: [RecordKind; 6] = [
    RecordKind::A,
    RecordKind::Aaaa,
    RecordKind::Mx,
    RecordKind::Ns,
    RecordKind::Txt,
    RecordKind::Soa,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    A,
    Aaaa,
    Mx,
    Ns,
    Txt,
    Soa,
}

impl RecordKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Mx => "MX",
            Self::Ns => "NS",
            Self::Txt => "TXT",
            Self::Soa => "SOA",
        }
    }

    fn record_type(self) -> RecordType {
        match self {
            Self::A => RecordType::A,
            Self::Aaaa => RecordType::AAAA,
            Self::Mx => RecordType::MX,
            Self::Ns => RecordType::NS,
            Self::Txt => RecordType::TXT,
            Self::Soa => RecordType::SOA,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a single record-type query produced no records
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("query timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),
    #[error("no {0} records in the response")]
    NoAnswer(RecordKind),
    #[error("{0}")]
    Resolve(String),
}

/// Something that can answer typed queries with textual records
#[async_trait]
pub trait DnsBackend: Send + Sync {
    async fn query(&self, name: &str, kind: RecordKind) -> Result<Vec<String>, LookupError>;
}

/// Resolver capability handed to DNS runs.
///
/// `Unavailable` carries the reason shown to the user; runs given it push that
/// one line and issue no queries.
#[derive(Clone)]
pub enum Resolver {
    Ready(Arc<dyn DnsBackend>),
    Unavailable(String),
}

impl Resolver {
    pub fn ready(backend: impl DnsBackend + 'static) -> Self {
        Self::Ready(Arc::new(backend))
    }

    /// Build the resolver described by `config`: an explicit nameserver if one
    /// was given, the system configuration otherwise.
    pub fn from_config(config: &Config) -> Self {
        match config.nameserver {
            Some(ip) => Self::ready(HickoryBackend::with_nameserver(ip, config.dns_timeout)),
            None => match HickoryBackend::system(config.dns_timeout) {
                Ok(backend) => Self::ready(backend),
                Err(e) => {
                    warn!(error = %e, "system DNS configuration unavailable");
                    Self::Unavailable(format!(
                        "DNS resolver unavailable: {} (use --nameserver to pick a server)",
                        e
                    ))
                }
            },
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(_) => f.write_str("Resolver::Ready"),
            Self::Unavailable(reason) => write!(f, "Resolver::Unavailable({:?})", reason),
        }
    }
}

/// hickory-resolver backed queries
pub struct HickoryBackend {
    resolver: TokioResolver,
}

impl HickoryBackend {
    /// Use the system resolver configuration (/etc/resolv.conf or platform equivalent)
    pub fn system(query_timeout: Duration) -> Result<Self, ResolveError> {
        let mut builder = TokioResolver::builder_tokio()?;
        let opts = builder.options_mut();
        opts.timeout = query_timeout;
        opts.attempts = 1;
        Ok(Self {
            resolver: builder.build(),
        })
    }

    /// Query a single nameserver over UDP/TCP port 53
    pub fn with_nameserver(ip: IpAddr, query_timeout: Duration) -> Self {
        let group = NameServerConfigGroup::from_ips_clear(&[ip], 53, true);
        let config = ResolverConfig::from_parts(None, vec![], group);
        let mut builder =
            TokioResolver::builder_with_config(config, TokioConnectionProvider::default());
        let opts = builder.options_mut();
        opts.timeout = query_timeout;
        opts.attempts = 1;
        Self {
            resolver: builder.build(),
        }
    }
}

#[async_trait]
impl DnsBackend for HickoryBackend {
    async fn query(&self, name: &str, kind: RecordKind) -> Result<Vec<String>, LookupError> {
        let record_type = kind.record_type();
        let lookup = self
            .resolver
            .lookup(name, record_type)
            .await
            .map_err(|e| LookupError::Resolve(e.to_string()))?;

        // Answers can carry a CNAME chain; only report the type asked for
        let records: Vec<String> = lookup
            .record_iter()
            .filter(|record| record.record_type() == record_type)
            .map(|record| record.data().to_string())
            .collect();

        if records.is_empty() {
            return Err(LookupError::NoAnswer(kind));
        }
        Ok(records)
    }
}

/// Query every record type for `domain` and push the results into `sink`.
///
/// Each query is bounded by `query_timeout` on top of whatever the backend
/// enforces itself.
pub async fn run_dns_lookup<S>(domain: &str, resolver: &Resolver, query_timeout: Duration, sink: &S)
where
    S: LineSink + ?Sized,
{
    let backend = match resolver {
        Resolver::Ready(backend) => backend,
        Resolver::Unavailable(reason) => {
            sink.push(reason.clone());
            return;
        }
    };

    for kind in RECORD_KINDS {
        let result = match tokio::time::timeout(query_timeout, backend.query(domain, kind)).await {
            Ok(result) => result,
            Err(_) => Err(LookupError::Timeout(query_timeout)),
        };

        match result {
            Ok(records) => {
                debug!(domain, %kind, count = records.len(), "lookup succeeded");
                for record in records {
                    sink.push(format!("{}: {}", kind, record));
                }
            }
            Err(e) => {
                debug!(domain, %kind, error = %e, "lookup failed");
                sink.push(format!("{}: {}", kind, e));
            }
        }
    }
}
