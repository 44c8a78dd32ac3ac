//! MX record lookups

use crate::config::ValidationConfig;
use crate::ConfigError;
use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::TokioAsyncResolver;
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;

/// Definitive answer to an MX query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MxAnswer {
    /// At least one MX record exists
    Found,
    /// The domain does not exist or has no MX records
    NotFound,
}

/// Transient lookup failures; never cached
#[derive(Debug, Error)]
pub enum MxLookupError {
    #[error("MX lookup for {0} timed out")]
    Timeout(String),

    #[error("MX lookup for {domain} failed: {reason}")]
    Failed { domain: String, reason: String },
}

/// Answers "does this domain accept mail?"
#[async_trait]
pub trait MxResolver: Send + Sync {
    async fn lookup_mx(&self, domain: &str) -> Result<MxAnswer, MxLookupError>;
}

/// DNS-backed resolver querying the configured nameservers
pub struct HickoryMxResolver {
    resolver: TokioAsyncResolver,
}

impl HickoryMxResolver {
    /// Builds a resolver from the validation settings
    ///
    /// Each query is tried once per nameserver with the configured timeout;
    /// retries are the validator's job.
    pub fn from_config(config: &ValidationConfig) -> Result<Self, ConfigError> {
        let ips = config
            .nameservers
            .iter()
            .map(|ns| {
                ns.parse::<IpAddr>()
                    .map_err(|_| ConfigError::InvalidNameserver(ns.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let group = NameServerConfigGroup::from_ips_clear(&ips, 53, true);
        let resolver_config = ResolverConfig::from_parts(None, vec![], group);

        let mut opts = ResolverOpts::default();
        opts.timeout = Duration::from_millis(config.query_timeout_ms);
        opts.attempts = 1;

        Ok(Self {
            resolver: TokioAsyncResolver::tokio(resolver_config, opts),
        })
    }
}

#[async_trait]
impl MxResolver for HickoryMxResolver {
    async fn lookup_mx(&self, domain: &str) -> Result<MxAnswer, MxLookupError> {
        match self.resolver.mx_lookup(domain).await {
            Ok(lookup) => {
                if lookup.iter().next().is_some() {
                    Ok(MxAnswer::Found)
                } else {
                    Ok(MxAnswer::NotFound)
                }
            }
            Err(e) => match e.kind() {
                ResolveErrorKind::NoRecordsFound { .. } => Ok(MxAnswer::NotFound),
                ResolveErrorKind::Timeout => Err(MxLookupError::Timeout(domain.to_string())),
                _ => Err(MxLookupError::Failed {
                    domain: domain.to_string(),
                    reason: e.to_string(),
                }),
            },
        }
    }
}
