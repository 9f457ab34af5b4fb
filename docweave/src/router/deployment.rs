//! Deployment classification of target addresses.
//!
//! Classification is pure string matching on the host of an `http`/`https` address; no
//! network probe is made. Results are cached per address for a configurable TTL.

use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

/// Host suffixes of the hosted service used when none are configured.
pub const DEFAULT_HOSTED_SUFFIXES: &[&str] = &[
    ".atlassian.net",
    ".jira.com",
    ".jira-dev.com",
    ".example-hosted.net",
];

/// Where a target address is deployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentType {
    Hosted,
    SelfManaged,
    Unknown,
}

impl DeploymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentType::Hosted => "hosted",
            DeploymentType::SelfManaged => "self-managed",
            DeploymentType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DeploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify an address against hosted host suffixes.
///
/// Anything that is not an `http`/`https` URL with a host is [`DeploymentType::Unknown`].
pub fn classify(address: &str, hosted_suffixes: &[String]) -> DeploymentType {
    let Ok(url) = Url::parse(address.trim()) else {
        return DeploymentType::Unknown;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return DeploymentType::Unknown;
    }
    let Some(host) = url.host_str() else {
        return DeploymentType::Unknown;
    };
    let host = host.to_ascii_lowercase();
    if hosted_suffixes
        .iter()
        .any(|suffix| host_has_suffix(&host, suffix))
    {
        DeploymentType::Hosted
    } else {
        DeploymentType::SelfManaged
    }
}

fn host_has_suffix(host: &str, suffix: &str) -> bool {
    let suffix = suffix.trim().trim_start_matches('.').to_ascii_lowercase();
    !suffix.is_empty()
        && (host == suffix
            || host
                .strip_suffix(suffix.as_str())
                .is_some_and(|rest| rest.ends_with('.')))
}

/// Classifier with a TTL cache keyed by normalized address.
pub struct DeploymentDetector {
    hosted_suffixes: Vec<String>,
    ttl: Duration,
    cache: Option<Mutex<LruCache<String, (DeploymentType, Instant)>>>,
}

impl DeploymentDetector {
    pub fn new(hosted_suffixes: Vec<String>, ttl: Duration, capacity: usize) -> Self {
        DeploymentDetector {
            hosted_suffixes,
            ttl,
            cache: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    /// Classify `address`, reusing a cached result younger than the TTL.
    pub fn detect(&self, address: &str) -> DeploymentType {
        self.detect_at(address, Instant::now())
    }

    pub(crate) fn detect_at(&self, address: &str, now: Instant) -> DeploymentType {
        let key = normalize(address);
        if let Some(cache) = &self.cache {
            let fresh = cache
                .lock()
                .get(&key)
                .filter(|(_, at)| now.saturating_duration_since(*at) < self.ttl)
                .map(|(kind, _)| *kind);
            if let Some(kind) = fresh {
                return kind;
            }
        }

        let kind = classify(address, &self.hosted_suffixes);
        debug!(address = %key, deployment = %kind, "classified deployment");
        if let Some(cache) = &self.cache {
            cache.lock().put(key, (kind, now));
        }
        kind
    }

    /// Cached classification of `address`, ignoring its age.
    pub fn cached(&self, address: &str) -> Option<DeploymentType> {
        let cache = self.cache.as_ref()?;
        let cache = cache.lock();
        cache.peek(&normalize(address)).map(|(kind, _)| *kind)
    }

    pub fn clear(&self) {
        if let Some(cache) = &self.cache {
            cache.lock().clear();
        }
    }
}

impl Default for DeploymentDetector {
    fn default() -> Self {
        Self::new(
            DEFAULT_HOSTED_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            Duration::from_secs(3600),
            256,
        )
    }
}

impl fmt::Debug for DeploymentDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentDetector")
            .field("hosted_suffixes", &self.hosted_suffixes)
            .field("ttl", &self.ttl)
            .finish()
    }
}

fn normalize(address: &str) -> String {
    address.trim().trim_end_matches('/').to_ascii_lowercase()
}
