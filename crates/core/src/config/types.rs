use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::time::Duration;

use crate::artwork::SourceTag;
use crate::source::Tier;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub aggregator: AggregatorConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

impl Config {
    /// Deadline for one call to `tag`.
    ///
    /// Resolution order: per-source override, built-in default for the
    /// multi-call sources, then the tier default.
    pub fn deadline_for(&self, tag: SourceTag, tier: Tier) -> Duration {
        let ms = self
            .sources
            .get(tag)
            .deadline_ms
            .or_else(|| builtin_deadline_ms(tag))
            .unwrap_or(match tier {
                Tier::Fast => self.aggregator.fast_deadline_ms,
                Tier::Slow => self.aggregator.slow_deadline_ms,
            });
        Duration::from_millis(ms)
    }
}

/// Sources that issue one request per item need more headroom.
fn builtin_deadline_ms(tag: SourceTag) -> Option<u64> {
    match tag {
        SourceTag::Met => Some(12_000),
        SourceTag::Nypl => Some(20_000),
        _ => None,
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Outbound HTTP client settings shared by every source.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Hard per-request timeout. Bounds work left running after a soft deadline.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_pool_max_idle")]
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout(),
            pool_max_idle_per_host: default_pool_max_idle(),
        }
    }
}

fn default_user_agent() -> String {
    format!("ArtAdvisor/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout() -> u64 {
    30
}

fn default_pool_max_idle() -> usize {
    8
}

/// Fan-out and tiering settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AggregatorConfig {
    /// Count used when a request does not specify one.
    #[serde(default = "default_count")]
    pub default_count: usize,
    /// Upper bound on any requested count.
    #[serde(default = "default_max_count")]
    pub max_count: usize,
    /// Fast-tier artworks needed to answer an initial fetch without waiting
    /// for the slow tier.
    #[serde(default = "default_fast_tier_threshold")]
    pub fast_tier_threshold: usize,
    #[serde(default = "default_fast_deadline")]
    pub fast_deadline_ms: u64,
    #[serde(default = "default_slow_deadline")]
    pub slow_deadline_ms: u64,
    /// When false, initial fetches wait for every source.
    #[serde(default = "default_true")]
    pub enable_tiering: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            default_count: default_count(),
            max_count: default_max_count(),
            fast_tier_threshold: default_fast_tier_threshold(),
            fast_deadline_ms: default_fast_deadline(),
            slow_deadline_ms: default_slow_deadline(),
            enable_tiering: true,
        }
    }
}

fn default_count() -> usize {
    30
}

fn default_max_count() -> usize {
    100
}

fn default_fast_tier_threshold() -> usize {
    10
}

fn default_fast_deadline() -> u64 {
    8_000
}

fn default_slow_deadline() -> u64 {
    15_000
}

fn default_true() -> bool {
    true
}

/// Per-source settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Override the upstream API root (used for testing and mirrors).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,
    /// API key or token for credential-gated sources.
    #[serde(default, alias = "api_token", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
            deadline_ms: None,
            api_key: None,
        }
    }
}

impl SourceConfig {
    /// The credential, if set to something non-empty.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// One [`SourceConfig`] per museum.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub met: SourceConfig,
    #[serde(default)]
    pub artic: SourceConfig,
    #[serde(default)]
    pub cleveland: SourceConfig,
    #[serde(default)]
    pub vam: SourceConfig,
    #[serde(default)]
    pub rijks: SourceConfig,
    #[serde(default)]
    pub harvard: SourceConfig,
    #[serde(default)]
    pub smithsonian: SourceConfig,
    #[serde(default)]
    pub europeana: SourceConfig,
    #[serde(default)]
    pub nypl: SourceConfig,
}

impl SourcesConfig {
    pub fn get(&self, tag: SourceTag) -> &SourceConfig {
        match tag {
            SourceTag::Met => &self.met,
            SourceTag::Artic => &self.artic,
            SourceTag::Cleveland => &self.cleveland,
            SourceTag::Vam => &self.vam,
            SourceTag::Rijks => &self.rijks,
            SourceTag::Harvard => &self.harvard,
            SourceTag::Smithsonian => &self.smithsonian,
            SourceTag::Europeana => &self.europeana,
            SourceTag::Nypl => &self.nypl,
        }
    }
}

/// Sanitized config for API responses (credentials redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub http: HttpConfig,
    pub aggregator: AggregatorConfig,
    pub sources: BTreeMap<String, SanitizedSourceConfig>,
}

/// Sanitized source config (credential hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSourceConfig {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub deadline_ms: u64,
    pub api_key_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let sources = SourceTag::ALL
            .iter()
            .map(|tag| {
                let source = config.sources.get(*tag);
                (
                    tag.as_str().to_string(),
                    SanitizedSourceConfig {
                        enabled: source.enabled,
                        base_url: source.base_url.clone(),
                        deadline_ms: config
                            .deadline_for(*tag, Tier::of(*tag))
                            .as_millis() as u64,
                        api_key_configured: source.credential().is_some(),
                    },
                )
            })
            .collect();

        Self {
            server: config.server.clone(),
            http: config.http.clone(),
            aggregator: config.aggregator.clone(),
            sources,
        }
    }
}
