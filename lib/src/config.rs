//! Gateway configuration

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const DEFAULT_LEGACY_API_BASE: &str = "http://localhost:5173/api";
pub const DEFAULT_CONTENT_API_BASE: &str = "http://localhost:5173/content-api";
pub const DEFAULT_LOCAL_API_BASE: &str = "http://localhost:3001";

/// Latency added to every local-store operation so callers see
/// network-like timing.
pub const DEFAULT_LOCAL_LATENCY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

#[derive(Debug, Error)]
#[error("unknown environment `{0}`, expected `production` or `development`")]
pub struct ParseEnvironmentError(String);

impl FromStr for Environment {
    type Err = ParseEnvironmentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            _ => Err(ParseEnvironmentError(value.to_owned())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub legacy_base: Url,
    pub content_base: Url,
    pub local_base: Url,

    /// Try the local network service before the local store.
    pub use_remote_first: bool,
    pub local_latency: Duration,
}

impl GatewayConfig {
    pub fn new(legacy_base: Url, content_base: Url, local_base: Url) -> Self {
        Self {
            legacy_base,
            content_base,
            local_base,
            use_remote_first: true,
            local_latency: DEFAULT_LOCAL_LATENCY,
        }
    }

    /// Production builds never attempt the local network service.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.use_remote_first = environment == Environment::Development;
        self
    }

    pub fn with_local_latency(mut self, latency: Duration) -> Self {
        self.local_latency = latency;
        self
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new(
            Url::parse(DEFAULT_LEGACY_API_BASE).expect("invalid default legacy URL"),
            Url::parse(DEFAULT_CONTENT_API_BASE).expect("invalid default content URL"),
            Url::parse(DEFAULT_LOCAL_API_BASE).expect("invalid default local URL"),
        )
    }
}

/// Appends path segments to `base`, keeping any path the base already has.
pub fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();

    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }

    url
}
