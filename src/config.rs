//! Configuration types for docwallet

use crate::endpoints::{EndpointTemplate, RenderError};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Service location and credentials
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the extraction service (e.g. "https://api.example.com/prod")
    pub base_url: String,

    /// Static API credential (None = unauthenticated)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Header the credential is sent in (default: "x-api-key")
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: None,
            api_key_header: default_api_key_header(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Path templates for each call kind
///
/// Result retrieval is an ordered cascade: templates are tried in order and
/// the first successful response wins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Document upload (default: "/extract")
    #[serde(default = "default_submit_endpoint")]
    pub submit: EndpointTemplate,

    /// Job status lookup (default: "/status/{jobId}")
    #[serde(default = "default_status_endpoint")]
    pub status: EndpointTemplate,

    /// Result retrieval cascade, most specific first
    #[serde(default = "default_fetch_endpoints")]
    pub fetch: Vec<EndpointTemplate>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            submit: default_submit_endpoint(),
            status: default_status_endpoint(),
            fetch: default_fetch_endpoints(),
        }
    }
}

/// Status polling behavior
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Wait before each status request (default: 3000 ms)
    #[serde(default = "default_poll_interval", with = "duration_ms_serde")]
    pub interval: Duration,

    /// Give up after this long (default: None = poll until a terminal status)
    #[serde(default, with = "optional_duration_serde")]
    pub max_wait: Option<Duration>,

    /// Fail immediately on 4xx status responses other than 408/429 (default: true)
    ///
    /// When false, every non-success response is treated as transient and
    /// polling continues.
    #[serde(default = "default_true")]
    pub fail_fast_on_client_error: bool,

    /// Add random jitter (0-100% of `interval`) to each wait (default: false)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: default_poll_interval(),
            max_wait: None,
            fail_fast_on_client_error: true,
            jitter: false,
        }
    }
}

/// Main configuration for [`ExtractionClient`](crate::ExtractionClient)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Service location and credentials
    pub api: ApiConfig,

    /// Endpoint templates
    #[serde(default)]
    pub endpoints: EndpointConfig,

    /// Status polling behavior
    #[serde(default)]
    pub polling: PollConfig,
}

/// Environment variable holding the service base URL
pub const ENV_API_URL: &str = "DOCWALLET_API_URL";
/// Environment variable holding the API credential
pub const ENV_API_KEY: &str = "DOCWALLET_API_KEY";
/// Environment variable overriding the poll interval in milliseconds
pub const ENV_POLL_INTERVAL_MS: &str = "DOCWALLET_POLL_INTERVAL_MS";
/// Environment variable bounding the total poll time in seconds
pub const ENV_MAX_WAIT_SECS: &str = "DOCWALLET_MAX_WAIT_SECS";

impl Config {
    /// Create a configuration for the given base URL with all defaults
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            api: ApiConfig {
                base_url: base_url.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Set the API credential
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api.api_key = Some(api_key.into());
        self
    }

    /// Build a configuration from `DOCWALLET_*` environment variables
    ///
    /// `DOCWALLET_API_URL` is required. `DOCWALLET_API_KEY`,
    /// `DOCWALLET_POLL_INTERVAL_MS` and `DOCWALLET_MAX_WAIT_SECS` are optional;
    /// an empty API key is treated as unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_API_URL)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::config(ENV_API_URL, format!("{} not set", ENV_API_URL)))?;

        let mut config = Config::new(base_url.trim());
        config.api.api_key = lookup(ENV_API_KEY).filter(|v| !v.is_empty());

        if let Some(raw) = lookup(ENV_POLL_INTERVAL_MS) {
            let ms: u64 = raw.trim().parse().map_err(|_| {
                Error::config(ENV_POLL_INTERVAL_MS, format!("not a number: {:?}", raw))
            })?;
            config.polling.interval = Duration::from_millis(ms);
        }

        if let Some(raw) = lookup(ENV_MAX_WAIT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                Error::config(ENV_MAX_WAIT_SECS, format!("not a number: {:?}", raw))
            })?;
            config.polling.max_wait = Some(Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values that can never work
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.api.base_url)
            .map_err(|e| Error::config("api.base_url", format!("invalid URL: {}", e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(
                "api.base_url",
                format!("unsupported scheme {:?}", url.scheme()),
            ));
        }

        if self.api.api_key.is_some() && self.api.api_key_header.trim().is_empty() {
            return Err(Error::config(
                "api.api_key_header",
                "header name must not be empty when an API key is set",
            ));
        }

        if self.polling.interval.is_zero() {
            return Err(Error::config("polling.interval", "must be greater than zero"));
        }

        if self.endpoints.fetch.is_empty() {
            return Err(Error::config(
                "endpoints.fetch",
                "at least one result endpoint is required",
            ));
        }

        check_template("endpoints.submit", &self.endpoints.submit)?;
        if matches!(self.endpoints.submit.placeholders(), Ok(names) if !names.is_empty()) {
            return Err(Error::config(
                "endpoints.submit",
                "the upload endpoint cannot use placeholders",
            ));
        }
        check_template("endpoints.status", &self.endpoints.status)?;
        for template in &self.endpoints.fetch {
            check_template("endpoints.fetch", template)?;
        }

        Ok(())
    }
}

fn check_template(key: &str, template: &EndpointTemplate) -> Result<()> {
    if !template.as_str().starts_with('/') {
        return Err(Error::config(
            key,
            format!("{:?} must start with '/'", template.as_str()),
        ));
    }
    match template.unknown_placeholders() {
        Ok(unknown) if unknown.is_empty() => Ok(()),
        Ok(unknown) => Err(Error::config(
            key,
            format!(
                "{:?} uses unknown placeholder(s): {}",
                template.as_str(),
                unknown.join(", ")
            ),
        )),
        Err(RenderError::Unterminated) | Err(RenderError::Missing(_)) => Err(Error::config(
            key,
            format!("{:?} has an unterminated placeholder", template.as_str()),
        )),
    }
}

fn default_api_key_header() -> String {
    "x-api-key".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_submit_endpoint() -> EndpointTemplate {
    EndpointTemplate::new("/extract")
}

fn default_status_endpoint() -> EndpointTemplate {
    EndpointTemplate::new("/status/{jobId}")
}

fn default_fetch_endpoints() -> Vec<EndpointTemplate> {
    vec![
        EndpointTemplate::new("/wallet/{walletId}?walletVersionId={walletVersionId}"),
        EndpointTemplate::new("/wallet/latest"),
        EndpointTemplate::new("/query?walletVersionId={walletVersionId}"),
    ]
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(3)
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds)
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}

// Optional Duration serialization helper (whole seconds)
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
