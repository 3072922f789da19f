//! Client and transport configuration.

use std::collections::HashMap;
use std::time::Duration;

use crate::model::Engine;

/// Base URL of the hosted API.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// User agent sent with every request unless overridden.
pub const DEFAULT_USER_AGENT: &str = "gpt3-rs";

/// Request timeout applied by the default transport.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A secret string type for sensitive data like API keys.
/// Prevents accidental logging or display of secrets.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    /// Create a new secret string.
    pub fn new(s: String) -> Self {
        Self(s)
    }

    /// Get the underlying secret value.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

/// Options consumed by the HTTP transport.
///
/// # Example
/// ```rust
/// use gpt3::options::TransportOptions;
/// use std::time::Duration;
///
/// let options = TransportOptions::default()
///     .with_timeout(Duration::from_secs(10))
///     .with_proxy("http://proxy.example.com:8080".to_string());
/// assert_eq!(options.timeout, Some(Duration::from_secs(10)));
/// ```
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Request timeout. `None` disables the timeout entirely.
    pub timeout: Option<Duration>,

    /// Value of the `User-Agent` header.
    pub user_agent: String,

    /// HTTP proxy URL
    pub proxy: Option<String>,

    /// Additional HTTP headers to include in requests
    pub extra_headers: Option<HashMap<String, String>>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
            extra_headers: None,
        }
    }
}

impl TransportOptions {
    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the proxy URL.
    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Add a single extra header.
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key, value);
        self
    }
}

/// Everything a client needs to talk to the API.
///
/// Options are fixed once the client is built; every call shares them.
///
/// # Example
/// ```rust
/// use gpt3::model::Engine;
/// use gpt3::options::ClientOptions;
///
/// let options = ClientOptions::new("sk-...")
///     .with_organization("org-123")
///     .with_default_engine(Engine::Ada);
/// assert_eq!(options.base_url, "https://api.openai.com/v1");
/// assert_eq!(options.default_engine, Engine::Ada);
/// ```
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// API key sent as a bearer token
    pub api_key: SecretString,

    /// Base URL every request path is appended to
    pub base_url: String,

    /// Organization id; empty means the header is not sent
    pub organization: Option<String>,

    /// Engine used by operations that do not name one
    pub default_engine: Engine,

    pub transport: TransportOptions,
}

impl ClientOptions {
    /// Create options with the given API key and defaults for everything else.
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            organization: None,
            default_engine: Engine::default(),
            transport: TransportOptions::default(),
        }
    }

    /// Build options from `OPENAI_API_KEY`, `OPENAI_ORGANIZATION` and
    /// `OPENAI_BASE_URL`. Returns `None` when no API key is set.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok()?;
        let mut options = Self::new(api_key);
        if let Ok(organization) = std::env::var("OPENAI_ORGANIZATION") {
            options = options.with_organization(organization);
        }
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            options = options.with_base_url(base_url);
        }
        Some(options)
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the organization id.
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Set the engine used when an operation does not name one.
    pub fn with_default_engine(mut self, engine: Engine) -> Self {
        self.default_engine = engine;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.transport = self.transport.with_timeout(timeout);
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.transport = self.transport.with_user_agent(user_agent);
        self
    }

    /// Replace the transport options wholesale.
    pub fn with_transport_options(mut self, transport: TransportOptions) -> Self {
        self.transport = transport;
        self
    }

    /// The organization id, if one is set and non-empty.
    pub fn organization(&self) -> Option<&str> {
        self.organization.as_deref().filter(|org| !org.is_empty())
    }

    /// Join `path` onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ClientOptions::new("test-key");
        assert_eq!(options.base_url, DEFAULT_BASE_URL);
        assert_eq!(options.default_engine, Engine::Davinci);
        assert_eq!(options.transport.timeout, Some(Duration::from_secs(30)));
        assert_eq!(options.transport.user_agent, "gpt3-rs");
        assert!(options.organization().is_none());
    }

    #[test]
    fn test_secret_is_redacted() {
        let options = ClientOptions::new("sk-very-secret");
        let debug = format!("{:?}", options);
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_empty_organization_is_ignored() {
        let options = ClientOptions::new("k").with_organization("");
        assert!(options.organization().is_none());

        let options = ClientOptions::new("k").with_organization("org-1");
        assert_eq!(options.organization(), Some("org-1"));
    }

    #[test]
    fn test_url_join() {
        let options = ClientOptions::new("k").with_base_url("http://localhost:8080/v1/");
        assert_eq!(options.url("/engines"), "http://localhost:8080/v1/engines");
    }

    #[test]
    fn test_with_header() {
        let options = TransportOptions::default()
            .with_header("X-One".to_string(), "1".to_string())
            .with_header("X-Two".to_string(), "2".to_string());
        let headers = options.extra_headers.unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["X-Two"], "2");
    }
}
