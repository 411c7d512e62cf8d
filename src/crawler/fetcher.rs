//! HTTP transport over the anonymizing proxy
//!
//! This module handles all network requests for the crawler, including:
//! - Building HTTP clients routed through the SOCKS proxy
//! - Per-session proxy credentials so each session rides its own Tor circuit
//! - GET requests with a per-request timeout
//! - Error classification (timeout, connect, other)
//!
//! A *session* is one proxy identity. Sessions are produced by a
//! [`SessionFactory`]; the identity rotator swaps them, the engine only fetches.

use crate::config::TransportConfig;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, Proxy};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors raised by a transport
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Failed to read body of {url}: {source}")]
    Body { url: String, source: reqwest::Error },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid proxy configuration: {0}")]
    Proxy(String),
}

/// A completed HTTP exchange, whatever its status code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,

    /// Final URL after redirects
    pub final_url: String,

    /// Page body content
    pub body: String,
}

impl FetchResponse {
    /// Only a plain 200 counts as a successful fetch
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Something that can fetch a URL over one network identity
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchResponse, FetchError>;
}

/// Produces fresh transport sessions, each with a new network identity
pub trait SessionFactory: Send + Sync {
    type Session: Transport;

    fn connect(&self) -> Result<Self::Session, FetchError>;
}

/// One HTTP client bound to one proxy identity
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: Client,
    generation: u64,
}

impl HttpSession {
    /// Builds a session that bypasses the proxy, for clearnet sources
    ///
    /// Keeps the configured user agent and certificate policy.
    pub fn direct(config: &TransportConfig) -> Result<Self, FetchError> {
        let direct = TransportConfig {
            user_agent: config.user_agent.clone(),
            accept_invalid_certs: config.accept_invalid_certs,
            ..TransportConfig::direct()
        };
        Ok(Self {
            client: build_http_client(&direct, 0)?,
            generation: 0,
        })
    }

    /// Sequence number of the factory call that built this session
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[async_trait]
impl Transport for HttpSession {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    source: e,
                }
            }
        })?;

        Ok(FetchResponse {
            status,
            final_url,
            body,
        })
    }
}

/// Builds [`HttpSession`]s from the transport configuration
#[derive(Debug)]
pub struct HttpSessionFactory {
    config: TransportConfig,
    generation: AtomicU64,
}

impl HttpSessionFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            generation: AtomicU64::new(0),
        }
    }
}

impl SessionFactory for HttpSessionFactory {
    type Session = HttpSession;

    fn connect(&self) -> Result<HttpSession, FetchError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let client = build_http_client(&self.config, generation)?;
        tracing::debug!("Built transport session #{}", generation);
        Ok(HttpSession { client, generation })
    }
}

/// Builds an HTTP client for one session
///
/// # Arguments
///
/// * `config` - The transport configuration
/// * `generation` - Session number, used to derive per-session proxy credentials
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(FetchError)` - Invalid proxy URL or client build failure
///
/// # Example
///
/// ```no_run
/// use onion_archive::config::TransportConfig;
/// use onion_archive::crawler::build_http_client;
///
/// let client = build_http_client(&TransportConfig::default(), 1).unwrap();
/// ```
pub fn build_http_client(config: &TransportConfig, generation: u64) -> Result<Client, FetchError> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(Duration::from_secs(30))
        .redirect(Policy::limited(10))
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .gzip(true)
        .brotli(true);

    if config.proxy_url.is_empty() {
        // Ignore HTTP(S)_PROXY from the environment as well
        builder = builder.no_proxy();
    } else {
        let proxy_url = session_proxy_url(config, generation)?;
        let proxy = Proxy::all(proxy_url.as_str()).map_err(|e| FetchError::Proxy(e.to_string()))?;
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

/// Returns the proxy URL for a session
///
/// With circuit isolation on, each generation gets distinct SOCKS credentials.
/// Tor keeps streams with different credentials on different circuits, so a
/// new session means a new exit identity.
pub fn session_proxy_url(config: &TransportConfig, generation: u64) -> Result<Url, FetchError> {
    let mut url = Url::parse(&config.proxy_url)
        .map_err(|e| FetchError::Proxy(format!("{}: {}", config.proxy_url, e)))?;

    if config.isolate_circuits && url.scheme().starts_with("socks") {
        let username = format!("onion-archive-{}", std::process::id());
        let password = format!("circuit-{}", generation);
        url.set_username(&username)
            .map_err(|_| FetchError::Proxy(format!("cannot set credentials on {}", url)))?;
        url.set_password(Some(&password))
            .map_err(|_| FetchError::Proxy(format!("cannot set credentials on {}", url)))?;
    }

    Ok(url)
}

/// Maps a reqwest send error onto the transport error taxonomy
fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Connect {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
