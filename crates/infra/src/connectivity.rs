//! Network availability checks
//!
//! The pipeline asks a [`ConnectivityProbe`] before every request and fails
//! fast when the device is offline. Requests only ever go to the configured
//! base URL, so probing its host answers for every request.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tollgate_domain::TollgateError;
use tracing::debug;
use url::Url;

/// Answers whether the backend is reachable right now
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_online(&self) -> bool;
}

/// How long a successful probe is trusted before the host is dialled again
const ONLINE_TTL: Duration = Duration::from_secs(5);

/// Probes reachability by opening a TCP connection to the backend host
///
/// A successful probe is remembered for a few seconds so bursts of requests
/// share one connection attempt. Failures are never cached.
#[derive(Debug)]
pub struct TcpConnectivityProbe {
    host: String,
    port: u16,
    timeout: Duration,
    online_ttl: Duration,
    last_online: Mutex<Option<Instant>>,
}

impl TcpConnectivityProbe {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
            online_ttl: ONLINE_TTL,
            last_online: Mutex::new(None),
        }
    }

    /// Override how long a successful probe is reused
    #[must_use]
    pub fn with_online_ttl(mut self, online_ttl: Duration) -> Self {
        self.online_ttl = online_ttl;
        self
    }

    fn recently_online(&self) -> bool {
        self.last_online.lock().is_some_and(|at| at.elapsed() < self.online_ttl)
    }

    /// Probe the host and port of `base_url`
    ///
    /// # Errors
    /// Returns `TollgateError::Config` when the URL has no host or no
    /// known port.
    pub fn for_base_url(base_url: &str, timeout: Duration) -> Result<Self, TollgateError> {
        let url = Url::parse(base_url)
            .map_err(|err| TollgateError::Config(format!("invalid base_url {base_url}: {err}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| TollgateError::Config(format!("base_url has no host: {base_url}")))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| TollgateError::Config(format!("base_url has no port: {base_url}")))?;

        Ok(Self::new(host.trim_start_matches('[').trim_end_matches(']'), port, timeout))
    }
}

#[async_trait]
impl ConnectivityProbe for TcpConnectivityProbe {
    async fn is_online(&self) -> bool {
        if self.recently_online() {
            return true;
        }

        let connect = TcpStream::connect((self.host.as_str(), self.port));
        let online = match tokio::time::timeout(self.timeout, connect).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(err)) => {
                debug!(host = %self.host, port = self.port, error = %err, "connectivity probe failed");
                false
            }
            Err(_) => {
                debug!(host = %self.host, port = self.port, "connectivity probe timed out");
                false
            }
        };

        *self.last_online.lock() = online.then(Instant::now);
        online
    }
}

/// Probe that always reports online
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

#[async_trait]
impl ConnectivityProbe for AlwaysOnline {
    async fn is_online(&self) -> bool {
        true
    }
}

/// Probe with a switchable answer, for tests and host-driven reachability
#[derive(Debug)]
pub struct StaticConnectivity {
    online: AtomicBool,
}

impl StaticConnectivity {
    pub const fn new(online: bool) -> Self {
        Self { online: AtomicBool::new(online) }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConnectivityProbe for StaticConnectivity {
    async fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
