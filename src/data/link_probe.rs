use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Why a link was classified as dead
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeadReason {
    /// DNS, connect, TLS or timeout failure
    Transport(String),
    /// Response arrived with a non-success status code
    Status(u16),
}

impl fmt::Display for DeadReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeadReason::Transport(details) => write!(f, "transport error: {}", details),
            DeadReason::Status(code) => write!(f, "status {}", code),
        }
    }
}

/// Outcome of a single liveness probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    Alive,
    Dead(DeadReason),
}

impl LinkStatus {
    pub fn is_alive(&self) -> bool {
        matches!(self, LinkStatus::Alive)
    }
}

/// One-shot liveness check of a URL. Never retries.
pub trait LinkProbe: Send + Sync + 'static {
    fn probe(&self, url: &str) -> impl Future<Output = LinkStatus> + Send;
}

impl<P: LinkProbe> LinkProbe for Arc<P> {
    fn probe(&self, url: &str) -> impl Future<Output = LinkStatus> + Send {
        (**self).probe(url)
    }
}
