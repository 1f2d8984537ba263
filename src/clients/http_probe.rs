use crate::data::{DeadReason, LinkProbe, LinkStatus};
use std::time::Duration;

/// Some sites refuse clients that don't look like a browser
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_6) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/84.0.4147.89 Safari/537.36";

/// Default per-request timeout for link probes
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// [`LinkProbe`] issuing one GET per url with a browser user agent
#[derive(Clone)]
pub struct HttpProbe {
    http: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }
}

impl LinkProbe for HttpProbe {
    async fn probe(&self, url: &str) -> LinkStatus {
        match self.http.get(url).send().await {
            Ok(resp) if resp.status().is_success() => LinkStatus::Alive,
            Ok(resp) => LinkStatus::Dead(DeadReason::Status(resp.status().as_u16())),
            Err(e) => LinkStatus::Dead(DeadReason::Transport(e.to_string())),
        }
    }
}
