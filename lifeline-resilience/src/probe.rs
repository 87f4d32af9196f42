//! HTTP reachability probe

use async_trait::async_trait;
use lifeline_config::ConnectivityConfig;
use reqwest::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::connectivity::ConnectivitySource;

/// Error type for probe construction
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Failed to build probe client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid probe URL: {0}")]
    InvalidUrl(String),
}

/// Connectivity source that issues HEAD requests to a known URL
///
/// Any HTTP response counts as reachable, whatever its status. Transport
/// failures and timeouts count as unreachable.
pub struct HttpProbe {
    client: Client,
    url: reqwest::Url,
    last_state: AtomicBool,
    sender: broadcast::Sender<bool>,
}

impl HttpProbe {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, ProbeError> {
        Self::with_initial_state(url, timeout, true)
    }

    pub fn with_initial_state(
        url: &str,
        timeout: Duration,
        connected: bool,
    ) -> Result<Self, ProbeError> {
        let url = reqwest::Url::parse(url).map_err(|e| ProbeError::InvalidUrl(e.to_string()))?;

        debug!(
            "Creating HttpProbe for {} with {}s timeout",
            url,
            timeout.as_secs()
        );
        let client = Client::builder().timeout(timeout).build()?;
        let (sender, _) = broadcast::channel(16);

        Ok(Self {
            client,
            url,
            last_state: AtomicBool::new(connected),
            sender,
        })
    }

    pub fn from_config(config: &ConnectivityConfig) -> Result<Self, ProbeError> {
        Self::with_initial_state(
            &config.probe_url,
            config.probe_timeout,
            config.assume_connected,
        )
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Issue one probe request
    pub async fn check(&self) -> bool {
        match self.client.head(self.url.clone()).send().await {
            Ok(response) => {
                debug!("Probe {} answered {}", self.url, response.status());
                true
            }
            Err(e) => {
                debug!("Probe {} failed: {}", self.url, e);
                false
            }
        }
    }

    /// Probe once and notify subscribers if the state changed
    pub async fn poll_once(&self) -> bool {
        let connected = self.check().await;
        let previous = self.last_state.swap(connected, Ordering::SeqCst);

        if previous != connected {
            info!(url = %self.url, connected, "Reachability changed");
            let _ = self.sender.send(connected);
        }

        connected
    }

    /// Probe every `interval` until the returned task is aborted
    pub fn start_polling(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let probe = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                probe.poll_once().await;
            }
        })
    }
}

#[async_trait]
impl ConnectivitySource for HttpProbe {
    async fn fetch(&self) -> bool {
        self.check().await
    }

    fn subscribe(&self) -> broadcast::Receiver<bool> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer every connection with `204 No Content`
    async fn spawn_responder() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket
                        .write_all(b"HTTP/1.1 204 No Content\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                        .await;
                });
            }
        });

        format!("http://{}/generate_204", addr)
    }

    /// Address nothing listens on
    async fn closed_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_reachable_endpoint() {
        let url = spawn_responder().await;
        let probe = HttpProbe::new(&url, Duration::from_secs(2)).unwrap();
        assert!(probe.check().await);
        assert!(probe.fetch().await);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let url = closed_url().await;
        let probe = HttpProbe::new(&url, Duration::from_secs(2)).unwrap();
        assert!(!probe.check().await);
    }

    #[tokio::test]
    async fn test_poll_once_emits_on_change_only() {
        let url = closed_url().await;
        let probe = HttpProbe::new(&url, Duration::from_secs(2)).unwrap();
        let mut events = probe.subscribe();

        assert!(!probe.poll_once().await);
        assert!(!probe.poll_once().await);

        assert!(!events.recv().await.unwrap());
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            HttpProbe::new("not a url", Duration::from_secs(1)),
            Err(ProbeError::InvalidUrl(_))
        ));
    }
}
