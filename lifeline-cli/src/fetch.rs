//! HTTP GET as a resilient action

use anyhow::Result;
use lifeline_core::AppError;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Cached form of a successful response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

/// Map a non-success status onto the error taxonomy
pub fn classify_status(status: StatusCode, url: &str) -> Option<AppError> {
    if status.is_success() || status.is_redirection() || status.is_informational() {
        return None;
    }

    let error = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AppError::authentication(format!("Not authorized to access {} ({})", url, status))
        }
        s if s.is_server_error() => {
            AppError::network(format!("Server error from {} ({})", url, status))
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            AppError::network(format!("{} is busy ({})", url, status))
        }
        _ => AppError::unknown(format!("Request to {} was rejected ({})", url, status))
            .with_retryable(false),
    };

    Some(error)
}

/// GET `url`, failing with an [`AppError`] for transport errors and bad statuses
pub async fn fetch_page(client: &Client, url: &str) -> Result<FetchedPage> {
    info!("Making HTTP request to: {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::network(format!("Request to {} failed: {}", url, e)))?;

    let status = response.status();
    debug!("HTTP response received: {}", status);

    if let Some(error) = classify_status(status, url) {
        return Err(error.into());
    }

    let body = response
        .text()
        .await
        .map_err(|e| AppError::network(format!("Reading response from {} failed: {}", url, e)))?;

    debug!("Response parsed as text: {} bytes", body.len());
    Ok(FetchedPage {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifeline_core::ErrorKind;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });

        format!("http://{}/", addr)
    }

    fn client() -> Client {
        Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap()
    }

    #[test]
    fn test_classify_status() {
        assert!(classify_status(StatusCode::OK, "u").is_none());
        assert!(classify_status(StatusCode::NOT_MODIFIED, "u").is_none());

        let auth = classify_status(StatusCode::UNAUTHORIZED, "u").unwrap();
        assert_eq!(auth.kind(), ErrorKind::Authentication);
        assert!(!auth.is_retryable());
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN, "u").unwrap().kind(),
            ErrorKind::Authentication
        );

        let server = classify_status(StatusCode::BAD_GATEWAY, "u").unwrap();
        assert_eq!(server.kind(), ErrorKind::Network);
        assert!(server.is_retryable());

        let missing = classify_status(StatusCode::NOT_FOUND, "u").unwrap();
        assert_eq!(missing.kind(), ErrorKind::Unknown);
        assert!(!missing.is_retryable());
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
        )
        .await;

        let page = fetch_page(&client(), &url).await.unwrap();
        assert_eq!(page.status, 200);
        assert_eq!(page.body, "hello");
    }

    #[tokio::test]
    async fn test_fetch_unauthorized() {
        let url = serve_once(
            "HTTP/1.1 401 Unauthorized\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;

        let err = fetch_page(&client(), &url).await.unwrap_err();
        assert_eq!(AppError::classify(&err).kind(), ErrorKind::Authentication);
    }

    #[tokio::test]
    async fn test_fetch_transport_failure_is_network() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let err = fetch_page(&client(), &url).await.unwrap_err();
        assert_eq!(AppError::classify(&err).kind(), ErrorKind::Network);
    }
}
