use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use tokio::sync::mpsc;

/// Background check for rendered image links. A link that cannot be fetched,
/// answers with an error status, or does not serve an image is reported back
/// so the overlay can hide it.
#[derive(Clone)]
pub struct ImageProber {
    client: Client,
}

impl ImageProber {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(2)
            .build()
            .context("failed to build image probe client")?;
        Ok(Self { client })
    }

    pub async fn check(&self, url: &str) -> Result<()> {
        let resp = self.client.get(url).send().await.context("image request failed")?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("image request failed ({})", status);
        }
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if !content_type.is_empty() && !content_type.starts_with("image/") {
            anyhow::bail!("not an image: {}", content_type);
        }
        Ok(())
    }

    /// Check `url` on a detached task; failures are sent on `failed_tx`.
    pub fn spawn_check(&self, url: String, failed_tx: mpsc::Sender<String>) {
        let prober = self.clone();
        tokio::spawn(async move {
            if let Err(e) = prober.check(&url).await {
                tracing::debug!(url = %url, "image probe failed: {:#}", e);
                let _ = failed_tx.send(url).await;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await;
            let _ = socket.write_all(response.as_bytes()).await;
        });
        format!("http://{}/pic.png", addr)
    }

    #[tokio::test]
    async fn test_image_response_passes() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\ncontent-type: image/png\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        )
        .await;
        let prober = ImageProber::new(Duration::from_secs(5)).unwrap();
        assert!(prober.check(&url).await.is_ok());
    }

    #[tokio::test]
    async fn test_not_found_fails() {
        let url = serve_once(
            "HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        )
        .await;
        let prober = ImageProber::new(Duration::from_secs(5)).unwrap();
        assert!(prober.check(&url).await.is_err());
    }

    #[tokio::test]
    async fn test_html_page_fails_and_is_reported() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\ncontent-type: text/html\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        )
        .await;
        let prober = ImageProber::new(Duration::from_secs(5)).unwrap();
        let (tx, mut rx) = mpsc::channel(1);
        prober.spawn_check(url.clone(), tx);
        assert_eq!(rx.recv().await, Some(url));
    }
}
