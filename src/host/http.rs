use super::{HostAction, HostTransport};
use anyhow::{Context, Result};
use reqwest::Client;
use tokio::runtime::Handle;

/// Posts host callbacks as JSON to `<base_url>/<endpoint>`.
pub struct HttpHostTransport {
    client: Client,
    base_url: String,
    runtime: Handle,
}

impl HttpHostTransport {
    /// Must be called from inside a tokio runtime; deliveries are spawned on it.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(4)
            .build()
            .context("failed to build HTTP client")?;
        let runtime = Handle::try_current().context("host transport needs a tokio runtime")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            runtime,
        })
    }

    pub fn url_for(&self, action: &HostAction) -> String {
        format!("{}/{}", self.base_url, action.endpoint())
    }
}

impl HostTransport for HttpHostTransport {
    fn send(&self, action: HostAction) {
        let client = self.client.clone();
        let url = self.url_for(&action);
        let endpoint = action.endpoint();
        let body = action.body();

        self.runtime.spawn(async move {
            match client.post(&url).json(&body).send().await {
                Ok(resp) if resp.status().is_success() => {
                    tracing::debug!(endpoint, "host callback delivered");
                }
                Ok(resp) => {
                    tracing::warn!(endpoint, status = %resp.status(), "host callback rejected");
                }
                Err(e) => {
                    tracing::error!(endpoint, "host callback failed: {:#}", e);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_url_for_trims_slash() {
        let transport = HttpHostTransport::new("https://newspaper/").unwrap();
        assert_eq!(
            transport.url_for(&HostAction::CloseUi),
            "https://newspaper/closeUI"
        );
    }

    #[tokio::test]
    async fn test_posts_json_body() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let transport = HttpHostTransport::new(&format!("http://{}", addr)).unwrap();

        transport.send(HostAction::DeleteArticle { id: 7 });

        let request = tokio::time::timeout(Duration::from_secs(5), async {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if String::from_utf8_lossy(&buf).contains(r#"{"id":7}"#) {
                    break;
                }
            }
            socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n")
                .await
                .unwrap();
            String::from_utf8_lossy(&buf).to_string()
        })
        .await
        .unwrap();

        assert!(request.starts_with("POST /deleteArticle HTTP/1.1"));
        assert!(request.to_lowercase().contains("content-type: application/json"));
        assert!(request.contains(r#"{"id":7}"#));
    }

    #[tokio::test]
    async fn test_unreachable_host_does_not_panic() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let transport = HttpHostTransport::new(&format!("http://{}", addr)).unwrap();
        transport.send(HostAction::CloseUi);
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}
