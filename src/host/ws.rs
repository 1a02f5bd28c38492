use super::MessageSource;
use crate::overlay::InboundMessage;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Websocket connection to the host's message bridge. Each text frame is one
/// inbound envelope. Reconnects forever until the receiver goes away.
pub struct WsFeed {
    ws_url: String,
    reconnect_delay: Duration,
}

impl WsFeed {
    pub fn new(ws_url: &str, reconnect_delay: Duration) -> Self {
        Self {
            ws_url: ws_url.to_string(),
            reconnect_delay,
        }
    }

    async fn connect_and_listen(&self, tx: &mpsc::Sender<InboundMessage>) -> Result<()> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(self.ws_url.as_str())
            .await
            .context("WS connection failed")?;
        let (mut write, mut read) = ws_stream.split();
        tracing::info!(url = %self.ws_url, "host feed connected");

        while let Some(msg) = read.next().await {
            let msg = msg.context("WS read error")?;
            match msg {
                Message::Text(text) => {
                    if !forward(&text, tx).await {
                        return Ok(());
                    }
                }
                Message::Ping(data) => {
                    write.send(Message::Pong(data)).await?;
                }
                Message::Close(_) => {
                    tracing::debug!("host feed received close frame");
                    break;
                }
                _ => {}
            }
        }

        Ok(())
    }
}

/// Parse one frame and pass it on. Returns false once the receiver is gone.
async fn forward(text: &str, tx: &mpsc::Sender<InboundMessage>) -> bool {
    match InboundMessage::parse(text) {
        Ok(msg) => tx.send(msg).await.is_ok(),
        Err(e) => {
            tracing::warn!("host message parse error: {:#}", e);
            true
        }
    }
}

#[async_trait]
impl MessageSource for WsFeed {
    fn name(&self) -> &str {
        "websocket"
    }

    async fn run(&self, tx: mpsc::Sender<InboundMessage>) -> Result<()> {
        loop {
            match self.connect_and_listen(&tx).await {
                Ok(()) => tracing::warn!("host feed closed, reconnecting..."),
                Err(e) => tracing::error!(
                    "host feed error: {:#}, reconnecting in {}s...",
                    e,
                    self.reconnect_delay.as_secs()
                ),
            }
            if tx.is_closed() {
                return Ok(());
            }
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_forward_skips_garbage() {
        let (tx, mut rx) = mpsc::channel(4);
        assert!(forward("not json", &tx).await);
        assert!(forward(r#"{"type":"hide"}"#, &tx).await);
        assert_eq!(rx.recv().await, Some(InboundMessage::Hide));
    }

    #[tokio::test]
    async fn test_forward_reports_closed_receiver() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        assert!(!forward(r#"{"type":"hide"}"#, &tx).await);
    }

    #[tokio::test]
    async fn test_reads_frames_from_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            ws.send(Message::Text(r#"{"type":"open","articles":[{"id":1}]}"#.to_string()))
                .await
                .unwrap();
            ws.send(Message::Text(r#"{"type":"hide"}"#.to_string()))
                .await
                .unwrap();
            let _ = ws.close(None).await;
        });

        let feed = WsFeed::new(&format!("ws://{}", addr), Duration::from_millis(50));
        let (tx, mut rx) = mpsc::channel(8);
        let handle = tokio::spawn(async move { feed.run(tx).await });

        match rx.recv().await {
            Some(InboundMessage::Open { articles }) => assert_eq!(articles[0].id, 1),
            other => panic!("expected open, got {:?}", other),
        }
        assert_eq!(rx.recv().await, Some(InboundMessage::Hide));
        drop(rx);
        handle.abort();
    }
}
