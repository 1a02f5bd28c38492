use super::MessageSource;
use crate::overlay::InboundMessage;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Plays back a JSON-lines file of host envelopes, one per line, pausing
/// `interval` between messages. Blank lines and `#` comments are skipped.
pub struct ReplayFeed {
    path: PathBuf,
    interval: Duration,
}

impl ReplayFeed {
    pub fn new(path: PathBuf, interval: Duration) -> Self {
        Self { path, interval }
    }
}

pub async fn replay_lines<R: AsyncBufRead + Unpin>(
    reader: R,
    interval: Duration,
    tx: &mpsc::Sender<InboundMessage>,
) -> Result<usize> {
    let mut lines = reader.lines();
    let mut sent = 0;
    while let Some(line) = lines.next_line().await.context("failed to read replay line")? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let msg = match InboundMessage::parse(line) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!("skipping replay line: {:#}", e);
                continue;
            }
        };
        if sent > 0 && !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
        if tx.send(msg).await.is_err() {
            break;
        }
        sent += 1;
    }
    Ok(sent)
}

#[async_trait]
impl MessageSource for ReplayFeed {
    fn name(&self) -> &str {
        "replay"
    }

    async fn run(&self, tx: mpsc::Sender<InboundMessage>) -> Result<()> {
        let file = tokio::fs::File::open(&self.path)
            .await
            .with_context(|| format!("Failed to open replay file: {}", self.path.display()))?;
        let sent = replay_lines(BufReader::new(file), self.interval, &tx).await?;
        tracing::info!(sent, path = %self.path.display(), "replay finished");
        Ok(())
    }
}
