pub mod http;
pub mod replay;
pub mod ws;

use crate::overlay::InboundMessage;
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;

/// Callbacks the overlay makes to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostAction {
    SubmitNews {
        headline: String,
        content: String,
        image_url: Option<String>,
    },
    DeleteArticle {
        id: i64,
    },
    CloseUi,
}

#[derive(Serialize)]
struct SubmitBody<'a> {
    headline: &'a str,
    content: &'a str,
    #[serde(rename = "imageUrl")]
    image_url: Option<&'a str>,
}

#[derive(Serialize)]
struct DeleteBody {
    id: i64,
}

impl HostAction {
    /// Callback name appended to the host base URL.
    pub fn endpoint(&self) -> &'static str {
        match self {
            HostAction::SubmitNews { .. } => "submitNews",
            HostAction::DeleteArticle { .. } => "deleteArticle",
            HostAction::CloseUi => "closeUI",
        }
    }

    pub fn body(&self) -> serde_json::Value {
        let body = match self {
            HostAction::SubmitNews {
                headline,
                content,
                image_url,
            } => serde_json::to_value(SubmitBody {
                headline: headline.as_str(),
                content: content.as_str(),
                image_url: image_url.as_deref(),
            }),
            HostAction::DeleteArticle { id } => serde_json::to_value(DeleteBody { id: *id }),
            HostAction::CloseUi => Ok(serde_json::json!({})),
        };
        // Plain structs of strings and integers always serialize.
        body.unwrap_or_else(|_| serde_json::json!({}))
    }
}

/// Outbound channel to the host. `send` must not block: delivery is
/// fire-and-forget and its outcome never reaches the caller.
pub trait HostTransport: Send + Sync {
    fn send(&self, action: HostAction);
}

/// Producer of inbound host messages.
#[async_trait]
pub trait MessageSource: Send + Sync {
    fn name(&self) -> &str;

    /// Run until the source is exhausted or fails, pushing messages on `tx`.
    async fn run(&self, tx: mpsc::Sender<InboundMessage>) -> Result<()>;
}
