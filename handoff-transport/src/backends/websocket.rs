// ABOUTME: WebSocket push channel at `{push_url}/ws/{session_id}`.
// ABOUTME: Spawns a reader task with a ping keepalive and forwards parsed frames as a stream.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::error::{Result, TransportError};
use crate::event::{parse_push_event, PushEvent, PING_FRAME};
use crate::traits::{PushConnector, PushStream};
use crate::types::SessionId;

/// Buffered push frames per connection; the session core drains quickly
const PUSH_CHANNEL_BUFFER: usize = 64;

/// Opens session-scoped WebSocket connections to the middleware
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    push_base: url::Url,
    keepalive: Duration,
}

impl WebSocketConnector {
    /// `push_base` must use the ws:// or wss:// scheme
    pub fn new(push_base: &str, keepalive: Duration) -> Result<Self> {
        let parsed = url::Url::parse(push_base)
            .map_err(|e| TransportError::InvalidRequest(format!("invalid push url: {}", e)))?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(TransportError::InvalidRequest(format!(
                "push url must use ws:// or wss://, got {}",
                parsed.scheme()
            )));
        }
        if keepalive.is_zero() {
            return Err(TransportError::InvalidRequest(
                "keepalive interval must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            push_base: parsed,
            keepalive,
        })
    }

    /// Full endpoint for one session, with the id percent-encoded
    pub fn push_url(&self, session_id: &SessionId) -> Result<String> {
        let mut url = self.push_base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                TransportError::InvalidRequest(format!("{} cannot be a base URL", self.push_base))
            })?
            .pop_if_empty()
            .push("ws")
            .push(session_id.as_str());
        Ok(url.to_string())
    }
}

#[async_trait]
impl PushConnector for WebSocketConnector {
    async fn connect(&self, session_id: &SessionId) -> Result<PushStream> {
        let url = self.push_url(session_id)?;
        tracing::debug!(%url, "Opening push channel");

        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::ChannelDropped(e.to_string()))?;
        let (mut write, mut read) = ws_stream.split();
        let (tx, rx) = mpsc::channel::<Result<PushEvent>>(PUSH_CHANNEL_BUFFER);

        let keepalive = self.keepalive;
        let session_id = session_id.clone();
        tokio::spawn(async move {
            let mut ping = tokio::time::interval(keepalive);
            // First tick fires immediately
            ping.tick().await;

            loop {
                tokio::select! {
                    _ = tx.closed() => {
                        tracing::debug!(session_id = %session_id, "Push stream dropped by consumer");
                        let _ = write.close().await;
                        break;
                    }
                    _ = ping.tick() => {
                        if let Err(e) = write.send(Message::Text(PING_FRAME.into())).await {
                            tracing::warn!(session_id = %session_id, error = %e, "Keepalive failed");
                            let _ = tx.send(Err(TransportError::ChannelDropped(e.to_string()))).await;
                            break;
                        }
                    }
                    frame = read.next() => {
                        match frame {
                            Some(Ok(Message::Text(text))) => {
                                if tx.send(parse_push_event(text.as_str())).await.is_err() {
                                    break;
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                tracing::info!(session_id = %session_id, "Push channel closed by server");
                                break;
                            }
                            Some(Ok(_)) => {} // Binary, ping and pong frames carry no events
                            Some(Err(e)) => {
                                tracing::warn!(session_id = %session_id, error = %e, "Push channel error");
                                let _ = tx.send(Err(TransportError::ChannelDropped(e.to_string()))).await;
                                break;
                            }
                        }
                    }
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}
