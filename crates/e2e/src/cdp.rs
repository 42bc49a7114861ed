//! Chrome DevTools Protocol session
//!
//! One WebSocket connection to one DevTools target, exclusively owned by
//! its holder. Commands are JSON frames with a client-assigned id and the
//! reply carries the same id back; event frames arrive interleaved and are
//! skipped while waiting for a reply. Command parameters and results are
//! opaque `serde_json::Value` pass-throughs.

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace};

use crate::error::{E2eError, E2eResult};

/// An exclusively owned DevTools session.
pub struct CdpSession {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    ws_url: String,
    next_id: u64,
}

impl CdpSession {
    /// Connect to a target's WebSocket debugger URL.
    pub async fn connect(ws_url: &str) -> E2eResult<Self> {
        debug!("connecting CDP session to {}", ws_url);
        let (ws, _) = connect_async(ws_url).await?;
        Ok(Self {
            ws,
            ws_url: ws_url.to_string(),
            next_id: 0,
        })
    }

    /// The endpoint this session is attached to.
    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// Send one command and wait for its reply.
    pub async fn send(&mut self, method: &str, params: Value) -> E2eResult<Value> {
        self.next_id += 1;
        let id = self.next_id;
        let frame = json!({ "id": id, "method": method, "params": params });
        trace!("cdp -> {}", frame);
        self.ws.send(Message::Text(frame.to_string().into())).await?;

        loop {
            let msg = match self.ws.next().await {
                Some(msg) => msg?,
                None => return Err(E2eError::SessionClosed),
            };
            let text = match msg {
                Message::Text(text) => text,
                Message::Close(_) => return Err(E2eError::SessionClosed),
                _ => continue,
            };
            let reply: Value = serde_json::from_str(text.as_str())?;
            if reply.get("id").and_then(Value::as_u64) != Some(id) {
                // Sends are sequential, so an unmatched frame is an event
                trace!(
                    "cdp event {}",
                    reply.get("method").and_then(serde_json::Value::as_str).unwrap_or("?")
                );
                continue;
            }
            if let Some(error) = reply.get("error") {
                return Err(E2eError::Cdp {
                    code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
                    message: error
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown CDP error")
                        .to_string(),
                });
            }
            trace!("cdp <- reply {}", id);
            return Ok(reply.get("result").cloned().unwrap_or(Value::Null));
        }
    }
}
