//! Mock DevTools endpoint for wrapper tests
//!
//! Accepts one WebSocket connection, records every command frame, injects
//! an event frame ahead of each reply, and answers commands the way the
//! browser's WebAuthn domain would.

use std::sync::{Arc, Mutex};

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

pub const MOCK_AUTHENTICATOR_ID: &str = "mock-authenticator-1";

pub struct MockCdpServer {
    pub url: String,
    pub commands: Arc<Mutex<Vec<Value>>>,
    handle: JoinHandle<()>,
}

impl MockCdpServer {
    pub async fn spawn() -> Self {
        Self::spawn_with_failure(None).await
    }

    /// A server that rejects `fail_method` with a protocol error.
    pub async fn spawn_with_failure(fail_method: Option<&'static str>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock listener");
        let port = listener.local_addr().expect("local addr").port();
        let commands: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
        let recorded = commands.clone();

        let handle = tokio::spawn(async move {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                return;
            };
            while let Some(Ok(msg)) = ws.next().await {
                let Message::Text(text) = msg else { continue };
                let frame: Value = serde_json::from_str(text.as_str()).expect("command frame");
                let id = frame["id"].clone();
                let method = frame["method"].as_str().unwrap_or("").to_string();
                recorded.lock().unwrap().push(frame);

                // Interleave an event so clients must skip non-reply frames
                let event = json!({ "method": "WebAuthn.credentialAdded", "params": {} });
                let _ = ws.send(Message::Text(event.to_string().into())).await;

                let reply = if Some(method.as_str()) == fail_method {
                    json!({
                        "id": id,
                        "error": {
                            "code": -32602,
                            "message": format!("{} rejected by mock", method),
                        },
                    })
                } else if method == "WebAuthn.addVirtualAuthenticator" {
                    json!({ "id": id, "result": { "authenticatorId": MOCK_AUTHENTICATOR_ID } })
                } else {
                    json!({ "id": id, "result": {} })
                };
                let _ = ws.send(Message::Text(reply.to_string().into())).await;
            }
        });

        Self {
            url: format!("ws://127.0.0.1:{}", port),
            commands,
            handle,
        }
    }

    /// Method names of every command received so far, in order.
    pub fn methods(&self) -> Vec<String> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| c["method"].as_str().map(String::from))
            .collect()
    }
}

impl Drop for MockCdpServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
