//! Outbound channels a pipeline can write telemetry to.

use axum::extract::ws::{Message, WebSocket};
use std::future::Future;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("consumer closed the connection")]
    Closed,

    #[error("write did not complete within {0:?}")]
    Timeout(std::time::Duration),

    #[error("websocket write failed: {0}")]
    WebSocket(#[from] axum::Error),

    #[error("{0}")]
    Other(String),
}

/// Per-consumer byte stream. Only writes are used; reads exist to notice a
/// consumer going away while the loop is idle.
pub trait Transport: Send {
    fn send(&mut self, payload: String) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Resolves once the peer is gone. Must be cancel-safe.
    fn closed(&mut self) -> impl Future<Output = ()> + Send;
}

// ---------------------------------------------------------------------------
// WebSocket
// ---------------------------------------------------------------------------

pub struct WsTransport {
    socket: WebSocket,
}

impl WsTransport {
    pub fn new(socket: WebSocket) -> Self {
        Self { socket }
    }
}

impl Transport for WsTransport {
    async fn send(&mut self, payload: String) -> Result<(), TransportError> {
        self.socket.send(Message::Text(payload.into())).await?;
        Ok(())
    }

    async fn closed(&mut self) {
        loop {
            match self.socket.recv().await {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => return,
                // inbound traffic is ignored
                Some(Ok(_)) => continue,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Collects payloads in memory. Clones share the same buffer.
///
/// `fail_after(n)` makes every write after the first `n` fail, which is how
/// tests and offline runs simulate a consumer dropping.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    sent: Arc<Mutex<Vec<String>>>,
    fail_after: Option<usize>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_after(mut self, writes: usize) -> Self {
        self.fail_after = Some(writes);
        self
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Transport for MemoryTransport {
    async fn send(&mut self, payload: String) -> Result<(), TransportError> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| TransportError::Other("memory transport poisoned".into()))?;
        if self.fail_after.is_some_and(|limit| sent.len() >= limit) {
            return Err(TransportError::Closed);
        }
        sent.push(payload);
        Ok(())
    }

    async fn closed(&mut self) {
        std::future::pending::<()>().await
    }
}
