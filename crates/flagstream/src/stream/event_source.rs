//! Collaborator contracts for the streaming connection
//!
//! The manager owns one [`EventSource`] and receives its notifications over
//! an unbounded channel handed to the factory at creation time, so the
//! subscription always exists before the source starts and no early event
//! can be missed.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tokio::sync::mpsc;

use crate::error::StreamError;
use crate::stream::manager::StreamHandle;
use crate::stream::properties::StreamProperties;

/// One notification from the event source
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A server-sent event, forwarded verbatim to the processor
    Message { event_type: String, data: String },
    /// A transport or HTTP failure, classified by the manager
    Error(StreamError),
}

/// A live streaming connection. Reconnect timing after transient failures is
/// the source's own concern; the manager only starts and closes it.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Begin delivering events. Returns once delivery is underway; does not
    /// wait for the connection to be established.
    async fn start(&self) -> Result<(), StreamError>;

    /// Stop the connection. Safe to call more than once.
    fn close(&self);
}

/// Creates event sources for the manager. Injected so tests and alternative
/// transports can stand in for the real SSE client.
pub trait EventSourceFactory: Send + Sync {
    fn create(
        &self,
        properties: StreamProperties,
        headers: HeaderMap,
        events: mpsc::UnboundedSender<StreamEvent>,
    ) -> Arc<dyn EventSource>;
}

/// Consumes stream messages and decides when the locally cached flag state is
/// complete. Shared with the rest of the client; the manager never assumes
/// exclusive access.
#[async_trait]
pub trait StreamProcessor: Send + Sync {
    /// Called for every inbound message. The handle lets the processor flip
    /// the owning manager to initialized once enough data has arrived.
    async fn handle_message(&self, stream: &StreamHandle, event_type: &str, data: &str);
}
