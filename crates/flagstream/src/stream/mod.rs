//! Streaming update channel
//!
//! - stream manager supervising one SSE connection and its readiness signal
//! - reqwest transport with reconnect and backoff
//! - header construction for the streaming endpoint

pub mod event_source;
pub mod headers;
pub mod manager;
pub mod properties;
pub mod transport;

pub use event_source::{EventSource, EventSourceFactory, StreamEvent, StreamProcessor};
pub use headers::{build_headers, SdkInfo};
pub use manager::{InitFuture, InitState, StreamHandle, StreamManager};
pub use properties::StreamProperties;
pub use transport::{SseClient, SseClientFactory};
