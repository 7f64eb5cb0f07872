//! Flagstream client SDK
//!
//! Keeps local feature-flag state fresh over a server-sent-event stream:
//! - streaming update manager with a one-shot readiness signal
//! - user context model with private-attribute redaction for events
//! - diagnostic identifiers for service-side correlation
//!
//! The [`stream::StreamManager`] is the entry point: give it stream
//! properties, configuration, and a [`stream::StreamProcessor`], call
//! `start`, and await the returned future to know when the stream is live.

pub mod config;
pub mod diagnostic;
pub mod error;
pub mod events;
pub mod stream;
pub mod user;

pub use config::{Config, ConfigBuilder};
pub use diagnostic::DiagnosticId;
pub use error::{ConfigError, ErrorKind, StreamError};
pub use stream::{
    EventSource, EventSourceFactory, InitFuture, InitState, StreamEvent, StreamHandle,
    StreamManager, StreamProcessor, StreamProperties,
};
pub use user::{User, UserBuilder};
