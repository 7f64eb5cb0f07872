//! SSE transport over reqwest
//!
//! Maintains the long-lived streaming connection: decodes SSE framing from
//! the chunked response body, reconnects after transient failures with
//! exponential backoff and jitter, and reports every failure upstream. A
//! failure the manager would treat as terminal also ends the reconnect loop
//! here, so a closed-down stream does not keep hammering the service.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::StreamExt;
use rand::Rng;
use reqwest::header::HeaderMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::StreamError;
use crate::stream::event_source::{EventSource, EventSourceFactory, StreamEvent};
use crate::stream::properties::StreamProperties;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);
/// A connection that stayed up at least this long resets the backoff
const BACKOFF_RESET_AFTER: Duration = Duration::from_secs(60);

/// Builds [`SseClient`] instances sharing one HTTP client
pub struct SseClientFactory {
    client: reqwest::Client,
    read_timeout: Duration,
}

impl SseClientFactory {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .unwrap_or_else(|err| {
                warn!("failed to build streaming HTTP client, using defaults: {err}");
                reqwest::Client::new()
            });
        Self {
            client,
            read_timeout: config.read_timeout(),
        }
    }
}

impl EventSourceFactory for SseClientFactory {
    fn create(
        &self,
        properties: StreamProperties,
        headers: HeaderMap,
        events: mpsc::UnboundedSender<StreamEvent>,
    ) -> Arc<dyn EventSource> {
        Arc::new(SseClient {
            client: self.client.clone(),
            properties,
            headers,
            read_timeout: self.read_timeout,
            events,
            shutdown: CancellationToken::new(),
        })
    }
}

/// One logical SSE connection, reconnecting across transient failures
pub struct SseClient {
    client: reqwest::Client,
    properties: StreamProperties,
    headers: HeaderMap,
    read_timeout: Duration,
    events: mpsc::UnboundedSender<StreamEvent>,
    shutdown: CancellationToken,
}

#[async_trait]
impl EventSource for SseClient {
    async fn start(&self) -> Result<(), StreamError> {
        info!("starting SSE connection: {}", self.properties.uri());
        let client = self.client.clone();
        let properties = self.properties.clone();
        let headers = self.headers.clone();
        let read_timeout = self.read_timeout;
        let events = self.events.clone();
        let shutdown = self.shutdown.clone();
        tokio::spawn(run(
            client,
            properties,
            headers,
            read_timeout,
            events,
            shutdown,
        ));
        Ok(())
    }

    fn close(&self) {
        if !self.shutdown.is_cancelled() {
            debug!("closing SSE connection");
        }
        self.shutdown.cancel();
    }
}

/// How one connection attempt ended
enum ReadOutcome {
    /// close() was called
    Shutdown,
    /// The receiving side went away
    ChannelClosed,
    /// Server ended the response body; reconnect
    Ended,
    Failed(StreamError),
}

async fn run(
    client: reqwest::Client,
    properties: StreamProperties,
    headers: HeaderMap,
    read_timeout: Duration,
    events: mpsc::UnboundedSender<StreamEvent>,
    shutdown: CancellationToken,
) {
    let mut backoff = INITIAL_BACKOFF;
    loop {
        let connected_at = Instant::now();
        match connect_and_read(&client, &properties, &headers, read_timeout, &events, &shutdown)
            .await
        {
            ReadOutcome::Shutdown => {
                debug!("SSE read loop shut down");
                return;
            }
            ReadOutcome::ChannelClosed => {
                debug!("SSE event channel closed, stopping");
                return;
            }
            ReadOutcome::Ended => {
                debug!("SSE stream ended by server, reconnecting");
            }
            ReadOutcome::Failed(err) => {
                let recoverable = err.is_recoverable();
                warn!("SSE connection failed: {err}");
                if events.send(StreamEvent::Error(err)).is_err() {
                    return;
                }
                if !recoverable {
                    // Retrying cannot help; the manager closes us anyway
                    return;
                }
            }
        }

        if connected_at.elapsed() >= BACKOFF_RESET_AFTER {
            backoff = INITIAL_BACKOFF;
        }
        let delay = jitter(backoff);
        debug!("reconnecting in {delay:?}");
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}

async fn connect_and_read(
    client: &reqwest::Client,
    properties: &StreamProperties,
    headers: &HeaderMap,
    read_timeout: Duration,
    events: &mpsc::UnboundedSender<StreamEvent>,
    shutdown: &CancellationToken,
) -> ReadOutcome {
    let mut request = client
        .request(properties.method().clone(), properties.uri().clone())
        .headers(headers.clone());
    if let Some(body) = properties.body() {
        request = request.body(body.to_vec());
    }

    let response = tokio::select! {
        _ = shutdown.cancelled() => return ReadOutcome::Shutdown,
        result = request.send() => match result {
            Ok(response) => response,
            Err(err) => return ReadOutcome::Failed(StreamError::transport(err)),
        },
    };

    let status = response.status();
    if !status.is_success() {
        return ReadOutcome::Failed(StreamError::from_status(status));
    }
    debug!("SSE connection established ({status})");

    let mut decoder = SseDecoder::new();
    let mut body = response.bytes_stream();
    loop {
        let chunk = tokio::select! {
            _ = shutdown.cancelled() => return ReadOutcome::Shutdown,
            chunk = tokio::time::timeout(read_timeout, body.next()) => match chunk {
                Err(_) => {
                    return ReadOutcome::Failed(StreamError::transport(format!(
                        "no data received for {read_timeout:?}"
                    )))
                }
                Ok(None) => return ReadOutcome::Ended,
                Ok(Some(Err(err))) => return ReadOutcome::Failed(StreamError::transport(err)),
                Ok(Some(Ok(bytes))) => bytes,
            },
        };
        for (event_type, data) in decoder.feed(&chunk) {
            if events
                .send(StreamEvent::Message { event_type, data })
                .is_err()
            {
                return ReadOutcome::ChannelClosed;
            }
        }
    }
}

/// Half the base delay plus a random half, so reconnecting clients spread out
fn jitter(base: Duration) -> Duration {
    let millis = base.as_millis() as u64;
    Duration::from_millis(millis / 2 + rand::thread_rng().gen_range(0..=millis / 2))
}

/// Incremental SSE frame decoder. Chunk boundaries fall anywhere, so partial
/// lines are buffered until their newline arrives.
struct SseDecoder {
    buffer: String,
    event_type: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    fn new() -> Self {
        Self {
            buffer: String::new(),
            event_type: None,
            data: Vec::new(),
        }
    }

    /// Consume one chunk, returning every completed `(event_type, data)` pair
    fn feed(&mut self, bytes: &[u8]) -> Vec<(String, String)> {
        self.buffer.push_str(&String::from_utf8_lossy(bytes));
        let mut out = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            self.feed_line(line.trim_end_matches(['\n', '\r']), &mut out);
        }
        out
    }

    fn feed_line(&mut self, line: &str, out: &mut Vec<(String, String)>) {
        // Blank line dispatches the accumulated event
        if line.is_empty() {
            if !self.data.is_empty() {
                let event_type = self
                    .event_type
                    .take()
                    .unwrap_or_else(|| "message".to_string());
                out.push((event_type, self.data.join("\n")));
                self.data.clear();
            }
            self.event_type = None;
            return;
        }

        // Comment lines keep the connection warm, nothing more
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event_type = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            // "id" and "retry" are not used by this service
            _ => {}
        }
    }
}
