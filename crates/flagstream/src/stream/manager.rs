//! Streaming update manager
//!
//! Supervises one event source connection: forwards inbound messages to the
//! stream processor, classifies failures into recoverable vs. unrecoverable,
//! and resolves a one-shot readiness future exactly once. Handlers may race
//! from different tasks; whichever terminal transition takes the completion
//! guard first wins.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ErrorKind, StreamError};
use crate::stream::event_source::{
    EventSource, EventSourceFactory, StreamEvent, StreamProcessor,
};
use crate::stream::headers::{build_headers, SdkInfo};
use crate::stream::properties::StreamProperties;
use crate::stream::transport::SseClientFactory;

/// Where the readiness future currently stands
#[derive(Debug, Clone, PartialEq)]
pub enum InitState {
    Pending,
    Ready,
    Failed(StreamError),
}

/// Completion state shared by the manager, its dispatch task, and every
/// readiness handle it gives out.
struct Shared {
    /// Guards the single transition out of Pending
    resolved: Mutex<bool>,
    ready_tx: watch::Sender<InitState>,
    initialized: AtomicBool,
    disposed: AtomicBool,
}

impl Shared {
    fn new() -> Self {
        let (ready_tx, _) = watch::channel(InitState::Pending);
        Self {
            resolved: Mutex::new(false),
            ready_tx,
            initialized: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
        }
    }

    /// First caller wins; later calls are no-ops and return false.
    fn resolve(&self, state: InitState) -> bool {
        let mut resolved = self.resolved.lock();
        if *resolved {
            return false;
        }
        *resolved = true;
        // send_replace stores the value even when no handle is subscribed yet
        self.ready_tx.send_replace(state);
        true
    }
}

/// Control surface handed to the stream processor (and exposed on the
/// manager itself) for flipping the initialized state.
#[derive(Clone)]
pub struct StreamHandle {
    shared: Arc<Shared>,
}

impl StreamHandle {
    /// Mark the stream (un)initialized. The first `true` while the readiness
    /// future is pending resolves it; this is the only success path. Setting
    /// `false` later only updates the flag, the future stays resolved.
    pub fn set_initialized(&self, value: bool) {
        self.shared.initialized.store(value, Ordering::SeqCst);
        if value && self.shared.resolve(InitState::Ready) {
            info!("stream initialized");
        }
    }

    pub fn initialized(&self) -> bool {
        self.shared.initialized.load(Ordering::SeqCst)
    }
}

/// Read-only handle to the manager's one-shot readiness signal
pub struct InitFuture {
    rx: watch::Receiver<InitState>,
}

impl InitFuture {
    pub fn state(&self) -> InitState {
        self.rx.borrow().clone()
    }

    pub fn is_completed(&self) -> bool {
        !matches!(*self.rx.borrow(), InitState::Pending)
    }

    /// Wait for the terminal state: `Ok(true)` once the stream is live, or
    /// the failure that killed the connection.
    ///
    /// A manager disposed while still pending never resolves this future;
    /// disposal means the caller no longer cares. Callers that need a bounded
    /// wait must race this against their own timeout or shutdown signal.
    pub async fn wait(mut self) -> Result<bool, StreamError> {
        loop {
            let state = self.rx.borrow_and_update().clone();
            match state {
                InitState::Ready => return Ok(true),
                InitState::Failed(err) => return Err(err),
                InitState::Pending => {
                    if self.rx.changed().await.is_err() {
                        // Every owner of the manager is gone without a
                        // terminal event. Same contract as early disposal:
                        // stay pending.
                        std::future::pending::<()>().await;
                    }
                }
            }
        }
    }
}

/// Owns one event source and reports the stream's health to the caller
pub struct StreamManager {
    properties: StreamProperties,
    config: Config,
    processor: Arc<dyn StreamProcessor>,
    factory: Arc<dyn EventSourceFactory>,
    shared: Arc<Shared>,
    started: AtomicBool,
    source: Mutex<Option<Arc<dyn EventSource>>>,
    dispatch: Mutex<Option<JoinHandle<()>>>,
}

impl StreamManager {
    pub fn new(
        properties: StreamProperties,
        config: Config,
        processor: Arc<dyn StreamProcessor>,
        factory: Arc<dyn EventSourceFactory>,
    ) -> Self {
        Self {
            properties,
            config,
            processor,
            factory,
            shared: Arc::new(Shared::new()),
            started: AtomicBool::new(false),
            source: Mutex::new(None),
            dispatch: Mutex::new(None),
        }
    }

    /// Manager wired to the built-in SSE transport
    pub fn with_default_transport(
        properties: StreamProperties,
        config: Config,
        processor: Arc<dyn StreamProcessor>,
    ) -> Self {
        let factory = Arc::new(SseClientFactory::new(&config));
        Self::new(properties, config, processor, factory)
    }

    /// Open the connection and return the readiness future without blocking.
    /// A manager is started once; repeated calls only hand back another
    /// handle to the same future.
    pub fn start(&self) -> InitFuture {
        let future = InitFuture {
            rx: self.shared.ready_tx.subscribe(),
        };
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("stream manager already started, ignoring");
            return future;
        }

        let headers = build_headers(&self.config, &SdkInfo::current());
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let source = self
            .factory
            .create(self.properties.clone(), headers, events_tx);
        *self.source.lock() = Some(source.clone());

        debug!("stream manager starting: {}", self.properties.uri());
        let task = tokio::spawn(dispatch(
            events_rx,
            self.processor.clone(),
            source.clone(),
            self.shared.clone(),
        ));
        *self.dispatch.lock() = Some(task);

        let shared = self.shared.clone();
        tokio::spawn(async move {
            if let Err(err) = source.start().await {
                handle_stream_error(&shared, source.as_ref(), err);
            }
        });

        future
    }

    /// See [`StreamHandle::set_initialized`]
    pub fn set_initialized(&self, value: bool) {
        self.handle().set_initialized(value);
    }

    pub fn initialized(&self) -> bool {
        self.shared.initialized.load(Ordering::SeqCst)
    }

    pub fn handle(&self) -> StreamHandle {
        StreamHandle {
            shared: self.shared.clone(),
        }
    }

    /// Close the connection and stop all callbacks. Idempotent. A readiness
    /// future still pending at this point stays pending; disposal is not a
    /// failure signal.
    pub fn dispose(&self) {
        if self.shared.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("disposing stream manager");
        if let Some(source) = self.source.lock().take() {
            source.close();
        }
        if let Some(task) = self.dispatch.lock().take() {
            task.abort();
        }
    }
}

impl Drop for StreamManager {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Forward messages to the processor and classify errors until the channel
/// drains, the manager is disposed, or a terminal failure ends the stream.
async fn dispatch(
    mut events: mpsc::UnboundedReceiver<StreamEvent>,
    processor: Arc<dyn StreamProcessor>,
    source: Arc<dyn EventSource>,
    shared: Arc<Shared>,
) {
    let handle = StreamHandle {
        shared: shared.clone(),
    };
    while let Some(event) = events.recv().await {
        if shared.disposed.load(Ordering::SeqCst) {
            break;
        }
        match event {
            StreamEvent::Message { event_type, data } => {
                debug!("stream message: {event_type} ({} bytes)", data.len());
                processor.handle_message(&handle, &event_type, &data).await;
            }
            StreamEvent::Error(err) => {
                if handle_stream_error(&shared, source.as_ref(), err) {
                    break;
                }
            }
        }
    }
}

/// Returns true when the failure was terminal and dispatching must stop
fn handle_stream_error(shared: &Shared, source: &dyn EventSource, err: StreamError) -> bool {
    match err.kind() {
        ErrorKind::Unrecoverable => {
            warn!("terminal stream failure: {err}");
            source.close();
            shared.resolve(InitState::Failed(err));
            true
        }
        ErrorKind::Recoverable => {
            // The transport retries on its own; nothing to surface
            debug!("transient stream failure: {err}");
            false
        }
    }
}
