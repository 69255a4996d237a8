//! Client session: high-level operations over one spawned server process.
//!
//! A [`McplClient`] owns the transport, the background reader and stderr
//! tasks, the pending-request table, and the event buffers. Counters and
//! buffers are fields of the session object, not process-wide globals, so
//! multiple sessions can coexist without shared state.
//!
//! Submodules:
//! - `correlator`: request-id allocation and response correlation.
//! - `dispatcher`: the inbound frame reader and auto-reply loop.
//! - `events`: the three append-only event buffers and passive queries.
//! - `lifecycle`: process-group termination escalation.

pub mod correlator;
pub mod dispatcher;
pub mod events;
mod lifecycle;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::process::{Child, ChildStdin};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::rpc;
use crate::transport::spawner;
use crate::transport::stderr::{self, StderrBuffer};
use crate::transport::writer::LineWriter;
use crate::{ClientError, Result};

use correlator::Correlator;
use events::EventBuffers;

/// Handle to one MCPL session: a spawned server process plus the background
/// tasks and shared state driving its stdio protocol.
///
/// All operations take `&self`; the client is cheap to share behind an
/// [`Arc`] and any number of callers may issue requests concurrently, each
/// blocking only on its own response.
#[derive(Debug)]
pub struct McplClient {
    config: ClientConfig,
    writer: Arc<LineWriter<ChildStdin>>,
    correlator: Arc<Correlator>,
    buffers: Arc<EventBuffers>,
    stderr_buf: StderrBuffer,
    closed: Arc<AtomicBool>,
    close_started: AtomicBool,
    cancel: CancellationToken,
    child: Mutex<Child>,
    pid: Option<u32>,
}

impl McplClient {
    /// Spawn the server process described by `config` and start the
    /// background reader and stderr-capture tasks.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Launch`] when the process cannot be started.
    pub fn spawn(config: ClientConfig) -> Result<Self> {
        let conn = spawner::spawn_process(&config)?;

        let writer = Arc::new(LineWriter::new(conn.stdin));
        let correlator = Arc::new(Correlator::new());
        let buffers = Arc::new(EventBuffers::new());
        let stderr_buf: StderrBuffer = Arc::default();
        let closed = Arc::new(AtomicBool::new(false));
        let cancel = CancellationToken::new();

        // Dropping the handles detaches the tasks; both exit on stream EOF
        // or when the cancellation token fires.
        drop(tokio::spawn(dispatcher::run_reader(
            conn.stdout,
            Arc::clone(&writer),
            Arc::clone(&correlator),
            Arc::clone(&buffers),
            Arc::clone(&closed),
            cancel.clone(),
        )));
        drop(tokio::spawn(stderr::run_stderr_capture(
            conn.stderr,
            Arc::clone(&stderr_buf),
            cancel.clone(),
        )));

        Ok(Self {
            config,
            writer,
            correlator,
            buffers,
            stderr_buf,
            closed,
            close_started: AtomicBool::new(false),
            cancel,
            child: Mutex::new(conn.child),
            pid: conn.pid,
        })
    }

    /// Send a request and await its response under `timeout`.
    ///
    /// The calling task blocks on its own completion slot; responses for
    /// other outstanding requests resolve independently in whatever order
    /// they arrive.
    ///
    /// # Errors
    ///
    /// - [`ClientError::TransportClosed`] — the session is closed, the write
    ///   failed, or the stream died while awaiting the response.
    /// - [`ClientError::Timeout`] — no matching response within `timeout`.
    ///   The pending entry is removed; a response arriving later for this id
    ///   is dropped without affecting any other pending request.
    /// - [`ClientError::Rpc`] — the peer answered with an `error` payload.
    pub async fn request(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Duration,
    ) -> Result<Value> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ClientError::TransportClosed("session is closed".into()));
        }

        let id = self.correlator.next_id();
        let rx = self.correlator.register(id);

        if let Err(err) = self.writer.send(&rpc::request(id, method, params)).await {
            self.correlator.remove(id);
            self.closed.store(true, Ordering::SeqCst);
            return Err(err);
        }

        match tokio::time::timeout(timeout, rx).await {
            Err(_elapsed) => {
                self.correlator.remove(id);
                Err(ClientError::Timeout(format!(
                    "no response to {method} (id={id}) within {timeout:?}"
                )))
            }
            Ok(Err(_closed)) => Err(ClientError::TransportClosed(format!(
                "stream closed while awaiting response to {method} (id={id})"
            ))),
            Ok(Ok(Ok(result))) => Ok(result),
            Ok(Ok(Err(error))) => Err(ClientError::Rpc(error)),
        }
    }

    /// Perform the capability-negotiation handshake.
    ///
    /// Sends `initialize` with the protocol version, the declared MCPL
    /// capability flags, and the client identity, then the one-way
    /// `notifications/initialized` notification. The handshake is not
    /// complete as a protocol matter until that follow-up is sent, even
    /// though no reply is expected for it.
    ///
    /// Returns the server's initialize result (identity and capabilities).
    ///
    /// # Errors
    ///
    /// Propagates [`Self::request`] failures, plus
    /// [`ClientError::TransportClosed`] when the follow-up notification
    /// cannot be written.
    pub async fn handshake(&self) -> Result<Value> {
        let params = json!({
            "protocolVersion": rpc::PROTOCOL_VERSION,
            "capabilities": {
                "experimental": {
                    "mcpl": {
                        "version": rpc::MCPL_VERSION,
                        "pushEvents": self.config.push_events,
                        "channels": self.config.channels,
                        "rollback": self.config.rollback,
                    }
                }
            },
            "clientInfo": {
                "name": self.config.client_name,
                "version": self.config.client_version,
            },
        });

        let result = self
            .request("initialize", Some(params), self.config.request_timeout())
            .await?;

        if let Err(err) = self
            .writer
            .send(&rpc::notification("notifications/initialized", None))
            .await
        {
            self.closed.store(true, Ordering::SeqCst);
            return Err(err);
        }

        info!("handshake complete");
        Ok(result)
    }

    /// Invoke a server tool by name.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::request`] failures.
    pub async fn call_tool(&self, name: &str, args: Option<Value>) -> Result<Value> {
        let mut params = json!({ "name": name });
        if let (Some(args), Some(obj)) = (args, params.as_object_mut()) {
            obj.insert("arguments".into(), args);
        }
        self.request("tools/call", Some(params), self.config.request_timeout())
            .await
    }

    /// List the tools the server exposes.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::request`] failures.
    pub async fn list_tools(&self) -> Result<Value> {
        self.request("tools/list", None, self.config.request_timeout())
            .await
    }

    /// List the server's active channels.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::request`] failures.
    pub async fn list_channels(&self) -> Result<Value> {
        self.request("channels/list", None, self.config.request_timeout())
            .await
    }

    /// Publish a domain payload to `channel_id`, wrapped as a text content
    /// block. Returns the server's delivery acknowledgement.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::request`] failures; [`ClientError::Io`] when the
    /// payload cannot be serialized.
    pub async fn publish(&self, channel_id: &str, payload: &Value) -> Result<Value> {
        let text = serde_json::to_string(payload)
            .map_err(|e| ClientError::Io(format!("failed to serialise payload: {e}")))?;
        let params = json!({
            "channelId": channel_id,
            "content": [{ "type": "text", "text": text }],
        });
        self.request("channels/publish", Some(params), self.config.request_timeout())
            .await
    }

    /// Collect the events that arrive strictly during `window`.
    ///
    /// Buffer lengths are snapshotted before sleeping, so events already
    /// present at call time are excluded even under concurrent appends.
    /// Returns `(push_events, incoming_events)` appended after the snapshot.
    pub async fn collect_events(&self, window: Duration) -> (Vec<Value>, Vec<Value>) {
        let snap = self.buffers.snapshot();
        tokio::time::sleep(window).await;
        (
            self.buffers.push_events_from(snap.push_events),
            self.buffers.incoming_from(snap.incoming),
        )
    }

    /// Wait until an entry in the channel-incoming buffer satisfies
    /// `predicate`, polling at a fixed interval.
    ///
    /// Entries already buffered before the call are examined first; `None`
    /// means the deadline elapsed without a match.
    pub async fn wait_for_event<F>(&self, predicate: F, timeout: Duration) -> Option<Value>
    where
        F: Fn(&Value) -> bool,
    {
        events::wait_for_match(&self.buffers, timeout, |entries| {
            entries.iter().find(|entry| predicate(entry)).cloned()
        })
        .await
    }

    /// Wait for a channel-incoming event whose text payload is a JSON object
    /// with `"type"` equal to `event_type`.
    ///
    /// Scans `messages[].content[].text` blocks the way
    /// [`events::match_incoming`] does, including the raw-substring fallback
    /// for unparseable text. Returns the parsed payload, or `None` on
    /// deadline expiry.
    pub async fn wait_for_incoming(&self, event_type: &str, timeout: Duration) -> Option<Value> {
        events::wait_for_match(&self.buffers, timeout, |entries| {
            entries
                .iter()
                .find_map(|entry| events::match_incoming(entry, event_type))
        })
        .await
    }

    /// Snapshot of the captured diagnostic (stderr) lines, in arrival order.
    #[must_use]
    pub fn stderr_lines(&self) -> Vec<String> {
        self.stderr_buf
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of the generic push-event buffer.
    #[must_use]
    pub fn push_events(&self) -> Vec<Value> {
        self.buffers.push_events_snapshot()
    }

    /// Snapshot of the channel-incoming event buffer.
    #[must_use]
    pub fn incoming_events(&self) -> Vec<Value> {
        self.buffers.incoming_snapshot()
    }

    /// Snapshot of the notification buffer.
    #[must_use]
    pub fn notifications(&self) -> Vec<Value> {
        self.buffers.notifications_snapshot()
    }

    /// Number of requests currently awaiting a response.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.correlator.pending_len()
    }

    /// Whether the transport is dead: the stream ended, a write failed, or
    /// [`Self::close`] ran.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Tear down the session. Idempotent; the second and later calls return
    /// `Ok` without doing anything.
    ///
    /// Marks the session closed, stops the background tasks, and terminates
    /// the child's entire process group: TERM, a bounded grace wait, then
    /// KILL and a second bounded wait. Already-exited processes count as
    /// success.
    ///
    /// Outstanding requests are not drained; their callers time out under
    /// their own deadlines.
    ///
    /// # Errors
    ///
    /// Never fails for an already-exited process; the `Result` is kept for
    /// API stability.
    pub async fn close(&self) -> Result<()> {
        if self.close_started.swap(true, Ordering::SeqCst) {
            debug!("close: already closed, skipping");
            return Ok(());
        }

        self.closed.store(true, Ordering::SeqCst);
        self.cancel.cancel();

        let mut child = self.child.lock().await;
        lifecycle::terminate_group(&mut child, self.pid, self.config.shutdown_grace()).await;

        info!("session closed");
        Ok(())
    }
}

impl Drop for McplClient {
    fn drop(&mut self) {
        // Stop the background tasks; the child itself is covered by
        // kill_on_drop when close() was never called.
        self.cancel.cancel();
    }
}
