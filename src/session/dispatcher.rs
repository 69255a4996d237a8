//! Frame reader / inbound dispatcher task.
//!
//! A single loop owns the child's stdout for the life of the transport.
//! Each newline-terminated line is classified structurally and either
//! resolves a pending request, triggers an auto-reply to a peer-initiated
//! request, or is appended to an event buffer.
//!
//! | Inbound shape            | Handling                                     |
//! |--------------------------|----------------------------------------------|
//! | response                 | [`Correlator::resolve`]; unmatched → dropped |
//! | request `push/event`     | push-event buffer, reply `{"accepted":true}` |
//! | request `channels/incoming` | incoming buffer, reply `{}`               |
//! | request `channels/changed`  | notification buffer, reply `{}`           |
//! | request (any other)      | reply `{}`, nothing buffered                 |
//! | notification             | notification buffer, no reply                |
//!
//! The reply for line N is written and flushed before line N+1 is read.
//! The peer may treat the stream as half-duplex and block on the answer to
//! its own request before producing further output, so relaxing this
//! ordering can deadlock the whole session.
//!
//! Malformed lines are dropped with a WARN diagnostic and never abort the
//! loop. EOF or a stream error latches the session closed and fails every
//! pending request.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::StreamExt;
use serde_json::{json, Value};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::rpc::{self, Inbound};
use crate::session::correlator::Correlator;
use crate::session::events::EventBuffers;
use crate::transport::codec::McplCodec;
use crate::transport::writer::LineWriter;
use crate::ClientError;

/// Frame reader task. Reads lines from `stream` until EOF, a fatal stream
/// error, or cancellation.
pub async fn run_reader<R, W>(
    stream: R,
    writer: Arc<LineWriter<W>>,
    correlator: Arc<Correlator>,
    buffers: Arc<EventBuffers>,
    closed: Arc<AtomicBool>,
    cancel: CancellationToken,
) where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    let mut framed = FramedRead::new(stream, McplCodec::new());

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!("reader: cancellation received, stopping");
                break;
            }

            item = framed.next() => {
                match item {
                    None => {
                        debug!("reader: EOF detected");
                        mark_dead(&closed, &correlator);
                        break;
                    }

                    Some(Err(ClientError::Parse(msg))) => {
                        // Oversized line; the codec resynchronises at the
                        // next newline.
                        warn!(error = msg.as_str(), "reader: framing error, skipping line");
                    }

                    Some(Err(err)) => {
                        warn!(%err, "reader: stream error, stopping");
                        mark_dead(&closed, &correlator);
                        break;
                    }

                    Some(Ok(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        if !handle_line(&line, &writer, &correlator, &buffers).await {
                            mark_dead(&closed, &correlator);
                            break;
                        }
                    }
                }
            }
        }
    }
}

/// Dispatch one peer-initiated request: append to the buffer its method
/// selects and return the reply payload owed to the peer. Unrecognized
/// methods buffer nothing but still get an empty-result reply, since a peer
/// left waiting on an unanswered request can deadlock the stream.
pub fn dispatch_peer_request(method: &str, params: Value, buffers: &EventBuffers) -> Value {
    match method {
        "push/event" => {
            buffers.push_event(params);
            json!({ "accepted": true })
        }
        "channels/incoming" => {
            buffers.push_incoming(params);
            json!({})
        }
        "channels/changed" => {
            buffers.push_notification(json!({ "method": method, "params": params }));
            json!({})
        }
        other => {
            debug!(method = other, "reader: unrecognized peer request, sending empty reply");
            json!({})
        }
    }
}

/// Fully handle one non-blank line, including any reply it obligates.
/// Returns `false` when a reply write failed and the transport is dead.
async fn handle_line<W>(
    line: &str,
    writer: &Arc<LineWriter<W>>,
    correlator: &Arc<Correlator>,
    buffers: &Arc<EventBuffers>,
) -> bool
where
    W: AsyncWrite + Unpin + Send,
{
    match rpc::classify(line) {
        Ok(Inbound::Response { id, outcome }) => {
            if !correlator.resolve(&id, outcome) {
                debug!(?id, "reader: unmatched response id, dropping");
            }
            true
        }

        Ok(Inbound::PeerRequest { id, method, params }) => {
            let reply = dispatch_peer_request(&method, params, buffers);
            if let Err(err) = writer.send(&rpc::response(&id, reply)).await {
                warn!(%err, method, "reader: failed to send auto-reply, stopping");
                return false;
            }
            true
        }

        Ok(Inbound::Notification { method, params }) => {
            buffers.push_notification(json!({ "method": method, "params": params }));
            true
        }

        Err(err) => {
            warn!(%err, raw_line = line, "reader: parse error, skipping line");
            true
        }
    }
}

/// Latch the closed flag and wake every pending caller with a dead channel.
fn mark_dead(closed: &AtomicBool, correlator: &Correlator) {
    closed.store(true, Ordering::SeqCst);
    correlator.fail_all();
}
