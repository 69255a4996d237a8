//! Serialized line writer for the child's stdin.
//!
//! All outbound envelopes (caller requests, the dispatcher's auto-replies,
//! one-way notifications) funnel through one [`LineWriter`]. A write holds
//! the lock for the whole serialize-write-flush sequence, so lines are never
//! interleaved and the peer never blocks on a half-sent message.

use serde_json::Value;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::{ClientError, Result};

/// Shared writer over the child's stdin (or any byte sink in tests).
#[derive(Debug)]
pub struct LineWriter<W> {
    inner: Mutex<W>,
}

impl<W> LineWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Wrap a sink in a serialized line writer.
    pub fn new(sink: W) -> Self {
        Self {
            inner: Mutex::new(sink),
        }
    }

    /// Serialize `value` to a compact single-line JSON string, append `\n`,
    /// write it, and flush before releasing the lock.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Io`] if serialisation fails (should not occur for
    ///   [`Value`]).
    /// - [`ClientError::TransportClosed`] if the write or flush fails, e.g.
    ///   the server process has exited.
    pub async fn send(&self, value: &Value) -> Result<()> {
        let mut bytes = serde_json::to_vec(value)
            .map_err(|e| ClientError::Io(format!("failed to serialise outbound message: {e}")))?;
        bytes.push(b'\n');

        let mut sink = self.inner.lock().await;
        sink.write_all(&bytes)
            .await
            .map_err(|e| ClientError::TransportClosed(format!("write failed: {e}")))?;
        sink.flush()
            .await
            .map_err(|e| ClientError::TransportClosed(format!("flush failed: {e}")))?;
        Ok(())
    }
}
