//! Stderr capture task.
//!
//! Drains the child's diagnostic stream into an ordered line buffer until
//! EOF or cancellation, teeing each line to `tracing` at DEBUG. The stream
//! is unstructured text and never affects protocol state.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Shared ordered buffer of captured diagnostic lines.
pub type StderrBuffer = Arc<Mutex<Vec<String>>>;

/// Stderr capture task. Reads raw lines from `stream` into `buffer` until
/// EOF, an IO error, or cancellation.
pub async fn run_stderr_capture<R>(stream: R, buffer: StderrBuffer, cancel: CancellationToken)
where
    R: AsyncRead + Unpin + Send,
{
    let mut lines = BufReader::new(stream).lines();

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!("stderr capture: cancellation received, stopping");
                break;
            }

            line = lines.next_line() => {
                match line {
                    Ok(Some(text)) => {
                        debug!(target: "mcpl_client::child_stderr", "{text}");
                        buffer
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .push(text);
                    }
                    Ok(None) => {
                        debug!("stderr capture: EOF detected");
                        break;
                    }
                    Err(err) => {
                        debug!(%err, "stderr capture: read error, stopping");
                        break;
                    }
                }
            }
        }
    }
}
