#![forbid(unsafe_code)]
//! Bidirectional MCPL stdio client.
//!
//! Spawns an MCPL server as a child process and drives it over line-delimited
//! JSON-RPC 2.0 on the child's stdin/stdout. The client multiplexes its own
//! requests with server-initiated requests arriving on the same stream,
//! correlates responses to outstanding calls by id, buffers out-of-band
//! events, and tears the whole process group down on [`McplClient::close`].
//!
//! ```rust,no_run
//! use mcpl_client::{ClientConfig, McplClient};
//!
//! # async fn example() -> mcpl_client::Result<()> {
//! let client = McplClient::spawn(ClientConfig::new("game-manager"))?;
//! let server_info = client.handshake().await?;
//! let tools = client.list_tools().await?;
//! client.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod rpc;
pub mod session;
pub mod transport;

pub use config::ClientConfig;
pub use errors::{ClientError, Result};
pub use session::McplClient;
