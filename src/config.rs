//! Client configuration: how to launch the server process and how the
//! client identifies itself during the handshake.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Configuration for spawning and driving an MCPL server process.
///
/// The child is launched with the caller's environment inherited; only the
/// working directory is overridden when `working_dir` is set.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ClientConfig {
    /// Server binary to launch (e.g., `game-manager`).
    pub command: String,
    /// Arguments passed to the server binary.
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory for the child process; inherited when `None`.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    /// Client name advertised in the handshake's `clientInfo`.
    #[serde(default = "default_client_name")]
    pub client_name: String,
    /// Client version advertised in the handshake's `clientInfo`.
    #[serde(default = "default_client_version")]
    pub client_version: String,
    /// Declare the `pushEvents` capability during the handshake.
    #[serde(default = "default_true")]
    pub push_events: bool,
    /// Declare the `channels` capability during the handshake.
    #[serde(default = "default_true")]
    pub channels: bool,
    /// Declare the `rollback` capability during the handshake.
    #[serde(default = "default_true")]
    pub rollback: bool,
    /// Default deadline for a request's response.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
    /// Grace interval between the TERM and KILL escalation steps of
    /// [`McplClient::close`](crate::McplClient::close).
    #[serde(default = "default_shutdown_grace_seconds")]
    pub shutdown_grace_seconds: u64,
}

fn default_client_name() -> String {
    "mcpl-client".into()
}

fn default_client_version() -> String {
    env!("CARGO_PKG_VERSION").into()
}

fn default_true() -> bool {
    true
}

fn default_request_timeout_seconds() -> u64 {
    30
}

fn default_shutdown_grace_seconds() -> u64 {
    5
}

impl ClientConfig {
    /// Build a configuration for `command` with every other field defaulted.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            working_dir: None,
            client_name: default_client_name(),
            client_version: default_client_version(),
            push_events: true,
            channels: true,
            rollback: true,
            request_timeout_seconds: default_request_timeout_seconds(),
            shutdown_grace_seconds: default_shutdown_grace_seconds(),
        }
    }

    /// Default per-request response deadline.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Grace interval for each step of the shutdown escalation.
    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }
}
