//! Shared helpers for scripted-peer integration tests.
//!
//! Each test spawns `sh -c <script>` as the server process. The scripts
//! read the client's lines with `read` and answer with `printf`, which
//! writes one complete line per invocation.

use std::sync::Once;

use mcpl_client::ClientConfig;

static TRACING: Once = Once::new();

/// Install a fmt subscriber once so `RUST_LOG=debug` surfaces the client's
/// wire diagnostics when a scripted-peer test misbehaves.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Build a config that runs `script` under `sh -c`.
pub fn sh_config(script: &str) -> ClientConfig {
    init_tracing();
    let mut config = ClientConfig::new("sh");
    config.args = vec!["-c".into(), script.into()];
    config
}
