//! Structured logging initialization.
//!
//! Log rotation policy is left to the embedding binary; this just wires up
//! a subscriber at a sane default level.

use tracing_subscriber::EnvFilter;

/// Initializes a global `tracing` subscriber at `info` level (overridable
/// via `RUST_LOG`): per-action entry, per-OD-write debug trace, per-error
/// error event.
///
/// Calling this more than once in a process is a no-op past the first call;
/// it is meant to be invoked once by whatever outer binary embeds this
/// core (the CLI itself is out of scope, §1).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
