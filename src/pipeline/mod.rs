//! Thread-and-channel plumbing for the parsing and archiving stages.

mod context;
mod queue;

pub use context::{CancelGuard, CancelToken, Context};
pub use queue::{drain, emit_all, fan_out, generate, merge, recv, send, DEFAULT_WORKERS};
