// ABOUTME: calcweave — a reusable expression compiler/evaluator over scientific and integer domains

pub mod api;
pub mod builtins;
pub mod context;
pub mod error;
pub mod integer;
pub mod intmask;
pub mod lexer;
pub mod options;
pub mod refgraph;
pub mod registry;
pub mod scientific;
pub mod threading;

pub use api::*;
pub use context::Context;

/// Install `env_logger` as the `log` facade's global logger. Idempotent:
/// a second call is a harmless no-op (mirrors `env_logger::try_init`'s
/// contract). Debug-level traces cover subexpression discovery, thread
/// construction, user-function duplication, and lock-order assertions.
pub fn init_logging() {
    let _ = env_logger::try_init();
}
