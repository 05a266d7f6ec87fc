//! Async session layer: a worker task that owns the source registry and the
//! result sequence and drives them from a command channel, publishing
//! progressive updates back to whatever layer (UI, tests, tooling) sent the
//! commands.

mod handlers;
pub mod preview;
mod worker;

pub use worker::{SessionState, worker_task};
