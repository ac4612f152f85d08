// src/pipeline/mod.rs

//! Pipeline entry points for sync operations.
//!
//! - `Scheduler`: fires sync cycles on a fixed cadence, one at a time
//! - `SyncService`: runs one fetch-and-reconcile cycle
//! - `Dispatcher`: throttles calls to a rate-limited API

pub mod dispatcher;
pub mod scheduler;
pub mod sync;

pub use dispatcher::Dispatcher;
pub use scheduler::{CycleGuard, Scheduler};
pub use sync::SyncService;
