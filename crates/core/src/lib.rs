//! hotboard-core: resilient extraction of a ranked trending-topics board
//! into immutable, timestamped snapshots on an append-only ledger.
//!
//! The pipeline tries a headless-browser fetch first, falls back to plain
//! HTTP, runs a fixed-priority cascade of parsing strategies over whatever
//! markup it got, reconciles the candidates into a valid snapshot, and
//! appends the result to the ledger. It always returns something usable;
//! total upstream failure produces a clearly flagged placeholder.

pub mod dom;
pub mod extract;
#[cfg(feature = "fetch")]
pub mod fetch;
pub mod model;
#[cfg(feature = "fetch")]
pub mod pipeline;
pub mod reconcile;
pub mod store;

pub use model::{HotItem, Snapshot};
#[cfg(feature = "fetch")]
pub use pipeline::{capture, CaptureConfig, CaptureReport, CaptureSource};
pub use store::{AppendOutcome, SnapshotStore};
