//! Sync layer: player profile sources and reconciliation of an external
//! snapshot into local per-player state.

mod file;
pub mod reconcile;
mod source;

#[cfg(feature = "http")]
pub mod http;

pub use file::FileProfileSource;
pub use reconcile::{
    ReconcileError, Reconciler, SyncPlan, SyncState, WritePhase, plan, reconcile,
};
pub use source::{FetchError, ProfileSource};

#[cfg(feature = "http")]
pub use http::HttpProfileSource;
