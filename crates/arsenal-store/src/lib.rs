//! Persistence surface: the canonical catalog and per-player progress.
//!
//! Both stores are traits so reconciliation can run against the in-memory
//! store in tests and the DuckDB store in the CLI. Writes are keyed upserts;
//! repeating a write with the same rows leaves the same state.

use arsenal_core::{
    CatalogItem, CatalogSnapshot, IntrinsicsState, LoadoutAssignment, MasteryRecord,
    NodeCompletionRecord, Platform, Player, StarChartNode,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

mod error;
mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;

#[cfg(feature = "duckdb")]
mod duck;
#[cfg(feature = "duckdb")]
pub use duck::DuckStore;

/// Write and read surface of the canonical catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert or overwrite items by natural key. Returns the new catalog version.
    async fn upsert_items(&self, items: &[CatalogItem]) -> Result<u64, StoreError>;

    /// Insert or overwrite nodes by natural key. Returns the new catalog version.
    async fn upsert_nodes(&self, nodes: &[StarChartNode]) -> Result<u64, StoreError>;

    /// Current catalog contents as one consistent snapshot.
    async fn load_catalog(&self) -> Result<CatalogSnapshot, StoreError>;
}

/// Per-player state written by reconciliation and read by summaries.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Find or create the player with this natural id on `platform`.
    async fn register_player(
        &self,
        natural_id: &str,
        platform: Platform,
    ) -> Result<Player, StoreError>;

    async fn player(&self, player_id: i64) -> Result<Option<Player>, StoreError>;

    /// Upsert on `(player_id, item_id)`, overwriting every numeric field.
    async fn upsert_mastery(&self, records: &[MasteryRecord]) -> Result<usize, StoreError>;

    async fn replace_loadout(&self, loadout: &LoadoutAssignment) -> Result<(), StoreError>;

    async fn replace_intrinsics(&self, intrinsics: &IntrinsicsState) -> Result<(), StoreError>;

    /// Upsert on `(player_id, node_id, steel_path)`.
    async fn upsert_node_completions(
        &self,
        completions: &[NodeCompletionRecord],
    ) -> Result<usize, StoreError>;

    async fn update_last_sync(&self, player_id: i64, at: DateTime<Utc>) -> Result<(), StoreError>;

    async fn update_display_name(&self, player_id: i64, name: &str) -> Result<(), StoreError>;

    async fn mastery_records(&self, player_id: i64) -> Result<Vec<MasteryRecord>, StoreError>;

    async fn node_completions(
        &self,
        player_id: i64,
    ) -> Result<Vec<NodeCompletionRecord>, StoreError>;

    async fn loadout(&self, player_id: i64) -> Result<Option<LoadoutAssignment>, StoreError>;

    async fn intrinsics(&self, player_id: i64) -> Result<Option<IntrinsicsState>, StoreError>;
}
