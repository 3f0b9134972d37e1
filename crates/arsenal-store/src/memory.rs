//! In-memory store for tests and dry runs.

use std::collections::{BTreeMap, HashMap};

use arsenal_core::{
    CatalogEntry, CatalogItem, CatalogSnapshot, IntrinsicsState, LoadoutAssignment, MasteryRecord,
    NodeCompletionRecord, NodeEntry, Platform, Player, StarChartNode,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{CatalogStore, ProgressStore, StoreError};

#[derive(Default)]
struct State {
    catalog_version: u64,
    next_item_id: i64,
    next_node_id: i64,
    next_player_id: i64,
    items: BTreeMap<i64, CatalogItem>,
    item_keys: HashMap<String, i64>,
    nodes: BTreeMap<i64, StarChartNode>,
    node_keys: HashMap<String, i64>,
    players: BTreeMap<i64, Player>,
    mastery: BTreeMap<(i64, i64), MasteryRecord>,
    loadouts: HashMap<i64, LoadoutAssignment>,
    intrinsics: HashMap<i64, IntrinsicsState>,
    completions: BTreeMap<(i64, i64, bool), NodeCompletionRecord>,
}

impl State {
    fn player_mut(&mut self, player_id: i64) -> Result<&mut Player, StoreError> {
        self.players
            .get_mut(&player_id)
            .ok_or(StoreError::PlayerNotFound(player_id))
    }
}

/// Store backed by ordered maps keyed exactly like the DuckDB unique
/// constraints, so upsert semantics match.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn upsert_items(&self, items: &[CatalogItem]) -> Result<u64, StoreError> {
        let mut state = self.state.lock().await;
        for item in items {
            let existing = state.item_keys.get(&item.natural_key).copied();
            let id = match existing {
                Some(id) => id,
                None => {
                    state.next_item_id += 1;
                    let id = state.next_item_id;
                    state.item_keys.insert(item.natural_key.clone(), id);
                    id
                }
            };
            state.items.insert(id, item.clone());
        }
        state.catalog_version += 1;
        debug!(count = items.len(), version = state.catalog_version, "upserted catalog items");
        Ok(state.catalog_version)
    }

    async fn upsert_nodes(&self, nodes: &[StarChartNode]) -> Result<u64, StoreError> {
        let mut state = self.state.lock().await;
        for node in nodes {
            let existing = state.node_keys.get(&node.natural_key).copied();
            let id = match existing {
                Some(id) => id,
                None => {
                    state.next_node_id += 1;
                    let id = state.next_node_id;
                    state.node_keys.insert(node.natural_key.clone(), id);
                    id
                }
            };
            state.nodes.insert(id, node.clone());
        }
        state.catalog_version += 1;
        debug!(count = nodes.len(), version = state.catalog_version, "upserted star chart nodes");
        Ok(state.catalog_version)
    }

    async fn load_catalog(&self) -> Result<CatalogSnapshot, StoreError> {
        let state = self.state.lock().await;
        let items = state.items.iter().map(|(id, item)| CatalogEntry {
            id: *id,
            item: item.clone(),
        });
        let nodes = state.nodes.iter().map(|(id, node)| NodeEntry {
            id: *id,
            node: node.clone(),
        });
        Ok(CatalogSnapshot::new(state.catalog_version, items, nodes))
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn register_player(
        &self,
        natural_id: &str,
        platform: Platform,
    ) -> Result<Player, StoreError> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state
            .players
            .values()
            .find(|p| p.natural_id == natural_id && p.platform == platform)
        {
            return Ok(existing.clone());
        }
        state.next_player_id += 1;
        let player = Player {
            id: state.next_player_id,
            natural_id: natural_id.to_string(),
            platform,
            display_name: None,
            last_sync: None,
        };
        state.players.insert(player.id, player.clone());
        debug!(player_id = player.id, natural_id, %platform, "registered player");
        Ok(player)
    }

    async fn player(&self, player_id: i64) -> Result<Option<Player>, StoreError> {
        Ok(self.state.lock().await.players.get(&player_id).cloned())
    }

    async fn upsert_mastery(&self, records: &[MasteryRecord]) -> Result<usize, StoreError> {
        let mut state = self.state.lock().await;
        for record in records {
            state
                .mastery
                .insert((record.player_id, record.item_id), record.clone());
        }
        Ok(records.len())
    }

    async fn replace_loadout(&self, loadout: &LoadoutAssignment) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.loadouts.insert(loadout.player_id, loadout.clone());
        Ok(())
    }

    async fn replace_intrinsics(&self, intrinsics: &IntrinsicsState) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.intrinsics.insert(intrinsics.player_id, *intrinsics);
        Ok(())
    }

    async fn upsert_node_completions(
        &self,
        completions: &[NodeCompletionRecord],
    ) -> Result<usize, StoreError> {
        let mut state = self.state.lock().await;
        for c in completions {
            state
                .completions
                .insert((c.player_id, c.node_id, c.steel_path), *c);
        }
        Ok(completions.len())
    }

    async fn update_last_sync(&self, player_id: i64, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.player_mut(player_id)?.last_sync = Some(at);
        Ok(())
    }

    async fn update_display_name(&self, player_id: i64, name: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.player_mut(player_id)?.display_name = Some(name.to_string());
        Ok(())
    }

    async fn mastery_records(&self, player_id: i64) -> Result<Vec<MasteryRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .mastery
            .range((player_id, i64::MIN)..=(player_id, i64::MAX))
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn node_completions(
        &self,
        player_id: i64,
    ) -> Result<Vec<NodeCompletionRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .completions
            .range((player_id, i64::MIN, false)..=(player_id, i64::MAX, true))
            .map(|(_, c)| *c)
            .collect())
    }

    async fn loadout(&self, player_id: i64) -> Result<Option<LoadoutAssignment>, StoreError> {
        Ok(self.state.lock().await.loadouts.get(&player_id).cloned())
    }

    async fn intrinsics(&self, player_id: i64) -> Result<Option<IntrinsicsState>, StoreError> {
        Ok(self.state.lock().await.intrinsics.get(&player_id).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arsenal_core::{Category, CombatStats};

    fn item(key: &str, cap: u32) -> CatalogItem {
        CatalogItem {
            natural_key: key.into(),
            name: key.into(),
            category: Category::Primary,
            progression_cap: cap,
            is_premium_variant: false,
        }
    }

    #[tokio::test]
    async fn catalog_upsert_keeps_ids_and_bumps_version() {
        let store = MemoryStore::new();
        assert_eq!(store.upsert_items(&[item("/a", 30), item("/b", 30)]).await.unwrap(), 1);
        assert_eq!(store.upsert_items(&[item("/a", 40)]).await.unwrap(), 2);

        let catalog = store.load_catalog().await.unwrap();
        assert_eq!(catalog.version(), 2);
        assert_eq!(catalog.item_count(), 2);
        let a = catalog.item_by_natural_key("/a").unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(a.item.progression_cap, 40);
    }

    #[tokio::test]
    async fn register_player_is_idempotent() {
        let store = MemoryStore::new();
        let first = store.register_player("tenno", Platform::Pc).await.unwrap();
        let again = store.register_player("tenno", Platform::Pc).await.unwrap();
        let other = store.register_player("tenno", Platform::Psn).await.unwrap();
        assert_eq!(first.id, again.id);
        assert_ne!(first.id, other.id);
    }

    #[tokio::test]
    async fn mastery_upsert_overwrites() {
        let store = MemoryStore::new();
        let mut record = MasteryRecord {
            player_id: 1,
            item_id: 7,
            xp: 100,
            rank: 0,
            stats: CombatStats {
                kills: Some(3),
                ..CombatStats::default()
            },
        };
        store.upsert_mastery(&[record.clone()]).await.unwrap();
        record.xp = 500;
        record.rank = 1;
        record.stats = CombatStats::default();
        store.upsert_mastery(&[record.clone()]).await.unwrap();

        let records = store.mastery_records(1).await.unwrap();
        assert_eq!(records, vec![record]);
        assert!(store.mastery_records(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn updating_unknown_player_errors() {
        let store = MemoryStore::new();
        let result = store.update_display_name(42, "nobody").await;
        assert!(matches!(result, Err(StoreError::PlayerNotFound(42))));
    }
}
