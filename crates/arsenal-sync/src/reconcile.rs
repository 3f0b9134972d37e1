//! Reconciliation of one external profile snapshot into local state.
//!
//! The run is a linear state machine:
//!
//! ```text
//! Idle → Fetching → Matching → Writing(mastery → loadout → intrinsics → nodes) → Done | Failed
//! ```
//!
//! Fetching is the only all-or-nothing boundary: any fetch failure ends the
//! run before a single write. Matching is pure ([`plan`]); keys missing from
//! the catalog are skipped and counted, never errors. The write phases are
//! independent keyed upserts, so a repeated run converges on the same state
//! even after a partial failure. Finalize (last-sync timestamp, display name)
//! runs only when every write phase succeeded. Nothing is rolled back and
//! nothing is retried here.

use std::collections::HashMap;
use std::fmt;

use arsenal_core::profile::ProfileSnapshot;
use arsenal_core::{
    CatalogSnapshot, CombatStats, IntrinsicsState, LoadoutAssignment, MasteryRecord,
    NodeCompletionRecord, SyncSummary, mastery_state_from_rank, rank_from_xp,
};
use arsenal_store::{ProgressStore, StoreError};
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::source::{FetchError, ProfileSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePhase {
    Mastery,
    Loadout,
    Intrinsics,
    NodeCompletions,
}

impl fmt::Display for WritePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mastery => "mastery",
            Self::Loadout => "loadout",
            Self::Intrinsics => "intrinsics",
            Self::NodeCompletions => "node completions",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Fetching,
    Matching,
    Writing(WritePhase),
    Finalizing,
    Done,
    Failed,
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("player {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("sync incomplete, failed to write {}", describe_failures(.failed))]
    Write { failed: Vec<(WritePhase, StoreError)> },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

fn describe_failures(failed: &[(WritePhase, StoreError)]) -> String {
    failed
        .iter()
        .map(|(phase, err)| format!("{phase} ({err})"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ReconcileError {
    /// Stable failure kind for callers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not-found",
            Self::Fetch(e) => e.kind(),
            Self::Write { .. } => "write",
            Self::Store(_) => "store",
        }
    }
}

/// Everything one snapshot asks to write, resolved against the catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncPlan {
    pub mastery: Vec<MasteryRecord>,
    /// Of `mastery`, records at or above the mastered rank.
    pub mastered: usize,
    pub loadout: LoadoutAssignment,
    pub intrinsics: IntrinsicsState,
    pub completions: Vec<NodeCompletionRecord>,
    pub skipped_items: Vec<String>,
    pub skipped_nodes: Vec<String>,
}

impl SyncPlan {
    pub fn summary(&self) -> SyncSummary {
        SyncSummary {
            synced: self.mastery.len(),
            mastered: self.mastered,
            nodes: self.completions.len(),
            skipped_items: self.skipped_items.len(),
            skipped_nodes: self.skipped_nodes.len(),
        }
    }
}

/// Match a snapshot against the catalog and derive every row to write.
///
/// Repeated keys in the snapshot collapse to their last occurrence, which
/// is what sequential upserts would leave behind anyway.
pub fn plan(catalog: &CatalogSnapshot, player_id: i64, snapshot: &ProfileSnapshot) -> SyncPlan {
    let mut plan = SyncPlan::default();

    let stats: HashMap<&str, &CombatStats> = snapshot
        .stats
        .iter()
        .map(|s| (s.natural_key.as_str(), &s.stats))
        .collect();

    let mut positions: HashMap<i64, usize> = HashMap::new();
    for entry in &snapshot.xp {
        let Some(found) = catalog.item_by_natural_key(&entry.natural_key) else {
            debug!(key = %entry.natural_key, "item not in catalog, skipping");
            plan.skipped_items.push(entry.natural_key.clone());
            continue;
        };
        let item = &found.item;
        let record = MasteryRecord {
            player_id,
            item_id: found.id,
            xp: entry.xp,
            rank: rank_from_xp(entry.xp, item.category, item.progression_cap),
            stats: stats
                .get(entry.natural_key.as_str())
                .map(|s| **s)
                .unwrap_or_default(),
        };
        match positions.get(&found.id) {
            Some(&at) => plan.mastery[at] = record,
            None => {
                positions.insert(found.id, plan.mastery.len());
                plan.mastery.push(record);
            }
        }
    }
    plan.mastered = plan
        .mastery
        .iter()
        .filter(|r| {
            catalog.item(r.item_id).is_some_and(|e| {
                mastery_state_from_rank(r.rank, e.item.progression_cap).is_mastered()
            })
        })
        .count();

    let resolve = |key: &Option<String>| {
        key.as_deref()
            .and_then(|k| catalog.item_by_natural_key(k))
            .map(|e| e.id)
    };
    let loadout = &snapshot.loadout;
    plan.loadout = LoadoutAssignment {
        player_id,
        frame_id: resolve(&loadout.frame),
        primary_id: resolve(&loadout.primary),
        secondary_id: resolve(&loadout.secondary),
        melee_id: resolve(&loadout.melee),
        focus: loadout.focus.clone(),
    };

    plan.intrinsics = IntrinsicsState {
        player_id,
        railjack: snapshot.intrinsics.railjack.total(),
        drifter: snapshot.intrinsics.drifter.total(),
    };

    let mut rows: HashMap<(i64, bool), usize> = HashMap::new();
    for mission in &snapshot.missions {
        let Some(node) = catalog.node_by_natural_key(&mission.node_key) else {
            debug!(key = %mission.node_key, "node not in catalog, skipping");
            plan.skipped_nodes.push(mission.node_key.clone());
            continue;
        };
        let mut emit = |steel_path: bool| {
            let row = NodeCompletionRecord {
                player_id,
                node_id: node.id,
                steel_path,
                completes: mission.completes,
            };
            match rows.get(&(node.id, steel_path)) {
                Some(&at) => plan.completions[at] = row,
                None => {
                    rows.insert((node.id, steel_path), plan.completions.len());
                    plan.completions.push(row);
                }
            }
        };
        if mission.completes > 0 {
            emit(false);
        }
        if mission.is_hard_mode() {
            emit(true);
        }
    }

    plan
}

/// Drives one reconciliation run against a store and a profile source.
pub struct Reconciler<'a, S: ?Sized, P: ?Sized> {
    store: &'a S,
    source: &'a P,
    state: SyncState,
}

impl<'a, S, P> Reconciler<'a, S, P>
where
    S: ProgressStore + ?Sized,
    P: ProfileSource + ?Sized,
{
    pub fn new(store: &'a S, source: &'a P) -> Self {
        Self {
            store,
            source,
            state: SyncState::Idle,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    fn enter(&mut self, state: SyncState) {
        debug!(from = ?self.state, to = ?state, "sync state");
        self.state = state;
    }

    /// Bring `player_id`'s local state up to date with their external profile.
    pub async fn run(
        &mut self,
        catalog: &CatalogSnapshot,
        player_id: i64,
    ) -> Result<SyncSummary, ReconcileError> {
        let result = self.run_phases(catalog, player_id).await;
        match &result {
            Ok(summary) => {
                self.enter(SyncState::Done);
                info!(
                    player_id,
                    synced = summary.synced,
                    mastered = summary.mastered,
                    nodes = summary.nodes,
                    "sync complete"
                );
            }
            Err(e) => {
                self.enter(SyncState::Failed);
                warn!(player_id, kind = e.kind(), error = %e, "sync failed");
            }
        }
        result
    }

    async fn run_phases(
        &mut self,
        catalog: &CatalogSnapshot,
        player_id: i64,
    ) -> Result<SyncSummary, ReconcileError> {
        let player = self
            .store
            .player(player_id)
            .await?
            .ok_or(ReconcileError::NotFound(player_id))?;

        self.enter(SyncState::Fetching);
        let snapshot = self.source.fetch(&player.natural_id, player.platform).await?;

        self.enter(SyncState::Matching);
        let plan = plan(catalog, player_id, &snapshot);
        info!(
            player_id,
            catalog_version = catalog.version(),
            matched = plan.mastery.len(),
            skipped_items = plan.skipped_items.len(),
            skipped_nodes = plan.skipped_nodes.len(),
            "matched snapshot against catalog"
        );

        let mut failed = Vec::new();

        self.enter(SyncState::Writing(WritePhase::Mastery));
        if let Err(e) = self.store.upsert_mastery(&plan.mastery).await {
            failed.push((WritePhase::Mastery, e));
        }

        self.enter(SyncState::Writing(WritePhase::Loadout));
        if let Err(e) = self.store.replace_loadout(&plan.loadout).await {
            failed.push((WritePhase::Loadout, e));
        }

        self.enter(SyncState::Writing(WritePhase::Intrinsics));
        if let Err(e) = self.store.replace_intrinsics(&plan.intrinsics).await {
            failed.push((WritePhase::Intrinsics, e));
        }

        self.enter(SyncState::Writing(WritePhase::NodeCompletions));
        if let Err(e) = self.store.upsert_node_completions(&plan.completions).await {
            failed.push((WritePhase::NodeCompletions, e));
        }

        if !failed.is_empty() {
            for (phase, e) in &failed {
                warn!(player_id, %phase, error = %e, "write phase failed");
            }
            return Err(ReconcileError::Write { failed });
        }

        self.enter(SyncState::Finalizing);
        self.store.update_last_sync(player_id, Utc::now()).await?;
        if let Some(name) = snapshot.display_name.as_deref() {
            self.store.update_display_name(player_id, name).await?;
        }

        Ok(plan.summary())
    }
}

/// Run one reconciliation with a fresh [`Reconciler`].
pub async fn reconcile<S, P>(
    store: &S,
    source: &P,
    catalog: &CatalogSnapshot,
    player_id: i64,
) -> Result<SyncSummary, ReconcileError>
where
    S: ProgressStore + ?Sized,
    P: ProfileSource + ?Sized,
{
    Reconciler::new(store, source).run(catalog, player_id).await
}
