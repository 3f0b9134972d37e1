//! Per-player records written by reconciliation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Pc,
    Psn,
    Xbox,
    Switch,
}

impl Platform {
    pub const ALL: [Platform; 4] = [Self::Pc, Self::Psn, Self::Xbox, Self::Switch];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pc => "pc",
            Self::Psn => "psn",
            Self::Xbox => "xbox",
            Self::Switch => "switch",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown platform: {0} (expected pc, psn, xbox or switch)")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == lower)
            .ok_or_else(|| UnknownPlatform(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub natural_id: String,
    pub platform: Platform,
    pub display_name: Option<String>,
    pub last_sync: Option<DateTime<Utc>>,
}

/// Combat usage counters. Each is independently absent when the source
/// did not report it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatStats {
    #[serde(default)]
    pub fired: Option<u64>,
    #[serde(default)]
    pub hits: Option<u64>,
    #[serde(default)]
    pub kills: Option<u64>,
    #[serde(default)]
    pub headshots: Option<u64>,
    #[serde(default)]
    pub equip_time: Option<u64>,
    #[serde(default)]
    pub assists: Option<u64>,
}

/// Unique on `(player_id, item_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasteryRecord {
    pub player_id: i64,
    pub item_id: i64,
    pub xp: u64,
    pub rank: u32,
    pub stats: CombatStats,
}

/// The player's equipped loadout. Replaced wholesale on every sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadoutAssignment {
    pub player_id: i64,
    pub frame_id: Option<i64>,
    pub primary_id: Option<i64>,
    pub secondary_id: Option<i64>,
    pub melee_id: Option<i64>,
    pub focus: Option<String>,
}

/// Intrinsics totals per skill tree. Stored as reported, never clamped to
/// the nominal 50 / 40 ceilings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrinsicsState {
    pub player_id: i64,
    pub railjack: u32,
    pub drifter: u32,
}

impl IntrinsicsState {
    pub fn total_levels(&self) -> u64 {
        u64::from(self.railjack) + u64::from(self.drifter)
    }
}

/// Unique on `(player_id, node_id, steel_path)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCompletionRecord {
    pub player_id: i64,
    pub node_id: i64,
    pub steel_path: bool,
    pub completes: u32,
}

/// Outcome counts of one reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    /// Mastery records written.
    pub synced: usize,
    /// Of those, records at or above the mastered rank.
    pub mastered: usize,
    /// Node-completion rows written.
    pub nodes: usize,
    pub skipped_items: usize,
    pub skipped_nodes: usize,
}
