//! Canonical catalog: raw upstream records, seeded items and nodes, and the
//! versioned snapshot handle read by reconciliation and aggregation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::category::Category;
use crate::rules::RuleTable;

/// An item record as the upstream catalog source publishes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawItem {
    pub unique_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub product_category: Option<String>,
    #[serde(default)]
    pub masterable: Option<bool>,
    #[serde(default)]
    pub max_level_cap: Option<u32>,
}

impl RawItem {
    pub fn new(unique_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            unique_name: unique_name.into(),
            name: name.into(),
            category: None,
            product_category: None,
            masterable: None,
            max_level_cap: None,
        }
    }
}

/// A star-chart node record as the upstream source publishes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    pub unique_name: String,
    #[serde(default)]
    pub name: String,
    pub system_name: String,
    #[serde(default)]
    pub mastery_exp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub natural_key: String,
    pub name: String,
    pub category: Category,
    pub progression_cap: u32,
    pub is_premium_variant: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarChartNode {
    pub natural_key: String,
    pub name: String,
    pub region: String,
    /// Exploration score for completing the node.
    pub fixed_reward: u64,
}

impl From<RawNode> for StarChartNode {
    fn from(raw: RawNode) -> Self {
        Self {
            natural_key: raw.unique_name,
            name: raw.name,
            region: raw.system_name,
            fixed_reward: raw.mastery_exp,
        }
    }
}

/// A persisted catalog item with its surrogate id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: i64,
    pub item: CatalogItem,
}

/// A persisted star-chart node with its surrogate id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEntry {
    pub id: i64,
    pub node: StarChartNode,
}

/// Read-only view of the catalog at one version.
///
/// Passed explicitly into every reconciliation and summary. A rebuild
/// produces a new snapshot; holders of an older one keep a consistent view,
/// and keys missing from it are ordinary misses.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    version: u64,
    items: HashMap<i64, CatalogEntry>,
    item_keys: HashMap<String, i64>,
    nodes: HashMap<i64, NodeEntry>,
    node_keys: HashMap<String, i64>,
}

impl CatalogSnapshot {
    pub fn new(
        version: u64,
        items: impl IntoIterator<Item = CatalogEntry>,
        nodes: impl IntoIterator<Item = NodeEntry>,
    ) -> Self {
        let mut snapshot = Self {
            version,
            ..Self::default()
        };
        for entry in items {
            snapshot
                .item_keys
                .insert(entry.item.natural_key.clone(), entry.id);
            snapshot.items.insert(entry.id, entry);
        }
        for entry in nodes {
            snapshot
                .node_keys
                .insert(entry.node.natural_key.clone(), entry.id);
            snapshot.nodes.insert(entry.id, entry);
        }
        snapshot
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn item_by_natural_key(&self, key: &str) -> Option<&CatalogEntry> {
        self.item_keys.get(key).and_then(|id| self.items.get(id))
    }

    pub fn item(&self, id: i64) -> Option<&CatalogEntry> {
        self.items.get(&id)
    }

    /// All items, ordered by id.
    pub fn items(&self) -> Vec<&CatalogEntry> {
        let mut items: Vec<_> = self.items.values().collect();
        items.sort_by_key(|e| e.id);
        items
    }

    pub fn node_by_natural_key(&self, key: &str) -> Option<&NodeEntry> {
        self.node_keys.get(key).and_then(|id| self.nodes.get(id))
    }

    pub fn node(&self, id: i64) -> Option<&NodeEntry> {
        self.nodes.get(&id)
    }

    /// All nodes, ordered by id.
    pub fn nodes(&self) -> Vec<&NodeEntry> {
        let mut nodes: Vec<_> = self.nodes.values().collect();
        nodes.sort_by_key(|e| e.id);
        nodes
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Result of classifying one batch of raw records.
#[derive(Debug, Clone, Default)]
pub struct CatalogBuild {
    pub items: Vec<CatalogItem>,
    /// Flagged non-progressable and not specially included.
    pub skipped: usize,
    /// Matched by no rule.
    pub unclassified: usize,
    /// Natural keys seen more than once; the first record wins.
    pub duplicates: usize,
}

/// Classify a batch of raw records into canonical catalog items.
pub fn build_catalog(rules: &RuleTable, raw_items: &[RawItem]) -> CatalogBuild {
    let mut build = CatalogBuild::default();
    let mut seen = std::collections::HashSet::new();

    for raw in raw_items {
        if !rules.should_seed(raw) {
            build.skipped += 1;
            continue;
        }
        let Some(category) = rules.classify(raw) else {
            debug!(key = %raw.unique_name, name = %raw.name, "unclassified catalog record");
            build.unclassified += 1;
            continue;
        };
        if !seen.insert(raw.unique_name.as_str()) {
            debug!(key = %raw.unique_name, "duplicate catalog record");
            build.duplicates += 1;
            continue;
        }
        build.items.push(CatalogItem {
            natural_key: raw.unique_name.clone(),
            name: raw.name.clone(),
            category,
            progression_cap: rules.progression_cap(raw, category),
            is_premium_variant: rules.is_premium_variant(raw),
        });
    }

    info!(
        seeded = build.items.len(),
        skipped = build.skipped,
        unclassified = build.unclassified,
        "classified catalog batch"
    );
    build
}
