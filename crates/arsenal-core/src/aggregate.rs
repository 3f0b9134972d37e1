//! Progress summaries grouped by a canonical ordering.
//!
//! One algorithm serves both item mastery by category and star-chart
//! completion by region: groups named in the canonical sequence come first in
//! that order, any others follow alphabetically, and a grand total sums them
//! all.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::catalog::CatalogSnapshot;
use crate::category::Category;
use crate::progression::{mastery_state_from_rank, mastery_xp_for_cap};
use crate::records::{MasteryRecord, NodeCompletionRecord};

/// Categories in summary order.
pub const CATEGORY_ORDER: &[Category] = &[
    Category::Warframe,
    Category::Primary,
    Category::Secondary,
    Category::Melee,
    Category::Kitgun,
    Category::Zaw,
    Category::Amp,
    Category::Sentinel,
    Category::SentinelWeapon,
    Category::Companion,
    Category::Archwing,
    Category::ArchGun,
    Category::ArchMelee,
    Category::Necramech,
    Category::KDrive,
];

/// Star-chart regions in canonical order.
pub const REGION_ORDER: &[&str] = &[
    "Mercury",
    "Venus",
    "Earth",
    "Lua",
    "Mars",
    "Deimos",
    "Phobos",
    "Ceres",
    "Jupiter",
    "Europa",
    "Saturn",
    "Uranus",
    "Neptune",
    "Pluto",
    "Sedna",
    "Eris",
    "Void",
    "Kuva Fortress",
    "Zariman",
    "Duviri",
];

/// Per-group counters that can be summed.
pub trait Counters: Default + Clone {
    fn merge(&mut self, other: &Self);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group<C> {
    pub key: String,
    pub counters: C,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate<C> {
    pub groups: Vec<Group<C>>,
    pub total: C,
}

/// Order `groups` by `canonical`, unknown keys after in alphabetical order.
///
/// Duplicate keys are merged.
pub fn aggregate<C, I>(groups: I, canonical: &[&str]) -> Aggregate<C>
where
    C: Counters,
    I: IntoIterator<Item = (String, C)>,
{
    let mut merged: HashMap<String, C> = HashMap::new();
    for (key, counters) in groups {
        merged.entry(key).or_default().merge(&counters);
    }

    let mut ordered = Vec::with_capacity(merged.len());
    for key in canonical {
        if let Some(counters) = merged.remove(*key) {
            ordered.push(Group {
                key: (*key).to_string(),
                counters,
            });
        }
    }
    let rest: BTreeMap<String, C> = merged.into_iter().collect();
    ordered.extend(rest.into_iter().map(|(key, counters)| Group { key, counters }));

    let mut total = C::default();
    for group in &ordered {
        total.merge(&group.counters);
    }

    Aggregate {
        groups: ordered,
        total,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MasteryCounts {
    pub total: usize,
    pub mastered: usize,
    pub xp_earned: u64,
    pub xp_total: u64,
}

impl Counters for MasteryCounts {
    fn merge(&mut self, other: &Self) {
        self.total += other.total;
        self.mastered += other.mastered;
        self.xp_earned += other.xp_earned;
        self.xp_total += other.xp_total;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StarChartCounts {
    pub total: usize,
    pub completed: usize,
    pub steel_path_completed: usize,
}

impl Counters for StarChartCounts {
    fn merge(&mut self, other: &Self) {
        self.total += other.total;
        self.completed += other.completed;
        self.steel_path_completed += other.steel_path_completed;
    }
}

/// Mastery progress per category. Every catalog item counts toward `total`;
/// XP earned is capped at what the item's cap requires.
pub fn mastery_by_category(
    catalog: &CatalogSnapshot,
    records: &[MasteryRecord],
) -> Aggregate<MasteryCounts> {
    let by_item: HashMap<i64, &MasteryRecord> = records.iter().map(|r| (r.item_id, r)).collect();

    let groups = catalog.items().into_iter().map(|entry| {
        let item = &entry.item;
        let needed = mastery_xp_for_cap(item.category, item.progression_cap);
        let mut counts = MasteryCounts {
            total: 1,
            xp_total: needed,
            ..MasteryCounts::default()
        };
        if let Some(record) = by_item.get(&entry.id) {
            counts.xp_earned = record.xp.min(needed);
            if mastery_state_from_rank(record.rank, item.progression_cap).is_mastered() {
                counts.mastered = 1;
            }
        }
        (item.category.as_str().to_string(), counts)
    });

    let order: Vec<&str> = CATEGORY_ORDER.iter().map(|c| c.as_str()).collect();
    aggregate(groups, &order)
}

/// Star-chart completion per region. A node counts as completed once it has
/// a normal-mode row with at least one completion.
pub fn star_chart_by_region(
    catalog: &CatalogSnapshot,
    completions: &[NodeCompletionRecord],
) -> Aggregate<StarChartCounts> {
    let done: HashSet<(i64, bool)> = completions
        .iter()
        .filter(|c| c.completes > 0)
        .map(|c| (c.node_id, c.steel_path))
        .collect();

    let groups = catalog.nodes().into_iter().map(|entry| {
        let counts = StarChartCounts {
            total: 1,
            completed: usize::from(done.contains(&(entry.id, false))),
            steel_path_completed: usize::from(done.contains(&(entry.id, true))),
        };
        (entry.node.region.clone(), counts)
    });

    aggregate(groups, REGION_ORDER)
}

/// Sum of fixed rewards over completed rows. A node done on both normal
/// and steel path is rewarded twice.
pub fn exploration_score(catalog: &CatalogSnapshot, completions: &[NodeCompletionRecord]) -> u64 {
    completions
        .iter()
        .filter(|c| c.completes > 0)
        .filter_map(|c| catalog.node(c.node_id))
        .map(|entry| entry.node.fixed_reward)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogEntry, CatalogItem, NodeEntry, StarChartNode};
    use crate::records::CombatStats;

    fn item(id: i64, category: Category, cap: u32) -> CatalogEntry {
        CatalogEntry {
            id,
            item: CatalogItem {
                natural_key: format!("/item/{id}"),
                name: format!("Item {id}"),
                category,
                progression_cap: cap,
                is_premium_variant: false,
            },
        }
    }

    fn node(id: i64, region: &str, reward: u64) -> NodeEntry {
        NodeEntry {
            id,
            node: StarChartNode {
                natural_key: format!("SolNode{id}"),
                name: format!("Node {id}"),
                region: region.into(),
                fixed_reward: reward,
            },
        }
    }

    fn mastery(item_id: i64, xp: u64, rank: u32) -> MasteryRecord {
        MasteryRecord {
            player_id: 1,
            item_id,
            xp,
            rank,
            stats: CombatStats::default(),
        }
    }

    fn completion(node_id: i64, steel_path: bool, completes: u32) -> NodeCompletionRecord {
        NodeCompletionRecord {
            player_id: 1,
            node_id,
            steel_path,
            completes,
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Count(usize);

    impl Counters for Count {
        fn merge(&mut self, other: &Self) {
            self.0 += other.0;
        }
    }

    #[test]
    fn canonical_groups_precede_unknown_ones() {
        let groups = vec![
            ("Zeta".to_string(), Count(1)),
            ("Earth".to_string(), Count(2)),
            ("Alpha".to_string(), Count(3)),
            ("Mercury".to_string(), Count(4)),
        ];
        let agg = aggregate(groups, REGION_ORDER);
        let keys: Vec<&str> = agg.groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["Mercury", "Earth", "Alpha", "Zeta"]);
        assert_eq!(agg.total, Count(10));
    }

    #[test]
    fn category_order_covers_every_category() {
        assert_eq!(CATEGORY_ORDER.len(), Category::ALL.len());
        for category in Category::ALL {
            assert!(CATEGORY_ORDER.contains(&category), "{category} missing");
        }
    }

    #[test]
    fn duplicate_keys_merge() {
        let groups = vec![
            ("Mars".to_string(), Count(1)),
            ("Mars".to_string(), Count(2)),
        ];
        let agg = aggregate(groups, REGION_ORDER);
        assert_eq!(agg.groups.len(), 1);
        assert_eq!(agg.groups[0].counters, Count(3));
    }

    #[test]
    fn empty_input_has_zero_total() {
        let agg = aggregate(Vec::<(String, Count)>::new(), REGION_ORDER);
        assert!(agg.groups.is_empty());
        assert_eq!(agg.total, Count(0));
    }

    #[test]
    fn mastery_by_category_counts_catalog_and_records() {
        let catalog = CatalogSnapshot::new(
            1,
            vec![
                item(1, Category::Primary, 30),
                item(2, Category::Primary, 30),
                item(3, Category::Warframe, 30),
                item(4, Category::Necramech, 40),
            ],
            vec![],
        );
        let records = vec![
            mastery(1, 2_000_000, 30),
            mastery(2, 112_500, 15),
            mastery(4, 1_600_000, 40),
        ];
        let agg = mastery_by_category(&catalog, &records);

        let keys: Vec<&str> = agg.groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["warframe", "primary", "necramech"]);

        let primary = &agg.groups[1].counters;
        assert_eq!(primary.total, 2);
        assert_eq!(primary.mastered, 1);
        assert_eq!(primary.xp_earned, 450_000 + 112_500);
        assert_eq!(primary.xp_total, 900_000);

        assert_eq!(agg.total.total, 4);
        assert_eq!(agg.total.mastered, 2);
    }

    #[test]
    fn star_chart_by_region_splits_modes() {
        let catalog = CatalogSnapshot::new(
            1,
            vec![],
            vec![
                node(1, "Earth", 24),
                node(2, "Earth", 30),
                node(3, "Mercury", 12),
                node(4, "Proxima", 100),
            ],
        );
        let completions = vec![
            completion(1, false, 5),
            completion(1, true, 5),
            completion(2, false, 0),
            completion(3, false, 1),
        ];
        let agg = star_chart_by_region(&catalog, &completions);
        let keys: Vec<&str> = agg.groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["Mercury", "Earth", "Proxima"]);

        let earth = &agg.groups[1].counters;
        assert_eq!(earth.total, 2);
        assert_eq!(earth.completed, 1);
        assert_eq!(earth.steel_path_completed, 1);

        assert_eq!(agg.total.total, 4);
        assert_eq!(agg.total.completed, 2);
    }

    #[test]
    fn exploration_rewards_each_mode() {
        let catalog =
            CatalogSnapshot::new(1, vec![], vec![node(1, "Earth", 24), node(2, "Mars", 30)]);
        let completions = vec![
            completion(1, false, 5),
            completion(1, true, 5),
            completion(2, false, 0),
            completion(9, false, 3),
        ];
        assert_eq!(exploration_score(&catalog, &completions), 48);
    }
}
