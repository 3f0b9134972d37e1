pub mod aggregate;
pub mod catalog;
pub mod category;
pub mod classify;
pub mod profile;
pub mod progression;
pub mod records;
pub mod rules;

pub use aggregate::{
    Aggregate, CATEGORY_ORDER, Group, MasteryCounts, REGION_ORDER, StarChartCounts,
    exploration_score, mastery_by_category, star_chart_by_region,
};
pub use catalog::{
    CatalogBuild, CatalogEntry, CatalogItem, CatalogSnapshot, NodeEntry, RawItem, RawNode,
    StarChartNode, build_catalog,
};
pub use category::{Category, Regime};
pub use profile::ProfileSnapshot;
pub use progression::{
    LevelProgress, MasteryState, PlayerScore, level_from_total_score, mastery_state_from_rank,
    player_score, rank_from_xp,
};
pub use records::{
    CombatStats, IntrinsicsState, LoadoutAssignment, MasteryRecord, NodeCompletionRecord,
    Platform, Player, SyncSummary,
};
pub use rules::{Matcher, RuleError, RuleTable};
