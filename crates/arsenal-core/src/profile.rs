//! External account snapshot, as reported by the player profile source.
//!
//! Untrusted and ephemeral: consumed once by reconciliation, never stored
//! verbatim. Every section defaults to empty so partial payloads parse.

use serde::{Deserialize, Serialize};

use crate::records::CombatStats;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub xp: Vec<XpEntry>,
    #[serde(default)]
    pub stats: Vec<StatsEntry>,
    #[serde(default)]
    pub loadout: LoadoutSnapshot,
    #[serde(default)]
    pub intrinsics: IntrinsicsSnapshot,
    #[serde(default)]
    pub missions: Vec<MissionEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XpEntry {
    pub natural_key: String,
    pub xp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsEntry {
    pub natural_key: String,
    #[serde(flatten)]
    pub stats: CombatStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadoutSnapshot {
    #[serde(default)]
    pub frame: Option<String>,
    #[serde(default)]
    pub primary: Option<String>,
    #[serde(default)]
    pub secondary: Option<String>,
    #[serde(default)]
    pub melee: Option<String>,
    #[serde(default)]
    pub focus: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrinsicsSnapshot {
    #[serde(default)]
    pub railjack: RailjackSkills,
    #[serde(default)]
    pub drifter: DrifterSkills,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RailjackSkills {
    pub tactical: u32,
    pub piloting: u32,
    pub gunnery: u32,
    pub engineering: u32,
    pub command: u32,
}

impl RailjackSkills {
    pub fn total(&self) -> u32 {
        self.tactical
            .saturating_add(self.piloting)
            .saturating_add(self.gunnery)
            .saturating_add(self.engineering)
            .saturating_add(self.command)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrifterSkills {
    pub riding: u32,
    pub combat: u32,
    pub opportunity: u32,
    pub endurance: u32,
}

impl DrifterSkills {
    pub fn total(&self) -> u32 {
        self.riding
            .saturating_add(self.combat)
            .saturating_add(self.opportunity)
            .saturating_add(self.endurance)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionEntry {
    pub node_key: String,
    #[serde(default)]
    pub completes: u32,
    /// Present and non-zero for steel path completions.
    #[serde(default)]
    pub tier: Option<u32>,
}

impl MissionEntry {
    pub fn is_hard_mode(&self) -> bool {
        self.tier.is_some_and(|t| t > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_snapshot() {
        let json = r#"{
            "displayName": "Tenno123",
            "xp": [{"naturalKey": "/Lotus/Powersuits/Excalibur/Excalibur", "xp": 900000}],
            "stats": [{"naturalKey": "/Lotus/Weapons/Tenno/Rifle/Rifle", "kills": 40, "headshots": 7}],
            "loadout": {"frame": "/Lotus/Powersuits/Excalibur/Excalibur", "focus": "Madurai"},
            "intrinsics": {
                "railjack": {"tactical": 10, "piloting": 10, "gunnery": 10, "engineering": 10, "command": 10},
                "drifter": {"riding": 10, "combat": 10, "opportunity": 10, "endurance": 10}
            },
            "missions": [{"nodeKey": "SolNode27", "completes": 5, "tier": 1}]
        }"#;
        let snapshot: ProfileSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.display_name.as_deref(), Some("Tenno123"));
        assert_eq!(snapshot.xp[0].xp, 900_000);
        assert_eq!(snapshot.stats[0].stats.kills, Some(40));
        assert!(snapshot.stats[0].stats.fired.is_none());
        assert!(snapshot.loadout.primary.is_none());
        assert_eq!(snapshot.intrinsics.railjack.total(), 50);
        assert_eq!(snapshot.intrinsics.drifter.total(), 40);
        assert!(snapshot.missions[0].is_hard_mode());
    }

    #[test]
    fn empty_object_is_an_empty_snapshot() {
        let snapshot: ProfileSnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snapshot, ProfileSnapshot::default());
    }

    #[test]
    fn tier_zero_is_normal_mode() {
        let entry = MissionEntry {
            node_key: "SolNode1".into(),
            completes: 3,
            tier: Some(0),
        };
        assert!(!entry.is_hard_mode());
    }
}
