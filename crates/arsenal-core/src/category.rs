//! Canonical gameplay categories.
//!
//! The enumeration is owned locally and is deliberately independent of the
//! grouping used by the upstream catalog source. Classification order lives
//! in the rule table and presentation order in [`crate::aggregate`]; neither
//! depends on declaration order here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Progression-formula regime of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    /// Frames, companions, vehicles: multiplier 1000, 200 points per rank.
    Frame,
    /// Weapons and operator gear: multiplier 500, 100 points per rank.
    Equipment,
}

impl Regime {
    /// XP multiplier used by the rank formula.
    pub fn multiplier(self) -> u64 {
        match self {
            Self::Frame => 1000,
            Self::Equipment => 500,
        }
    }

    /// Score points awarded per rank.
    pub fn points_per_rank(self) -> u64 {
        match self {
            Self::Frame => 200,
            Self::Equipment => 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Necramech,
    Archwing,
    Warframe,
    Kitgun,
    Zaw,
    Amp,
    SentinelWeapon,
    Primary,
    Secondary,
    Melee,
    ArchGun,
    ArchMelee,
    Sentinel,
    Companion,
    KDrive,
}

impl Category {
    /// Every category.
    pub const ALL: [Category; 15] = [
        Self::Necramech,
        Self::Archwing,
        Self::Warframe,
        Self::Kitgun,
        Self::Zaw,
        Self::Amp,
        Self::SentinelWeapon,
        Self::Primary,
        Self::Secondary,
        Self::Melee,
        Self::ArchGun,
        Self::ArchMelee,
        Self::Sentinel,
        Self::Companion,
        Self::KDrive,
    ];

    pub fn regime(self) -> Regime {
        match self {
            Self::Warframe
            | Self::Archwing
            | Self::Necramech
            | Self::Sentinel
            | Self::Companion
            | Self::KDrive => Regime::Frame,
            Self::Primary
            | Self::Secondary
            | Self::Melee
            | Self::Kitgun
            | Self::Zaw
            | Self::Amp
            | Self::SentinelWeapon
            | Self::ArchGun
            | Self::ArchMelee => Regime::Equipment,
        }
    }

    /// Stable identifier used in storage and on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Necramech => "necramech",
            Self::Archwing => "archwing",
            Self::Warframe => "warframe",
            Self::Kitgun => "kitgun",
            Self::Zaw => "zaw",
            Self::Amp => "amp",
            Self::SentinelWeapon => "sentinel_weapon",
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Melee => "melee",
            Self::ArchGun => "arch_gun",
            Self::ArchMelee => "arch_melee",
            Self::Sentinel => "sentinel",
            Self::Companion => "companion",
            Self::KDrive => "k_drive",
        }
    }

    /// Category name as the upstream catalog source spells it.
    pub fn external_name(self) -> &'static str {
        match self {
            Self::Necramech => "Necramechs",
            Self::Archwing => "Archwing",
            Self::Warframe => "Warframes",
            Self::Kitgun => "Kitguns",
            Self::Zaw => "Zaws",
            Self::Amp => "Amps",
            Self::SentinelWeapon => "SentinelWeapons",
            Self::Primary => "Primary",
            Self::Secondary => "Secondary",
            Self::Melee => "Melee",
            Self::ArchGun => "ArchGun",
            Self::ArchMelee => "ArchMelee",
            Self::Sentinel => "Sentinels",
            Self::Companion => "Pets",
            Self::KDrive => "KDrive",
        }
    }

    /// Human-readable label for summaries.
    pub fn label(self) -> &'static str {
        match self {
            Self::Necramech => "Necramechs",
            Self::Archwing => "Archwings",
            Self::Warframe => "Warframes",
            Self::Kitgun => "Kitguns",
            Self::Zaw => "Zaws",
            Self::Amp => "Amps",
            Self::SentinelWeapon => "Sentinel Weapons",
            Self::Primary => "Primary",
            Self::Secondary => "Secondary",
            Self::Melee => "Melee",
            Self::ArchGun => "Arch-Guns",
            Self::ArchMelee => "Arch-Melee",
            Self::Sentinel => "Sentinels",
            Self::Companion => "Companions",
            Self::KDrive => "K-Drives",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}
