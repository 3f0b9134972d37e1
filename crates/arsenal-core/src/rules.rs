//! Declarative classification rules.
//!
//! A [`RuleTable`] holds three layers of configuration, each an ordered list
//! evaluated short-circuit:
//!
//! - global exclusions and global cap overrides, applied across categories;
//! - per-category rules: detector, include and exclude matchers, default cap;
//! - per-item cap overrides and special inclusions inside each category.
//!
//! Matchers are a closed tagged union: exact equality, a regex pattern, or a
//! plain predicate over the raw record.

use regex::Regex;
use thiserror::Error;

use crate::catalog::RawItem;
use crate::category::Category;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Raw record field a matcher reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    NaturalKey,
    Name,
}

impl Field {
    fn read(self, raw: &RawItem) -> &str {
        match self {
            Self::NaturalKey => &raw.unique_name,
            Self::Name => &raw.name,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Matcher {
    Exact { field: Field, value: String },
    Pattern { field: Field, regex: Regex },
    Predicate(fn(&RawItem) -> bool),
}

impl Matcher {
    pub fn exact_key(value: impl Into<String>) -> Self {
        Self::Exact {
            field: Field::NaturalKey,
            value: value.into(),
        }
    }

    pub fn exact_name(value: impl Into<String>) -> Self {
        Self::Exact {
            field: Field::Name,
            value: value.into(),
        }
    }

    pub fn key_pattern(pattern: &str) -> Result<Self, RuleError> {
        Self::pattern(Field::NaturalKey, pattern)
    }

    pub fn name_pattern(pattern: &str) -> Result<Self, RuleError> {
        Self::pattern(Field::Name, pattern)
    }

    pub fn pattern(field: Field, pattern: &str) -> Result<Self, RuleError> {
        let regex = Regex::new(pattern).map_err(|source| RuleError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self::Pattern { field, regex })
    }

    pub fn matches(&self, raw: &RawItem) -> bool {
        match self {
            Self::Exact { field, value } => field.read(raw) == value,
            Self::Pattern { field, regex } => regex.is_match(field.read(raw)),
            Self::Predicate(f) => f(raw),
        }
    }
}

pub(crate) fn any_match(matchers: &[Matcher], raw: &RawItem) -> bool {
    matchers.iter().any(|m| m.matches(raw))
}

/// A matcher paired with the progression cap it assigns.
#[derive(Debug, Clone)]
pub struct CapOverride {
    pub matcher: Matcher,
    pub cap: u32,
}

impl CapOverride {
    pub fn new(matcher: Matcher, cap: u32) -> Self {
        Self { matcher, cap }
    }
}

/// Configuration for one canonical category.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub category: Category,
    /// Claims items ahead of include matching and external-category fallback.
    pub detector: Option<Matcher>,
    pub include: Vec<Matcher>,
    pub exclude: Vec<Matcher>,
    pub cap_overrides: Vec<CapOverride>,
    pub default_cap: Option<u32>,
    /// Records seeded even when flagged non-progressable upstream.
    pub special_inclusions: Vec<Matcher>,
}

impl CategoryRule {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            detector: None,
            include: Vec::new(),
            exclude: Vec::new(),
            cap_overrides: Vec::new(),
            default_cap: None,
            special_inclusions: Vec::new(),
        }
    }

    pub fn detector(mut self, matcher: Matcher) -> Self {
        self.detector = Some(matcher);
        self
    }

    pub fn include(mut self, matcher: Matcher) -> Self {
        self.include.push(matcher);
        self
    }

    pub fn exclude(mut self, matcher: Matcher) -> Self {
        self.exclude.push(matcher);
        self
    }

    pub fn cap_override(mut self, matcher: Matcher, cap: u32) -> Self {
        self.cap_overrides.push(CapOverride::new(matcher, cap));
        self
    }

    pub fn default_cap(mut self, cap: u32) -> Self {
        self.default_cap = Some(cap);
        self
    }

    pub fn special_inclusion(mut self, matcher: Matcher) -> Self {
        self.special_inclusions.push(matcher);
        self
    }

    pub(crate) fn excludes(&self, raw: &RawItem) -> bool {
        any_match(&self.exclude, raw)
    }
}

/// The full classification configuration.
///
/// `categories` is evaluated in declaration order; the first category to
/// claim an item wins.
#[derive(Debug, Clone)]
pub struct RuleTable {
    pub global_exclusions: Vec<Matcher>,
    pub global_cap_overrides: Vec<CapOverride>,
    pub categories: Vec<CategoryRule>,
    pub premium_marker: Matcher,
}

impl RuleTable {
    /// An empty table with the standard premium marker.
    pub fn new() -> Result<Self, RuleError> {
        Ok(Self {
            global_exclusions: Vec::new(),
            global_cap_overrides: Vec::new(),
            categories: Vec::new(),
            premium_marker: Matcher::name_pattern(r"\bPrime\b")?,
        })
    }

    pub fn rule(&self, category: Category) -> Option<&CategoryRule> {
        self.categories.iter().find(|r| r.category == category)
    }

    /// The rule table for the upstream item catalog.
    pub fn standard() -> Result<Self, RuleError> {
        let mut table = Self::new()?;

        table.global_exclusions = vec![
            // Conclave-only variants.
            Matcher::key_pattern("PvPVariant")?,
            // Secondary parts of modular weapons; only the primary part
            // (chamber, strike, prism) carries mastery.
            Matcher::key_pattern("/(Handle|Clip|Balance|Grip|Chassis|Link)s?/")?,
        ];

        table.global_cap_overrides = vec![CapOverride::new(
            Matcher::name_pattern(r"^(Kuva|Tenet|Coda) ")?,
            40,
        )];

        table.categories = vec![
            CategoryRule::new(Category::Necramech)
                .detector(Matcher::key_pattern("^/Lotus/Powersuits/EntratiMech/")?)
                .exclude(Matcher::key_pattern("Weapon")?)
                .default_cap(40),
            CategoryRule::new(Category::Archwing)
                .detector(Matcher::key_pattern("^/Lotus/Powersuits/Archwing/")?),
            CategoryRule::new(Category::Warframe)
                .exclude(Matcher::key_pattern("/Powersuits/(EntratiMech|Archwing)/")?),
            CategoryRule::new(Category::Kitgun)
                .detector(Matcher::key_pattern(r"/SUModular(Primary|Secondary)Set\d+/Barrel/")?),
            CategoryRule::new(Category::Zaw)
                .detector(Matcher::key_pattern(r"/Ostron/Melee/ModularMelee\d+/Tip/")?),
            CategoryRule::new(Category::Amp).detector(Matcher::key_pattern(
                "/OperatorAmplifiers/(.*/Barrel/|SentTrainingAmplifier/)",
            )?),
            CategoryRule::new(Category::SentinelWeapon)
                .detector(Matcher::key_pattern("/Types/Sentinels/SentinelWeapons/")?),
            CategoryRule::new(Category::Primary),
            CategoryRule::new(Category::Secondary),
            CategoryRule::new(Category::Melee)
                .cap_override(Matcher::exact_name("Paracesis"), 40),
            CategoryRule::new(Category::ArchGun),
            CategoryRule::new(Category::ArchMelee),
            CategoryRule::new(Category::Sentinel),
            CategoryRule::new(Category::Companion)
                .include(Matcher::Predicate(is_companion_product))
                .special_inclusion(Matcher::exact_name("Helminth Charger")),
            CategoryRule::new(Category::KDrive)
                .include(Matcher::key_pattern("^/Lotus/Types/Vehicles/Hoverboard/.*Deck")?),
        ];

        Ok(table)
    }
}

fn is_companion_product(raw: &RawItem) -> bool {
    matches!(
        raw.product_category.as_deref(),
        Some("KubrowPets" | "MoaPets" | "ZanukaPets")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(key: &str, name: &str) -> RawItem {
        RawItem::new(key, name)
    }

    #[test]
    fn exact_matchers_compare_whole_field() {
        let item = raw("/Lotus/Weapons/Tenno/Melee/Paracesis", "Paracesis");
        assert!(Matcher::exact_name("Paracesis").matches(&item));
        assert!(!Matcher::exact_name("Parac").matches(&item));
        assert!(Matcher::exact_key("/Lotus/Weapons/Tenno/Melee/Paracesis").matches(&item));
    }

    #[test]
    fn pattern_matchers_search_field() {
        let item = raw("/Lotus/Weapons/Tenno/Rifle/BratonPvPVariant", "Braton");
        assert!(Matcher::key_pattern("PvPVariant").unwrap().matches(&item));
        assert!(!Matcher::name_pattern("PvPVariant").unwrap().matches(&item));
    }

    #[test]
    fn predicate_matchers_see_raw_record() {
        let mut item = raw("/Lotus/Types/Game/CatbrowPet/CheshireCatbrowPetPowerSuit", "Smeeta");
        assert!(!Matcher::Predicate(is_companion_product).matches(&item));
        item.product_category = Some("KubrowPets".into());
        assert!(Matcher::Predicate(is_companion_product).matches(&item));
    }

    #[test]
    fn bad_pattern_is_an_error() {
        let err = Matcher::key_pattern("(unclosed").unwrap_err();
        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn standard_table_covers_every_category_once() {
        let table = RuleTable::standard().unwrap();
        assert_eq!(table.categories.len(), Category::ALL.len());
        for category in Category::ALL {
            assert!(table.rule(category).is_some(), "missing rule for {category}");
        }
    }
}
