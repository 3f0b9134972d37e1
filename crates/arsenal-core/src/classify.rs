//! Catalog classification: raw record → canonical category and cap.
//!
//! Precedence, highest first:
//!
//! 1. global exclusions reject the record outright;
//! 2. per category in declared order, a detector match, then an include
//!    match, claims the record unless that category excludes it;
//! 3. the record's own external category string, compared directly and then
//!    after normalization, against each category's external name.
//!
//! Conflicting configuration is never an error: the first rule in declared
//! order wins.

use crate::catalog::RawItem;
use crate::category::Category;
use crate::progression::DEFAULT_CAP;
use crate::rules::{CapOverride, RuleTable, any_match};

/// Upstream category spellings that differ from the canonical external names.
const EXTERNAL_NORMALIZATIONS: &[(&str, &str)] = &[
    ("Arch-Gun", "ArchGun"),
    ("Arch-Melee", "ArchMelee"),
    ("K-Drive", "KDrive"),
    ("Sentinel-Weapons", "SentinelWeapons"),
];

fn normalize_external(external: &str) -> Option<&'static str> {
    EXTERNAL_NORMALIZATIONS
        .iter()
        .find(|(from, _)| *from == external)
        .map(|(_, to)| *to)
}

fn first_override(overrides: &[CapOverride], raw: &RawItem) -> Option<u32> {
    overrides
        .iter()
        .find(|o| o.matcher.matches(raw))
        .map(|o| o.cap)
}

impl RuleTable {
    pub fn is_globally_excluded(&self, raw: &RawItem) -> bool {
        any_match(&self.global_exclusions, raw)
    }

    /// Canonical category for `raw`, or `None` when nothing claims it.
    pub fn classify(&self, raw: &RawItem) -> Option<Category> {
        if self.is_globally_excluded(raw) {
            return None;
        }

        for rule in &self.categories {
            if rule.excludes(raw) {
                continue;
            }
            if rule.detector.as_ref().is_some_and(|d| d.matches(raw)) {
                return Some(rule.category);
            }
            if any_match(&rule.include, raw) {
                return Some(rule.category);
            }
        }

        let external = raw.category.as_deref()?;
        self.match_external(external, raw).or_else(|| {
            normalize_external(external).and_then(|normalized| self.match_external(normalized, raw))
        })
    }

    fn match_external(&self, external: &str, raw: &RawItem) -> Option<Category> {
        self.categories
            .iter()
            .find(|rule| rule.category.external_name() == external && !rule.excludes(raw))
            .map(|rule| rule.category)
    }

    /// Rank ceiling for `raw` once classified into `category`.
    ///
    /// Category overrides, then global overrides, then the category default,
    /// then the record's own hint, then 30.
    pub fn progression_cap(&self, raw: &RawItem, category: Category) -> u32 {
        let rule = self.rule(category);
        rule.and_then(|r| first_override(&r.cap_overrides, raw))
            .or_else(|| first_override(&self.global_cap_overrides, raw))
            .or_else(|| rule.and_then(|r| r.default_cap))
            .or(raw.max_level_cap)
            .unwrap_or(DEFAULT_CAP)
    }

    /// Whether `raw` belongs in the catalog at all.
    ///
    /// Only an explicit non-progressable flag keeps a record out, and a
    /// category's special-inclusion list overrides even that.
    pub fn should_seed(&self, raw: &RawItem) -> bool {
        if raw.masterable != Some(false) {
            return true;
        }
        self.categories
            .iter()
            .any(|rule| any_match(&rule.special_inclusions, raw))
    }

    pub fn is_premium_variant(&self, raw: &RawItem) -> bool {
        self.premium_marker.matches(raw)
    }
}
