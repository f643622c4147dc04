// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Diff Engine - Field-Level Record Diffs
//!
//! Compares two record snapshots field by field and classifies the business
//! impact of every change. The diff is minimal: equal fields produce nothing.

use super::objects::{Change, ChangeType};
use offervcs_core::{ImpactConfig, ImpactLevel, OfferRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Path prefix for top-level record fields
pub const PATH_PREFIX: &str = "offer";

/// Counts per change type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub added: usize,
    pub modified: usize,
    pub removed: usize,
    pub highest_impact: Option<ImpactLevel>,
}

impl DiffStats {
    pub fn from_changes(changes: &[Change]) -> Self {
        let mut stats = Self::default();
        for change in changes {
            match change.change_type {
                ChangeType::Added => stats.added += 1,
                ChangeType::Modified => stats.modified += 1,
                ChangeType::Removed => stats.removed += 1,
            }
            stats.highest_impact = stats.highest_impact.max(Some(change.impact));
        }
        stats
    }

    pub fn total(&self) -> usize {
        self.added + self.modified + self.removed
    }
}

/// Field-level diff engine
#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    config: ImpactConfig,
}

impl DiffEngine {
    /// Create a diff engine with default thresholds
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ImpactConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ImpactConfig {
        &self.config
    }

    /// One change per differing top-level field, sorted by field name
    pub fn diff_records(&self, old: &OfferRecord, new: &OfferRecord) -> Vec<Change> {
        let fields: BTreeSet<&str> = old.field_names().chain(new.field_names()).collect();

        fields
            .into_iter()
            .filter_map(|field| self.diff_field(field, old.get(field), new.get(field)))
            .collect()
    }

    /// Compare one field; `None` when the values are equal
    pub fn diff_field(
        &self,
        field: &str,
        old: Option<&Value>,
        new: Option<&Value>,
    ) -> Option<Change> {
        let (change_type, description) = match (old, new) {
            (None, None) => return None,
            (o, n) if values_equal(o, n) => return None,
            (Some(o), Some(n)) => (ChangeType::Modified, describe_modified(field, o, n)),
            (None, Some(_)) => (ChangeType::Added, format!("Field {} added", field)),
            (Some(_), None) => (ChangeType::Removed, format!("Field {} removed", field)),
        };

        Some(Change {
            change_type,
            path: field_path(field),
            field: field.to_string(),
            old_value: old.cloned(),
            new_value: new.cloned(),
            description,
            impact: self.classify(field, old, new),
        })
    }

    /// Impact of a change: per-field override, then the numeric rule, then low
    pub fn classify(&self, field: &str, old: Option<&Value>, new: Option<&Value>) -> ImpactLevel {
        if let Some(level) = self.config.override_for(field) {
            return level;
        }

        match (old.and_then(Value::as_f64), new.and_then(Value::as_f64)) {
            (Some(o), Some(n)) => self.classify_numeric(o, n),
            _ => ImpactLevel::Low,
        }
    }

    /// Classify by percentage delta from `old` to `new`
    pub fn classify_numeric(&self, old: f64, new: f64) -> ImpactLevel {
        if old == new {
            return ImpactLevel::Low;
        }
        if old == 0.0 {
            return ImpactLevel::Critical;
        }
        self.config.classify_pct((new - old) * 100.0 / old.abs())
    }
}

/// Apply a change list to a snapshot
///
/// `apply_changes(a, diff_records(a, b)) == b` for any two records.
pub fn apply_changes(base: &OfferRecord, changes: &[Change]) -> OfferRecord {
    let mut record = base.clone();
    for change in changes {
        match (&change.change_type, &change.new_value) {
            (ChangeType::Removed, _) | (_, None) => {
                record.remove(&change.field);
            }
            (_, Some(value)) => {
                record.set(change.field.clone(), value.clone());
            }
        }
    }
    record
}

/// Field value equality, numeric when both sides are numbers
///
/// `100` and `100.0` are the same price even though their JSON differs.
pub fn values_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

/// Structural path for a top-level field
pub fn field_path(field: &str) -> String {
    format!("{}.{}", PATH_PREFIX, field)
}

fn describe_modified(field: &str, old: &Value, new: &Value) -> String {
    match (old.as_f64(), new.as_f64()) {
        (Some(o), Some(n)) => format!("{} changed from {:.2} to {:.2}", capitalize(field), o, n),
        _ => format!("Field {} updated", field),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_identical_records_have_no_changes() {
        let engine = DiffEngine::new();
        let record = OfferRecord::new("off1").with("price", 100);
        assert!(engine.diff_records(&record, &record).is_empty());
    }

    #[test]
    fn test_price_change_impact_boundaries() {
        let engine = DiffEngine::new();
        let base = OfferRecord::new("off1").with("price", 100);

        let cases = [
            (105, ImpactLevel::Low),
            (106, ImpactLevel::Medium),
            (110, ImpactLevel::Medium),
            (111, ImpactLevel::High),
            (120, ImpactLevel::High),
            (121, ImpactLevel::Critical),
            (79, ImpactLevel::Critical),
        ];

        for (price, expected) in cases {
            let changes = engine.diff_records(&base, &base.clone().with("price", price));
            assert_eq!(changes.len(), 1, "price {}", price);
            assert_eq!(changes[0].impact, expected, "price {}", price);
            assert_eq!(changes[0].change_type, ChangeType::Modified);
            assert_eq!(changes[0].path, "offer.price");
        }
    }

    #[test]
    fn test_price_description() {
        let engine = DiffEngine::new();
        let old = OfferRecord::new("off1").with("price", 100);
        let new = OfferRecord::new("off1").with("price", 120);
        let changes = engine.diff_records(&old, &new);
        assert_eq!(changes[0].description, "Price changed from 100.00 to 120.00");
    }

    #[test]
    fn test_decimal_prices_at_twenty_percent_are_high() {
        let engine = DiffEngine::new();
        for (old, new) in [(19.99, 23.988), (9.99, 11.988), (49.95, 59.94), (12.5, 15.0)] {
            assert_eq!(engine.classify_numeric(old, new), ImpactLevel::High, "{} -> {}", old, new);
        }

        let base = OfferRecord::new("off1").with("price", 19.99);
        let changes = engine.diff_records(&base, &base.clone().with("price", 23.988));
        assert_eq!(changes[0].impact, ImpactLevel::High);
    }

    #[test]
    fn test_numerically_equal_values_produce_no_change() {
        let engine = DiffEngine::new();
        let old = OfferRecord::new("off1").with("price", 100);
        let new = OfferRecord::new("off1").with("price", 100.0);
        assert!(engine.diff_records(&old, &new).is_empty());

        assert!(values_equal(Some(&json!(100)), Some(&json!(100.0))));
        assert!(!values_equal(Some(&json!(100)), Some(&json!("100"))));
        assert!(!values_equal(Some(&json!(100)), None));
        assert!(values_equal(None, None));
    }

    #[test]
    fn test_zero_old_value_is_critical() {
        let engine = DiffEngine::new();
        assert_eq!(engine.classify_numeric(0.0, 1.0), ImpactLevel::Critical);
    }

    #[test]
    fn test_added_removed_and_text_fields() {
        let engine = DiffEngine::new();
        let old = OfferRecord::new("off1")
            .with("description", "Saver")
            .with("cabin", "economy");
        let new = OfferRecord::new("off1")
            .with("description", "Saver plus")
            .with("bags", 1);

        let changes = engine.diff_records(&old, &new);
        let summary: Vec<_> = changes
            .iter()
            .map(|c| (c.field.as_str(), c.change_type, c.impact))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("bags", ChangeType::Added, ImpactLevel::Low),
                ("cabin", ChangeType::Removed, ImpactLevel::Low),
                ("description", ChangeType::Modified, ImpactLevel::Low),
            ]
        );
        assert_eq!(changes[1].old_value, Some(json!("economy")));
        assert_eq!(changes[1].new_value, None);
    }

    #[test]
    fn test_field_override() {
        let mut config = ImpactConfig::default();
        config
            .field_overrides
            .insert("currency".to_string(), ImpactLevel::Critical);
        let engine = DiffEngine::with_config(config);

        let old = OfferRecord::new("off1").with("currency", "EUR");
        let new = OfferRecord::new("off1").with("currency", "USD");
        assert_eq!(engine.diff_records(&old, &new)[0].impact, ImpactLevel::Critical);
    }

    #[test]
    fn test_stats() {
        let engine = DiffEngine::new();
        let old = OfferRecord::new("off1").with("price", 100).with("x", 1);
        let new = OfferRecord::new("off1").with("price", 150).with("y", 2);

        let stats = DiffStats::from_changes(&engine.diff_records(&old, &new));
        assert_eq!(stats.added, 1);
        assert_eq!(stats.removed, 1);
        assert_eq!(stats.modified, 1);
        assert_eq!(stats.total(), 3);
        assert_eq!(stats.highest_impact, Some(ImpactLevel::Critical));
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            (1u32..10_000).prop_map(|n| json!(n)),
            "[a-z]{0,6}".prop_map(Value::String),
            any::<bool>().prop_map(Value::Bool),
        ]
    }

    fn arb_record() -> impl Strategy<Value = OfferRecord> {
        prop::collection::btree_map("[a-e]", arb_value(), 0..5).prop_map(OfferRecord::from_fields)
    }

    proptest! {
        #[test]
        fn prop_apply_diff_reproduces_target(a in arb_record(), b in arb_record()) {
            let engine = DiffEngine::new();
            let changes = engine.diff_records(&a, &b);
            prop_assert_eq!(apply_changes(&a, &changes), b);
        }

        #[test]
        fn prop_diff_is_minimal(a in arb_record(), b in arb_record()) {
            let engine = DiffEngine::new();
            for change in engine.diff_records(&a, &b) {
                prop_assert_ne!(change.old_value, change.new_value);
            }
        }
    }
}
