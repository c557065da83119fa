//! Serializable form of a category table.
//!
//! ```json
//! {
//!   "version": 1,
//!   "default_category": "general",
//!   "signals": {
//!     "urgency": { "kind": "keyword", "terms": ["urgent", "asap"] },
//!     "bang": { "kind": "exclamation", "saturation": 3 }
//!   },
//!   "categories": [
//!     { "id": "general", "label": "일반" },
//!     { "id": "urgent", "label": "긴급", "weights": { "urgency": 1.0, "bang": 0.25 } }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::signal::SignalKind;

const fn default_version() -> u32 {
    1
}

/// JSON representation of a [`CategoryTable`](super::CategoryTable).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableConfig {
    /// Signal registry version.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Id of the reserved fallback category.
    pub default_category: String,
    /// Signal definitions by name.
    #[serde(default)]
    pub signals: BTreeMap<String, SignalKind>,
    /// Categories in any order.
    pub categories: Vec<CategoryConfig>,
}

/// JSON representation of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryConfig {
    /// Category id.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Weight per signal name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub weights: BTreeMap<String, f64>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::super::CategoryTable;
    use super::*;
    use crate::Error;

    const SAMPLE: &str = r#"{
        "default_category": "general",
        "signals": {
            "urgency": { "kind": "keyword", "terms": ["urgent", "asap"] },
            "deadline": { "kind": "pattern", "pattern": "\\bby (today|tomorrow)\\b", "scope": "body" }
        },
        "categories": [
            { "id": "urgent", "label": "긴급", "weights": { "urgency": 1.0, "deadline": 0.5 } },
            { "id": "general", "label": "일반" }
        ]
    }"#;

    #[test]
    fn test_parse_sample() {
        let config: TableConfig = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(config.version, 1);
        assert_eq!(config.signals.len(), 2);
        assert!(config.categories[1].weights.is_empty());
    }

    #[test]
    fn test_table_from_json() {
        let table = CategoryTable::from_json(SAMPLE).unwrap();
        assert_eq!(table.default_category().label, "일반");
        assert_eq!(table.get("urgent").unwrap().weight("deadline"), 0.5);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let json = r#"{ "default_category": "g", "categories": [], "extra": 1 }"#;
        assert!(matches!(
            CategoryTable::from_json(json),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_bad_pattern_reported() {
        let json = r#"{
            "default_category": "g",
            "signals": { "broken": { "kind": "pattern", "pattern": "([" } },
            "categories": [ { "id": "g", "label": "G" } ]
        }"#;
        assert!(matches!(
            CategoryTable::from_json(json),
            Err(Error::Pattern { .. })
        ));
    }
}
