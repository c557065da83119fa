//! Category tables: the fixed taxonomy and its signal weights.
//!
//! A [`CategoryTable`] owns the [`SignalRegistry`] its weights refer to and
//! names one reserved default category that wins when no evidence is found.
//! Tables are validated once when built and never change afterwards, so a
//! single table can be shared between any number of classifiers and threads.
//!
//! # Example
//!
//! ```ignore
//! use mailsort_core::{CategoryTable, SignalKind};
//!
//! let table = CategoryTable::builder()
//!     .signal("urgency", SignalKind::keywords(["urgent", "asap"]))
//!     .category("general", "General")
//!     .category("urgent", "Urgent")
//!     .weight("urgent", "urgency", 1.0)
//!     .default_category("general")
//!     .build()?;
//! ```

mod builtin;
mod config;

pub use builtin::{BUILTIN_VERSION, builtin};
pub use config::{CategoryConfig, TableConfig};

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::signal::{SignalKind, SignalRegistry};

/// Largest accepted weight magnitude. Keeps every raw score finite.
pub const MAX_WEIGHT: f64 = 1e6;

/// Stable identifier of a category, used for tie-breaking and configuration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(String);

impl CategoryId {
    /// Creates a new category id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CategoryId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl std::borrow::Borrow<str> for CategoryId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// One entry of the taxonomy.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    /// Identifier.
    pub id: CategoryId,
    /// Label returned to callers; may be localized.
    pub label: String,
    /// Weight per signal name. Signals not listed weigh zero.
    pub weights: BTreeMap<String, f64>,
}

impl Category {
    /// Returns the weight of a signal for this category.
    #[must_use]
    pub fn weight(&self, signal: &str) -> f64 {
        self.weights.get(signal).copied().unwrap_or(0.0)
    }
}

/// Immutable, validated category table.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    registry: SignalRegistry,
    /// Sorted by id.
    categories: Vec<Category>,
    default_category: CategoryId,
}

impl CategoryTable {
    /// Creates a builder for a new table.
    #[must_use]
    pub fn builder() -> CategoryTableBuilder {
        CategoryTableBuilder::new()
    }

    /// Creates a table holding only the given default category and no signals.
    ///
    /// Every message classified against it falls back to that category.
    #[must_use]
    pub fn fallback_only(id: impl Into<String>, label: impl Into<String>) -> Self {
        let id = CategoryId::new(id);
        Self {
            registry: SignalRegistry::new(0),
            categories: vec![Category {
                id: id.clone(),
                label: label.into(),
                weights: BTreeMap::new(),
            }],
            default_category: id,
        }
    }

    /// Parses and validates a table from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the table is invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: TableConfig = serde_json::from_str(json)?;
        Self::from_config(config)
    }

    /// Validates a table configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is invalid.
    pub fn from_config(config: TableConfig) -> Result<Self> {
        let mut builder = Self::builder()
            .version(config.version)
            .default_category(config.default_category);

        for (name, kind) in config.signals {
            builder = builder.signal(name, kind);
        }
        for category in config.categories {
            let id = category.id.clone();
            builder = builder.category(category.id, category.label);
            for (signal, weight) in category.weights {
                builder = builder.weight(id.clone(), signal, weight);
            }
        }

        builder.build()
    }

    /// Converts the table back into its serializable form.
    #[must_use]
    pub fn to_config(&self) -> TableConfig {
        TableConfig {
            version: self.registry.version(),
            default_category: self.default_category.to_string(),
            signals: self
                .registry
                .iter()
                .map(|def| (def.name().to_string(), def.kind().clone()))
                .collect(),
            categories: self
                .categories
                .iter()
                .map(|c| CategoryConfig {
                    id: c.id.to_string(),
                    label: c.label.clone(),
                    weights: c.weights.clone(),
                })
                .collect(),
        }
    }

    /// Returns the signal registry.
    #[must_use]
    pub const fn registry(&self) -> &SignalRegistry {
        &self.registry
    }

    /// Iterates over categories in id order.
    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    /// Looks up a category by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Category> {
        self.categories
            .binary_search_by(|c| c.id.as_str().cmp(id))
            .ok()
            .map(|idx| &self.categories[idx])
    }

    /// Returns the reserved fallback category.
    #[must_use]
    pub fn default_category(&self) -> &Category {
        // Validated at build time.
        self.get(self.default_category.as_str())
            .unwrap_or(&self.categories[0])
    }

    /// Returns the number of categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Always false: a table has at least one category.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Builder for [`CategoryTable`].
///
/// Errors are collected and reported by [`build`](Self::build) so the
/// builder can be chained.
#[derive(Debug, Default)]
pub struct CategoryTableBuilder {
    version: u32,
    signals: Vec<(String, SignalKind)>,
    categories: Vec<Category>,
    weights: Vec<(String, String, f64)>,
    default_category: Option<String>,
}

impl CategoryTableBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the signal registry version.
    #[must_use]
    pub const fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Registers a signal.
    #[must_use]
    pub fn signal(mut self, name: impl Into<String>, kind: SignalKind) -> Self {
        self.signals.push((name.into(), kind));
        self
    }

    /// Adds a category with no weights.
    #[must_use]
    pub fn category(mut self, id: impl Into<String>, label: impl Into<String>) -> Self {
        self.categories.push(Category {
            id: CategoryId::new(id),
            label: label.into(),
            weights: BTreeMap::new(),
        });
        self
    }

    /// Sets the weight of `signal` for `category`.
    #[must_use]
    pub fn weight(
        mut self,
        category: impl Into<String>,
        signal: impl Into<String>,
        weight: f64,
    ) -> Self {
        self.weights.push((category.into(), signal.into(), weight));
        self
    }

    /// Names the reserved fallback category.
    #[must_use]
    pub fn default_category(mut self, id: impl Into<String>) -> Self {
        self.default_category = Some(id.into());
        self
    }

    /// Validates and builds the table.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no categories, a category id is empty or
    /// duplicated, the default category is missing or unknown, a weight
    /// refers to an unknown category or unregistered signal, a weight is set
    /// twice, a weight is not finite or exceeds [`MAX_WEIGHT`] in magnitude,
    /// or a signal definition is invalid.
    pub fn build(self) -> Result<CategoryTable> {
        let mut registry = SignalRegistry::new(self.version);
        for (name, kind) in self.signals {
            registry.register(name, kind)?;
        }

        if self.categories.is_empty() {
            return Err(Error::Table("table has no categories".to_string()));
        }

        let mut categories = self.categories;
        categories.sort_by(|a, b| a.id.cmp(&b.id));
        for pair in categories.windows(2) {
            if pair[0].id == pair[1].id {
                return Err(Error::Table(format!(
                    "category `{}` is defined twice",
                    pair[0].id
                )));
            }
        }
        if let Some(category) = categories.iter().find(|c| c.id.as_str().trim().is_empty()) {
            return Err(Error::Table(format!(
                "category with label `{}` has an empty id",
                category.label
            )));
        }

        for (category, signal, weight) in self.weights {
            if !weight.is_finite() {
                return Err(Error::Table(format!(
                    "category `{category}` has a non-finite weight for `{signal}`"
                )));
            }
            if weight.abs() > MAX_WEIGHT {
                return Err(Error::Table(format!(
                    "category `{category}` has an out-of-range weight for `{signal}`"
                )));
            }
            if !registry.contains(&signal) {
                return Err(Error::Table(format!(
                    "category `{category}` weights unregistered signal `{signal}`"
                )));
            }
            let entry = categories
                .binary_search_by(|c| c.id.as_str().cmp(&category))
                .map_err(|_| {
                    Error::Table(format!("weight for unknown category `{category}`"))
                })?;
            if categories[entry].weights.contains_key(&signal) {
                return Err(Error::Table(format!(
                    "category `{category}` weights `{signal}` twice"
                )));
            }
            categories[entry].weights.insert(signal, weight);
        }

        let default_category = self
            .default_category
            .ok_or_else(|| Error::Table("no default category named".to_string()))?;
        if categories
            .binary_search_by(|c| c.id.as_str().cmp(&default_category))
            .is_err()
        {
            return Err(Error::Table(format!(
                "default category `{default_category}` is not defined"
            )));
        }

        debug!(
            version = registry.version(),
            signals = registry.len(),
            categories = categories.len(),
            default = %default_category,
            "Built category table"
        );

        Ok(CategoryTable {
            registry,
            categories,
            default_category: CategoryId::new(default_category),
        })
    }
}
