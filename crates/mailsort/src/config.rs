//! Classifier configuration: category table lookup and calibration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use mailsort_core::{Calibrator, CategoryTable, Classifier};
use tracing::info;

use crate::cli::Cli;

/// Where the category table comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSource {
    /// A file named on the command line or in `MAILSORT_TABLE`.
    Explicit(PathBuf),
    /// The per-user table in the config directory.
    UserConfig(PathBuf),
    /// The table compiled into the binary.
    Builtin,
}

impl TableSource {
    /// Resolves the table source for the given arguments.
    ///
    /// An explicit path wins; otherwise the user table is used if it exists.
    #[must_use]
    pub fn resolve(explicit: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            return Self::Explicit(path.to_path_buf());
        }
        let user_table = user_table_path();
        if user_table.exists() {
            Self::UserConfig(user_table)
        } else {
            Self::Builtin
        }
    }
}

/// Path of the per-user table, `<config dir>/mailsort/table.json`.
#[must_use]
pub fn user_table_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailsort")
        .join("table.json")
}

/// Loads and validates a category table file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid table.
pub async fn load_table(path: &Path) -> anyhow::Result<CategoryTable> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read category table {}", path.display()))?;

    CategoryTable::from_json(&contents)
        .with_context(|| format!("Invalid category table {}", path.display()))
}

/// Builds the classifier described by the command-line arguments.
///
/// # Errors
///
/// Returns an error if a table file is selected but cannot be loaded.
pub async fn build_classifier(cli: &Cli) -> anyhow::Result<Classifier> {
    let calibrator = Calibrator::new()
        .with_floor(cli.floor)
        .with_min_confidence(cli.min_confidence);

    match TableSource::resolve(cli.table.as_deref()) {
        TableSource::Explicit(path) | TableSource::UserConfig(path) => {
            let table = load_table(&path).await?;
            info!(
                "Loaded category table {:?} (version {}, {} categories)",
                path,
                table.registry().version(),
                table.len()
            );
            Ok(Classifier::new(Arc::new(table), calibrator))
        }
        TableSource::Builtin => Ok(Classifier::builtin().with_calibrator(calibrator)),
    }
}
