//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Classify email messages into categories.
#[derive(Parser, Debug, Default)]
#[command(name = "mailsort", version, about)]
pub struct Cli {
    /// Message subject.
    #[arg(value_name = "SUBJECT", default_value = "")]
    pub subject: String,

    /// Message body.
    #[arg(value_name = "BODY", default_value = "")]
    pub body: String,

    /// Classify a stored RFC 5322 message instead of SUBJECT and BODY.
    #[arg(long, value_name = "FILE", conflicts_with = "batch")]
    pub eml: Option<PathBuf>,

    /// Read `{"subject": ..., "body": ...}` JSON lines from stdin and write
    /// one result line per input.
    #[arg(long)]
    pub batch: bool,

    /// Print the full decision: scores, signals and fallback reason.
    #[arg(long)]
    pub explain: bool,

    /// Category table JSON file. Defaults to `<config dir>/mailsort/table.json`
    /// when present, otherwise the built-in table.
    #[arg(long, value_name = "FILE", env = "MAILSORT_TABLE")]
    pub table: Option<PathBuf>,

    /// Confidence below which the default category is returned.
    #[arg(long, value_name = "SCORE", default_value_t = 0.0, value_parser = parse_unit)]
    pub min_confidence: f64,

    /// Confidence reported when the default category is returned.
    #[arg(long, value_name = "SCORE", default_value_t = 0.0, value_parser = parse_unit)]
    pub floor: f64,

    /// Print single-line JSON.
    #[arg(long)]
    pub compact: bool,

    /// Print the active category table as JSON and exit.
    #[arg(long, conflicts_with_all = ["eml", "batch"])]
    pub print_table: bool,
}

fn parse_unit(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in [0, 1]"))
    }
}
