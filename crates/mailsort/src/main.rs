//! `mailsort` - Command-line email classifier
//!
//! Classifies a subject and body given as arguments, a stored `.eml`
//! message, or a stream of JSON lines, and prints the result as JSON.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod adapter;
mod batch;
mod cli;
mod config;

use std::path::Path;

use anyhow::Context;
use clap::Parser;
use mailsort_mime::Message;
use serde::Serialize;
use tokio::io::BufReader;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adapter::AsyncClassifier;
use batch::BatchOptions;
use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; stdout carries results only
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailsort=info,mailsort_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let adapter = AsyncClassifier::new(config::build_classifier(&cli).await?);

    if cli.print_table {
        let table = adapter.classifier().table().to_config();
        println!("{}", render(&table, cli.compact)?);
        return Ok(());
    }

    if cli.batch {
        let options = BatchOptions {
            explain: cli.explain,
        };
        batch::run(
            &adapter,
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
            options,
        )
        .await?;
        return Ok(());
    }

    let (subject, body) = match &cli.eml {
        Some(path) => read_eml(path).await?,
        None => (cli.subject.clone(), cli.body.clone()),
    };

    println!("{}", classify_one(&adapter, subject, body, &cli).await?);
    Ok(())
}

/// Reads a stored message and extracts its subject and text body.
async fn read_eml(path: &Path) -> anyhow::Result<(String, String)> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read message {}", path.display()))?;
    let message = Message::parse_bytes(&raw)
        .with_context(|| format!("Failed to parse message {}", path.display()))?;
    let body = message
        .body_text()
        .with_context(|| format!("Failed to decode body of {}", path.display()))?;

    let attachments = message.attachments();
    if !attachments.is_empty() {
        debug!("Ignoring {} attachment(s): {:?}", attachments.len(), attachments);
    }
    info!("Classifying message {:?}", path);

    Ok((message.subject(), body))
}

async fn classify_one(
    adapter: &AsyncClassifier,
    subject: String,
    body: String,
    cli: &Cli,
) -> anyhow::Result<String> {
    if cli.explain {
        render(&adapter.explain(subject, body).await?, cli.compact)
    } else {
        render(&adapter.classify(subject, body).await?, cli.compact)
    }
}

fn render<T: Serialize>(value: &T, compact: bool) -> anyhow::Result<String> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    Ok(json)
}
