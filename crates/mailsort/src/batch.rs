//! JSON-lines batch classification.
//!
//! Each input line is a `{"subject": ..., "body": ...}` object. Lines are
//! classified concurrently and written back in input order, one output line
//! per non-blank input line. Bad lines produce `{"error": "..."}` instead of
//! stopping the batch.

use std::collections::VecDeque;

use anyhow::Context;
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::adapter::AsyncClassifier;

/// Maximum number of lines classified at the same time.
const WINDOW: usize = 64;

/// Counts reported at the end of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Lines classified successfully.
    pub classified: usize,
    /// Lines answered with an error object.
    pub failed: usize,
}

/// Output settings for a batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Write full decisions instead of results.
    pub explain: bool,
}

enum Pending {
    Failed(String),
    Running(JoinHandle<mailsort_core::Result<mailsort_core::Decision>>),
}

/// Classifies every line of `input` and writes one JSON line per result.
///
/// A line that is not UTF-8 or not JSON is answered with an error object.
/// When reading fails, the lines already read are still written before the
/// error is returned.
///
/// # Errors
///
/// Returns an error if reading or writing fails, or a classification task
/// panics.
pub async fn run<R, W>(
    classifier: &AsyncClassifier,
    mut input: R,
    mut output: W,
    options: BatchOptions,
) -> anyhow::Result<BatchSummary>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut pending = VecDeque::with_capacity(WINDOW);
    let mut summary = BatchSummary::default();
    let mut line_number = 0usize;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match input.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                drain(&mut output, &mut pending, options, &mut summary).await?;
                return Err(anyhow::Error::new(e).context("Failed to read batch input"));
            }
        }
        line_number += 1;

        let job = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => match serde_json::from_str::<Value>(line) {
                Ok(request) => Pending::Running(classifier.spawn_request(request)),
                Err(e) => Pending::Failed(format!("line {line_number}: {e}")),
            },
            Err(e) => Pending::Failed(format!("line {line_number}: {e}")),
        };
        pending.push_back(job);

        if pending.len() >= WINDOW {
            if let Some(job) = pending.pop_front() {
                write_outcome(&mut output, job, options, &mut summary).await?;
            }
        }
    }

    drain(&mut output, &mut pending, options, &mut summary).await?;

    info!(
        "Batch finished: {} classified, {} failed",
        summary.classified, summary.failed
    );
    Ok(summary)
}

async fn drain<W>(
    output: &mut W,
    pending: &mut VecDeque<Pending>,
    options: BatchOptions,
    summary: &mut BatchSummary,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(job) = pending.pop_front() {
        write_outcome(output, job, options, summary).await?;
    }
    output.flush().await.context("Failed to flush batch output")
}

async fn write_outcome<W>(
    output: &mut W,
    job: Pending,
    options: BatchOptions,
    summary: &mut BatchSummary,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let value = match job {
        Pending::Failed(message) => {
            summary.failed += 1;
            debug!("Rejected batch line: {message}");
            json!({ "error": message })
        }
        Pending::Running(handle) => match handle.await.context("Classification task failed")? {
            Ok(decision) => {
                summary.classified += 1;
                if options.explain {
                    serde_json::to_value(&decision)?
                } else {
                    serde_json::to_value(decision.result())?
                }
            }
            Err(e) => {
                summary.failed += 1;
                debug!("Rejected batch request: {e}");
                json!({ "error": e.to_string() })
            }
        },
    };

    let mut line = serde_json::to_string(&value)?;
    line.push('\n');
    output
        .write_all(line.as_bytes())
        .await
        .context("Failed to write batch output")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use mailsort_core::Classifier;
    use tokio::io::BufReader;

    fn adapter() -> AsyncClassifier {
        AsyncClassifier::new(Classifier::builtin().clone())
    }

    async fn run_lines(input: &str, options: BatchOptions) -> (Vec<Value>, BatchSummary) {
        let mut output = Vec::new();
        let summary = run(&adapter(), input.as_bytes(), &mut output, options)
            .await
            .unwrap();
        let values = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        (values, summary)
    }

    #[tokio::test]
    async fn test_results_keep_input_order() {
        let input = concat!(
            "{\"subject\": \"urgent offer\", \"body\": \"reply ASAP!\"}\n",
            "{\"subject\": \"weekend sale\", \"body\": \"50% off everything\"}\n",
            "{\"subject\": \"lunch\", \"body\": \"see you there\"}\n",
        );
        let (values, summary) = run_lines(input, BatchOptions::default()).await;

        assert_eq!(summary, BatchSummary { classified: 3, failed: 0 });
        let labels: Vec<&str> = values
            .iter()
            .map(|v| v["category"].as_str().unwrap())
            .collect();
        assert_eq!(labels, ["긴급", "홍보", "일반"]);
    }

    #[tokio::test]
    async fn test_bad_lines_become_errors() {
        let input = concat!(
            "not json\n",
            "\n",
            "{\"subject\": \"hi\", \"body\": null}\n",
            "[1, 2]\n",
            "{\"subject\": \"hi\", \"body\": \"there\"}\n",
        );
        let (values, summary) = run_lines(input, BatchOptions::default()).await;

        assert_eq!(summary, BatchSummary { classified: 1, failed: 3 });
        assert_eq!(values.len(), 4);
        assert!(values[0]["error"].as_str().unwrap().starts_with("line 1:"));
        assert_eq!(
            values[1]["error"],
            "Invalid input: `body` must be a string, got null"
        );
        assert_eq!(
            values[2]["error"],
            "Invalid input: `request` must be an object, got array"
        );
        assert_eq!(values[3]["category"], "일반");
    }

    #[tokio::test]
    async fn test_non_utf8_line_becomes_error() {
        let mut input = b"{\"subject\": \"urgent\", \"body\": \"now\"}\n".to_vec();
        input.extend_from_slice(b"{\"subject\": \"\xff\xfe\", \"body\": \"\"}\n");
        input.extend_from_slice(b"{\"subject\": \"weekend sale\", \"body\": \"50% off everything\"}\n");

        let mut output = Vec::new();
        let summary = run(&adapter(), input.as_slice(), &mut output, BatchOptions::default())
            .await
            .unwrap();
        let values: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(summary, BatchSummary { classified: 2, failed: 1 });
        assert_eq!(values.len(), 3);
        assert_eq!(values[0]["category"], "긴급");
        assert!(values[1]["error"].as_str().unwrap().starts_with("line 2:"));
        assert_eq!(values[2]["category"], "홍보");
    }

    #[tokio::test]
    async fn test_read_error_keeps_earlier_results() {
        let reader = tokio_test::io::Builder::new()
            .read(b"{\"subject\": \"urgent\", \"body\": \"now\"}\n")
            .read_error(std::io::Error::other("connection reset"))
            .build();
        let mut output = Vec::new();
        let err = run(
            &adapter(),
            BufReader::new(reader),
            &mut output,
            BatchOptions::default(),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("Failed to read batch input"));
        let written = String::from_utf8(output).unwrap();
        assert_eq!(written.lines().count(), 1);
        assert!(written.contains("긴급"));
    }

    #[tokio::test]
    async fn test_explain_writes_decisions() {
        let input = "{\"subject\": \"urgent\", \"body\": \"\"}\n";
        let (values, _) = run_lines(input, BatchOptions { explain: true }).await;

        assert_eq!(values[0]["category_id"], "urgent");
        assert_eq!(values[0]["fallback"], "none");
        assert!(values[0]["signals"].get("urgency_terms").is_some());
    }

    #[tokio::test]
    async fn test_large_batch_exceeds_window() {
        let input = "{\"subject\": \"asap\", \"body\": \"\"}\n".repeat(WINDOW * 2 + 5);
        let (values, summary) = run_lines(&input, BatchOptions::default()).await;

        assert_eq!(summary.classified, WINDOW * 2 + 5);
        assert!(values.iter().all(|v| v["category"] == "긴급"));
    }

    #[tokio::test]
    async fn test_reads_from_async_source() {
        let reader = tokio_test::io::Builder::new()
            .read(b"{\"subject\": \"urgent\",")
            .read(b" \"body\": \"now\"}\n")
            .build();
        let mut output = Vec::new();
        let summary = run(
            &adapter(),
            BufReader::new(reader),
            &mut output,
            BatchOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(summary.classified, 1);
        assert!(String::from_utf8(output).unwrap().contains("긴급"));
    }
}
