//! Async adapter over the synchronous classifier.
//!
//! Classification is CPU work, so it runs on tokio's blocking pool rather
//! than on the async worker threads.

use mailsort_core::{ClassificationResult, Classifier, Decision};
use serde_json::Value;
use tokio::task::JoinHandle;

/// Async facade for a [`Classifier`].
#[derive(Debug, Clone)]
pub struct AsyncClassifier {
    inner: Classifier,
}

impl AsyncClassifier {
    /// Wraps a classifier.
    #[must_use]
    pub const fn new(inner: Classifier) -> Self {
        Self { inner }
    }

    /// Returns the wrapped classifier.
    #[must_use]
    pub const fn classifier(&self) -> &Classifier {
        &self.inner
    }

    /// Classifies a subject/body pair.
    ///
    /// # Errors
    ///
    /// Returns an error only if the blocking task panicked or was cancelled.
    pub async fn classify(
        &self,
        subject: String,
        body: String,
    ) -> Result<ClassificationResult, tokio::task::JoinError> {
        let classifier = self.inner.clone();
        tokio::task::spawn_blocking(move || classifier.classify(&subject, &body)).await
    }

    /// Classifies a subject/body pair and returns the full decision.
    ///
    /// # Errors
    ///
    /// Returns an error only if the blocking task panicked or was cancelled.
    pub async fn explain(
        &self,
        subject: String,
        body: String,
    ) -> Result<Decision, tokio::task::JoinError> {
        let classifier = self.inner.clone();
        tokio::task::spawn_blocking(move || classifier.explain(&subject, &body)).await
    }

    /// Starts classifying a `{"subject": ..., "body": ...}` request.
    ///
    /// The returned handle resolves to the decision, or to
    /// [`mailsort_core::Error::InvalidInput`] for a malformed request.
    #[must_use]
    pub fn spawn_request(&self, request: Value) -> JoinHandle<mailsort_core::Result<Decision>> {
        let classifier = self.inner.clone();
        tokio::task::spawn_blocking(move || classifier.explain_request(&request))
    }
}
