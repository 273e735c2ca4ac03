//! Text extraction via an external recognition service.
//!
//! [`RecognitionBackend`] is the seam: one async call that turns document
//! bytes into raw text. [`OcrSpaceBackend`] is the production
//! implementation; tests substitute scripted fakes. [`TextExtractor`] wraps
//! a backend with everything the backend should not care about: source
//! validation, the no-text check, and the retry/backoff policy.
//!
//! Retry policy: only failures that repeating the call could fix are
//! retried (`Timeout`, connection/`ServiceError`). A document with no
//! legible text stays empty no matter how often it is resubmitted, and a
//! missing credential stays missing, so those fail on the first attempt.

pub mod types;

use crate::core::config::OcrConfig;
use crate::core::io;
use crate::error::{ExtractionErrorKind, Result, VeridocError};
use crate::hash::{self, ContentFingerprint};
use async_trait::async_trait;
use std::path::Path;
use self::types::RecognitionResponse;
use std::sync::Arc;

/// A service that turns document bytes into raw text.
#[async_trait]
pub trait RecognitionBackend: Send + Sync {
    /// Submit `content` for recognition and return the raw extracted text.
    ///
    /// Implementations classify their failures via
    /// [`ExtractionErrorKind`]; the retry loop decides what to do with
    /// them. Whitespace-only text is returned as-is, the caller decides
    /// whether that counts as a failure.
    async fn recognize(&self, content: &[u8], file_name: &str, config: &OcrConfig) -> Result<String>;
}

/// HTTP client for an OCR.Space-style recognition endpoint.
#[derive(Debug, Clone)]
pub struct OcrSpaceBackend {
    client: reqwest::Client,
}

impl OcrSpaceBackend {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for OcrSpaceBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecognitionBackend for OcrSpaceBackend {
    async fn recognize(&self, content: &[u8], file_name: &str, config: &OcrConfig) -> Result<String> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            VeridocError::extraction(
                ExtractionErrorKind::Misconfigured,
                "recognition API key not configured (set OCR_API_KEY or ocr.api_key)",
            )
        })?;

        let part = reqwest::multipart::Part::bytes(content.to_vec()).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("language", config.language.clone())
            .text("isOverlayRequired", "false");

        let response = self
            .client
            .post(&config.endpoint)
            .header("apikey", api_key)
            .multipart(form)
            .timeout(config.timeout())
            .send()
            .await
            .map_err(classify_transport_error)?;

        let body: RecognitionResponse = response.json().await.map_err(|err| {
            VeridocError::extraction_with_source(
                ExtractionErrorKind::ServiceError,
                "recognition service returned an unreadable response",
                err,
            )
        })?;

        if body.is_errored_on_processing {
            let detail = body
                .error_message_text()
                .unwrap_or_else(|| format!("exit code {}", body.exit_code));
            return Err(VeridocError::extraction(
                ExtractionErrorKind::ServiceError,
                format!("recognition service reported a processing error: {detail}"),
            ));
        }

        let first = body.parsed_results.into_iter().next().ok_or_else(|| {
            VeridocError::extraction(
                ExtractionErrorKind::ServiceError,
                "recognition response contained no parse results",
            )
        })?;

        Ok(first.parsed_text)
    }
}

fn classify_transport_error(err: reqwest::Error) -> VeridocError {
    let kind = if err.is_timeout() {
        ExtractionErrorKind::Timeout
    } else {
        ExtractionErrorKind::ServiceError
    };
    VeridocError::extraction_with_source(kind, format!("recognition request failed: {err}"), err)
}

/// Retrying text extractor over a [`RecognitionBackend`].
#[derive(Clone)]
pub struct TextExtractor {
    backend: Arc<dyn RecognitionBackend>,
    config: OcrConfig,
}

impl TextExtractor {
    pub fn new(backend: Arc<dyn RecognitionBackend>, config: OcrConfig) -> Self {
        Self { backend, config }
    }

    /// Extract text from a file, retrying recoverable failures with
    /// exponential backoff. `overrides` replaces the extractor's retry and
    /// timeout configuration for this call only.
    ///
    /// # Errors
    ///
    /// `Extraction { kind: NotFound }` when the file is missing;
    /// `Extraction { kind: NoText }` when recognition yields only
    /// whitespace; otherwise the last attempt's error, tagged with the
    /// number of attempts made.
    pub async fn extract_text(&self, path: impl AsRef<Path>, overrides: Option<&OcrConfig>) -> Result<String> {
        let path = path.as_ref();
        let config = overrides.unwrap_or(&self.config);

        if !io::file_exists(path) {
            return Err(VeridocError::extraction(
                ExtractionErrorKind::NotFound,
                format!("file does not exist or is not readable: {}", path.display()),
            ));
        }

        // The handle opened for the read is released before any attempt
        // (and therefore before any retry sleep) begins.
        let content = io::read_file_async(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();

        self.run_attempts(&content, &file_name, config).await
    }

    /// Extract text from an in-memory byte source.
    pub async fn extract_bytes(&self, content: &[u8], overrides: Option<&OcrConfig>) -> Result<String> {
        let config = overrides.unwrap_or(&self.config);
        self.run_attempts(content, "document", config).await
    }

    /// Extract text and fingerprint the same file concurrently.
    pub async fn extract_text_and_fingerprint(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<(String, ContentFingerprint)> {
        let path = path.as_ref();
        let (text, fingerprint) = tokio::join!(self.extract_text(path, None), hash::fingerprint_file(path));
        Ok((text?, fingerprint?))
    }

    async fn run_attempts(&self, content: &[u8], file_name: &str, config: &OcrConfig) -> Result<String> {
        let max_attempts = config.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            match self.backend.recognize(content, file_name, config).await {
                Ok(text) => {
                    if text.trim().is_empty() {
                        return Err(VeridocError::extraction(
                            ExtractionErrorKind::NoText,
                            "document contains no legible text",
                        )
                        .with_attempts(attempt));
                    }
                    if attempt > 1 {
                        tracing::debug!(attempt, "recognition succeeded after retry");
                    }
                    return Ok(text);
                }
                Err(error) => {
                    if !error.is_retryable() {
                        return Err(error.with_attempts(attempt));
                    }
                    tracing::warn!(attempt, max_attempts, error = %error, "recoverable recognition failure");
                    last_error = Some(error);
                    if attempt < max_attempts {
                        tokio::time::sleep(config.retry_delay(attempt)).await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| {
                VeridocError::extraction(ExtractionErrorKind::ServiceError, "extraction produced no attempts")
            })
            .with_attempts(max_attempts))
    }
}
