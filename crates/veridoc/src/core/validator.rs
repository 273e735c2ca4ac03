//! Validation orchestration.
//!
//! [`DocumentValidator`] is the public facade of the engine. It composes a
//! text extractor, a document-type provider, and the result cache behind
//! one interface — plain composition, owned by whatever assembles the
//! service, with an explicit [`DocumentValidator::close`] at the end of its
//! life. No global state.
//!
//! One `validate` call runs strictly in sequence: fingerprint → cache
//! lookup (return immediately on a hit, no extraction) → extract → score →
//! classify → cache store for rejection classes. Across different
//! fingerprints there is no ordering guarantee. Two concurrent calls for
//! identical content may both miss the cache and both pay for OCR; the
//! engine does not deduplicate in-flight work.

use crate::cache::{CacheStats, ResultCache};
use crate::core::config::ValidationConfig;
use crate::error::{Result, VeridocError};
use crate::hash::{self, ContentFingerprint};
use crate::ocr::{RecognitionBackend, TextExtractor};
use crate::types::{
    DocumentTypeProvider, DocumentTypeSpec, ValidationOptions, ValidationRequest, ValidationResult, round2,
};
use crate::{classify, scoring};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::task::JoinSet;

/// How a batch processes its requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    /// Groups of at most the concurrency limit, each group concurrent.
    #[default]
    Parallel,
    /// One request at a time, in order.
    Sequential,
}

/// Batch tuning; `concurrency_limit` falls back to the validator's
/// configuration when unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    pub mode: BatchMode,
    pub concurrency_limit: Option<usize>,
}

/// Per-item outcome of a batch: a failed item is reported in place, it
/// never aborts its siblings.
#[derive(Debug)]
pub enum BatchOutcome {
    Completed(ValidationResult),
    Failed { error: VeridocError, path: PathBuf },
}

impl BatchOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn result(&self) -> Option<&ValidationResult> {
        match self {
            Self::Completed(result) => Some(result),
            Self::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&VeridocError> {
        match self {
            Self::Completed(_) => None,
            Self::Failed { error, .. } => Some(error),
        }
    }
}

/// Orchestrator counter snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ValidatorStats {
    pub validations: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub ocr_calls: u64,
    pub errors: u64,
    /// Hit percentage over all fingerprint lookups, rounded to 2 decimals.
    pub hit_rate: f64,
    pub cache: CacheStats,
}

/// Operational summary for liveness endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ValidatorHealth {
    pub ocr_configured: bool,
    pub cached_entries: usize,
    pub hit_rate: f64,
    pub error_rate: f64,
}

#[derive(Debug, Default)]
struct Counters {
    validations: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    ocr_calls: AtomicU64,
    errors: AtomicU64,
}

/// Facade sequencing hashing, cache lookup, extraction, scoring,
/// classification, and cache storage.
#[derive(Clone)]
pub struct DocumentValidator {
    extractor: TextExtractor,
    types: Arc<dyn DocumentTypeProvider>,
    cache: Arc<ResultCache>,
    config: ValidationConfig,
    counters: Arc<Counters>,
}

impl DocumentValidator {
    pub fn new(
        backend: Arc<dyn RecognitionBackend>,
        types: Arc<dyn DocumentTypeProvider>,
        config: ValidationConfig,
    ) -> Self {
        let extractor = TextExtractor::new(backend, config.ocr.clone());
        let cache = Arc::new(ResultCache::new(config.cache.clone()));
        Self {
            extractor,
            types,
            cache,
            config,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Validate one document from a file path.
    ///
    /// # Errors
    ///
    /// Propagates `Io`, `Extraction` and `UnknownDocumentType` unchanged;
    /// rejection outcomes are `Ok` results carrying their classification.
    pub async fn validate(
        &self,
        path: impl AsRef<Path>,
        document_type_id: &str,
        options: &ValidationOptions,
    ) -> Result<ValidationResult> {
        self.counters.validations.fetch_add(1, Ordering::Relaxed);
        let outcome = self.validate_inner(path.as_ref(), document_type_id, options).await;
        if outcome.is_err() {
            self.counters.errors.fetch_add(1, Ordering::Relaxed);
        }
        outcome
    }

    async fn validate_inner(
        &self,
        path: &Path,
        document_type_id: &str,
        options: &ValidationOptions,
    ) -> Result<ValidationResult> {
        let fingerprint = hash::fingerprint_file(path).await?;

        if let Some(cached) = self.lookup_cached(&fingerprint) {
            return Ok(cached);
        }

        let spec = self.lookup_spec(document_type_id).await?;

        self.counters.ocr_calls.fetch_add(1, Ordering::Relaxed);
        let text = self.extractor.extract_text(path, options.ocr.as_ref()).await?;

        Ok(self.finish(&text, &spec, options, fingerprint))
    }

    /// Validate one document from an in-memory byte source.
    pub async fn validate_bytes(
        &self,
        content: &[u8],
        document_type_id: &str,
        options: &ValidationOptions,
    ) -> Result<ValidationResult> {
        self.counters.validations.fetch_add(1, Ordering::Relaxed);
        let outcome = self.validate_bytes_inner(content, document_type_id, options).await;
        if outcome.is_err() {
            self.counters.errors.fetch_add(1, Ordering::Relaxed);
        }
        outcome
    }

    async fn validate_bytes_inner(
        &self,
        content: &[u8],
        document_type_id: &str,
        options: &ValidationOptions,
    ) -> Result<ValidationResult> {
        let fingerprint = hash::fingerprint_bytes(content);

        if let Some(cached) = self.lookup_cached(&fingerprint) {
            return Ok(cached);
        }

        let spec = self.lookup_spec(document_type_id).await?;

        self.counters.ocr_calls.fetch_add(1, Ordering::Relaxed);
        let text = self.extractor.extract_bytes(content, options.ocr.as_ref()).await?;

        Ok(self.finish(&text, &spec, options, fingerprint))
    }

    fn lookup_cached(&self, fingerprint: &ContentFingerprint) -> Option<ValidationResult> {
        match self.cache.get(fingerprint) {
            Some(cached) => {
                self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(fingerprint = %fingerprint.short(), "cache hit, extraction skipped");
                Some(cached)
            }
            None => {
                self.counters.cache_misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(fingerprint = %fingerprint.short(), "cache miss");
                None
            }
        }
    }

    async fn lookup_spec(&self, document_type_id: &str) -> Result<DocumentTypeSpec> {
        self.types
            .lookup(document_type_id)
            .await?
            .ok_or_else(|| VeridocError::UnknownDocumentType {
                type_id: document_type_id.to_string(),
            })
    }

    fn finish(
        &self,
        text: &str,
        spec: &DocumentTypeSpec,
        options: &ValidationOptions,
        fingerprint: ContentFingerprint,
    ) -> ValidationResult {
        let thresholds = options.thresholds.unwrap_or(self.config.thresholds);
        let report = scoring::score(text, spec);
        let result = classify::classify(&report, text, spec, options.claimed_name.as_deref(), &thresholds)
            .with_fingerprint(fingerprint.clone());

        if result.is_cacheable() {
            self.cache.put(&fingerprint, &result);
        }

        tracing::info!(
            fingerprint = %fingerprint.short(),
            classification = %result.classification,
            score = result.score_percent,
            "document classified"
        );
        result
    }

    /// Validate many documents; the returned outcomes preserve request
    /// order, and a failing item is reported in place without affecting the
    /// rest of the batch.
    pub async fn validate_batch(&self, requests: Vec<ValidationRequest>, options: BatchOptions) -> Vec<BatchOutcome> {
        match options.mode {
            BatchMode::Sequential => self.validate_batch_sequential(requests).await,
            BatchMode::Parallel => {
                let limit = options.concurrency_limit.unwrap_or(self.config.concurrency_limit).max(1);
                self.validate_batch_parallel(requests, limit).await
            }
        }
    }

    async fn validate_batch_sequential(&self, requests: Vec<ValidationRequest>) -> Vec<BatchOutcome> {
        let mut outcomes = Vec::with_capacity(requests.len());
        for request in requests {
            let outcome = match self
                .validate(&request.path, &request.document_type_id, &request.options)
                .await
            {
                Ok(result) => BatchOutcome::Completed(result),
                Err(error) => BatchOutcome::Failed {
                    error,
                    path: request.path,
                },
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    async fn validate_batch_parallel(&self, requests: Vec<ValidationRequest>, limit: usize) -> Vec<BatchOutcome> {
        let mut outcomes = Vec::with_capacity(requests.len());
        let mut queue = requests.into_iter();

        loop {
            let group: Vec<ValidationRequest> = queue.by_ref().take(limit).collect();
            if group.is_empty() {
                break;
            }

            let group_paths: Vec<PathBuf> = group.iter().map(|r| r.path.clone()).collect();
            let mut tasks = JoinSet::new();

            for (index, request) in group.into_iter().enumerate() {
                let validator = self.clone();
                tasks.spawn(async move {
                    let outcome = match validator
                        .validate(&request.path, &request.document_type_id, &request.options)
                        .await
                    {
                        Ok(result) => BatchOutcome::Completed(result),
                        Err(error) => BatchOutcome::Failed {
                            error,
                            path: request.path,
                        },
                    };
                    (index, outcome)
                });
            }

            let mut slots: Vec<Option<BatchOutcome>> = group_paths.iter().map(|_| None).collect();
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((index, outcome)) => slots[index] = Some(outcome),
                    Err(join_error) => {
                        tracing::error!(error = %join_error, "batch validation task did not complete");
                    }
                }
            }

            for (index, slot) in slots.into_iter().enumerate() {
                outcomes.push(slot.unwrap_or_else(|| BatchOutcome::Failed {
                    error: VeridocError::validation("validation task aborted unexpectedly"),
                    path: group_paths[index].clone(),
                }));
            }
        }

        outcomes
    }

    /// Whether a fresh cached result exists for this file's content.
    /// Unreadable files simply report `false`.
    pub async fn is_cached(&self, path: impl AsRef<Path>) -> bool {
        match hash::fingerprint_file(path).await {
            Ok(fingerprint) => self.cache.contains(&fingerprint),
            Err(_) => false,
        }
    }

    /// Fetch the cached result for this file's content without validating.
    pub async fn cached_result(&self, path: impl AsRef<Path>) -> Option<ValidationResult> {
        let fingerprint = hash::fingerprint_file(path).await.ok()?;
        self.cache.get(&fingerprint)
    }

    /// Drop the cached result for this file's content; `true` if one existed.
    pub async fn remove_cached(&self, path: impl AsRef<Path>) -> bool {
        match hash::fingerprint_file(path).await {
            Ok(fingerprint) => self.cache.invalidate(&fingerprint),
            Err(_) => false,
        }
    }

    pub fn flush_cache(&self) {
        self.cache.flush();
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn stats(&self) -> ValidatorStats {
        let cache_hits = self.counters.cache_hits.load(Ordering::Relaxed);
        let cache_misses = self.counters.cache_misses.load(Ordering::Relaxed);
        let lookups = cache_hits + cache_misses;
        let hit_rate = if lookups > 0 {
            round2(100.0 * cache_hits as f64 / lookups as f64)
        } else {
            0.0
        };

        ValidatorStats {
            validations: self.counters.validations.load(Ordering::Relaxed),
            cache_hits,
            cache_misses,
            ocr_calls: self.counters.ocr_calls.load(Ordering::Relaxed),
            errors: self.counters.errors.load(Ordering::Relaxed),
            hit_rate,
            cache: self.cache.stats(),
        }
    }

    pub fn health(&self) -> ValidatorHealth {
        let stats = self.stats();
        let error_rate = if stats.validations > 0 {
            round2(100.0 * stats.errors as f64 / stats.validations as f64)
        } else {
            0.0
        };

        ValidatorHealth {
            ocr_configured: self.config.ocr.resolve_api_key().is_some(),
            cached_entries: stats.cache.entries,
            hit_rate: stats.hit_rate,
            error_rate,
        }
    }

    /// Release resources held by the validator. The cache is emptied;
    /// clones of this validator see the flush.
    pub fn close(&self) {
        self.cache.flush();
        tracing::debug!("document validator closed");
    }
}
