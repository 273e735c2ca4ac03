//! Configuration loading and management.
//!
//! All tuning knobs of the engine live here: OCR retry policy, classification
//! thresholds, and cache TTL/capacity. Every field has a serde default so a
//! partial TOML/JSON file (or an empty one) yields a working configuration.

use crate::error::Result;
use crate::types::Classification;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable consulted when `ocr.api_key` is not set.
pub const API_KEY_ENV_VAR: &str = "OCR_API_KEY";

/// Default configuration file name for discovery.
pub const CONFIG_FILE_NAME: &str = "veridoc.toml";

/// Top-level engine configuration.
///
/// # Example
///
/// ```rust
/// use veridoc::ValidationConfig;
///
/// let config = ValidationConfig::default();
/// assert_eq!(config.ocr.max_attempts, 3);
/// assert_eq!(config.thresholds.invalid, 40.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default)]
    pub ocr: OcrConfig,

    #[serde(default)]
    pub thresholds: Thresholds,

    #[serde(default)]
    pub cache: CacheConfig,

    /// Maximum group size for parallel batch validation.
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            ocr: OcrConfig::default(),
            thresholds: Thresholds::default(),
            cache: CacheConfig::default(),
            concurrency_limit: default_concurrency_limit(),
        }
    }
}

/// Recognition service client and retry policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Recognition endpoint accepting multipart uploads.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// API credential; falls back to the `OCR_API_KEY` environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Language hint sent with every request.
    #[serde(default = "default_language")]
    pub language: String,

    /// Attempt budget for recoverable failures.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry; doubles (by default) per attempt.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Per-attempt request deadline.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            language: default_language(),
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl OcrConfig {
    /// Resolve the API credential: explicit config value first, then the
    /// `OCR_API_KEY` environment variable. `None` means misconfigured.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(String::from)
            .or_else(|| {
                std::env::var(API_KEY_ENV_VAR)
                    .ok()
                    .filter(|key| !key.trim().is_empty())
            })
    }

    /// Backoff delay after the given 1-based attempt:
    /// `initial_delay * multiplier^(attempt - 1)`.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.max(1.0).powi(attempt.saturating_sub(1) as i32);
        Duration::from_millis((self.initial_delay_ms as f64 * factor) as u64)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Classification thresholds.
///
/// These are configuration rather than constants: deployments disagree on
/// where the invalid/partial cut lines belong, so callers can tune them
/// globally or per request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Thresholds {
    /// Field coverage (percent) below which a document is invalid.
    #[serde(default = "default_invalid_threshold")]
    pub invalid: f64,

    /// Field coverage (percent) below which fields are reported missing.
    #[serde(default = "default_partial_threshold")]
    pub partial: f64,

    /// Minimum name similarity in `[0, 1]` for the name check to pass.
    #[serde(default = "default_name_threshold")]
    pub name: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            invalid: default_invalid_threshold(),
            partial: default_partial_threshold(),
            name: default_name_threshold(),
        }
    }
}

/// Result cache TTL and capacity configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL for `DOCUMENT_INVALID` and `NAME_MISMATCH` results.
    #[serde(default = "default_ttl_invalid_secs")]
    pub ttl_invalid_secs: u64,

    /// TTL for `FIELDS_MISSING` results.
    #[serde(default = "default_ttl_partial_secs")]
    pub ttl_partial_secs: u64,

    /// Entry bound; the oldest entry is evicted when full.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_invalid_secs: default_ttl_invalid_secs(),
            ttl_partial_secs: default_ttl_partial_secs(),
            max_entries: default_max_entries(),
        }
    }
}

impl CacheConfig {
    /// TTL for a classification; zero means "do not cache".
    pub fn ttl_for(&self, classification: Classification) -> Duration {
        match classification {
            Classification::DocumentInvalid | Classification::NameMismatch => {
                Duration::from_secs(self.ttl_invalid_secs)
            }
            Classification::FieldsMissing => Duration::from_secs(self.ttl_partial_secs),
            Classification::Valid => Duration::ZERO,
        }
    }
}

impl ValidationConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Look for `veridoc.toml` in `start_dir` and its ancestors; `None`
    /// when no configuration file exists.
    pub fn discover(start_dir: impl AsRef<Path>) -> Result<Option<Self>> {
        let mut dir = Some(start_dir.as_ref());
        while let Some(current) = dir {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Self::from_toml_file(&candidate).map(Some);
            }
            dir = current.parent();
        }
        Ok(None)
    }

    /// Reject configurations that cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.ocr.max_attempts == 0 {
            return Err(crate::VeridocError::validation("ocr.max_attempts must be at least 1"));
        }
        if self.thresholds.partial < self.thresholds.invalid {
            return Err(crate::VeridocError::validation(format!(
                "thresholds.partial ({}) must not be below thresholds.invalid ({})",
                self.thresholds.partial, self.thresholds.invalid
            )));
        }
        if !(0.0..=1.0).contains(&self.thresholds.name) {
            return Err(crate::VeridocError::validation(format!(
                "thresholds.name ({}) must be within [0, 1]",
                self.thresholds.name
            )));
        }
        if self.concurrency_limit == 0 {
            return Err(crate::VeridocError::validation("concurrency_limit must be at least 1"));
        }
        Ok(())
    }
}

fn default_endpoint() -> String {
    "https://api.ocr.space/parse/image".to_string()
}

fn default_language() -> String {
    "spa".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_invalid_threshold() -> f64 {
    40.0
}

fn default_partial_threshold() -> f64 {
    70.0
}

fn default_name_threshold() -> f64 {
    0.9
}

fn default_ttl_invalid_secs() -> u64 {
    300
}

fn default_ttl_partial_secs() -> u64 {
    180
}

fn default_max_entries() -> usize {
    1000
}

fn default_concurrency_limit() -> usize {
    5
}
