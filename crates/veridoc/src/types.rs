//! Core value types shared across the validation pipeline.

use crate::core::config::{OcrConfig, Thresholds};
use crate::error::Result;
use crate::hash::ContentFingerprint;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Terminal classification of a validated document.
///
/// Classifications are successful results, not errors: the caller branches
/// on them (the HTTP layer maps the three rejection classes to 400).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    /// Required-field coverage and (when requested) name check passed.
    Valid,
    /// Coverage below the invalid threshold.
    DocumentInvalid,
    /// Coverage between the invalid and partial thresholds.
    FieldsMissing,
    /// Claimed name not found in the document with sufficient similarity.
    NameMismatch,
}

impl Classification {
    /// Negative/partial outcomes are cached to avoid repeat OCR work on
    /// content already seen. `Valid` is never cached: a valid document is
    /// consumed immediately, and re-confirming it after a type/config
    /// change is the safer default.
    pub fn is_cacheable(self) -> bool {
        !matches!(self, Self::Valid)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "VALID",
            Self::DocumentInvalid => "DOCUMENT_INVALID",
            Self::FieldsMissing => "FIELDS_MISSING",
            Self::NameMismatch => "NAME_MISMATCH",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable per-type validation requirements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentTypeSpec {
    /// Lookup key, e.g. `"ID_CARD"`.
    pub id: String,

    /// Human-readable type name.
    #[serde(default)]
    pub name: String,

    /// Tokens that must appear in the extracted text (matched uppercased).
    #[serde(default)]
    pub required_fields: Vec<String>,

    /// Whether a supplied claimed name must fuzzy-match the document text.
    #[serde(default)]
    pub requires_name_match: bool,
}

/// Read-only lookup of document type specifications.
///
/// The engine only consumes this; where the specs live (database, config
/// file) is the composing service's concern.
#[async_trait]
pub trait DocumentTypeProvider: Send + Sync {
    async fn lookup(&self, type_id: &str) -> Result<Option<DocumentTypeSpec>>;
}

/// In-memory [`DocumentTypeProvider`], loadable from a TOML catalog:
///
/// ```toml
/// [[document_type]]
/// id = "ID_CARD"
/// name = "Identity card"
/// required_fields = ["NAME", "DOB", "ID_NUMBER"]
/// requires_name_match = true
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryTypeProvider {
    specs: HashMap<String, DocumentTypeSpec>,
}

#[derive(Debug, Deserialize)]
struct TypeCatalog {
    #[serde(default, rename = "document_type")]
    document_types: Vec<DocumentTypeSpec>,
}

impl InMemoryTypeProvider {
    pub fn new(specs: impl IntoIterator<Item = DocumentTypeSpec>) -> Self {
        Self {
            specs: specs.into_iter().map(|s| (s.id.clone(), s)).collect(),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let catalog: TypeCatalog = toml::from_str(content)?;
        Ok(Self::new(catalog.document_types))
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[async_trait]
impl DocumentTypeProvider for InMemoryTypeProvider {
    async fn lookup(&self, type_id: &str) -> Result<Option<DocumentTypeSpec>> {
        Ok(self.specs.get(type_id).cloned())
    }
}

/// Per-call tuning for a single validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationOptions {
    /// Name claimed by the submitter, checked for types that require it.
    pub claimed_name: Option<String>,

    /// Classification threshold overrides for this call.
    pub thresholds: Option<Thresholds>,

    /// OCR retry/timeout overrides for this call.
    pub ocr: Option<OcrConfig>,
}

impl ValidationOptions {
    pub fn with_claimed_name(name: impl Into<String>) -> Self {
        Self {
            claimed_name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// One item of a batch validation.
#[derive(Debug, Clone)]
pub struct ValidationRequest {
    pub path: PathBuf,
    pub document_type_id: String,
    pub options: ValidationOptions,
}

impl ValidationRequest {
    pub fn new(path: impl Into<PathBuf>, document_type_id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            document_type_id: document_type_id.into(),
            options: ValidationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.options = options;
        self
    }
}

/// Required-field coverage of an extracted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldReport {
    /// Percentage of required fields found, rounded to 2 decimals.
    pub percent: f64,
    pub missing_fields: Vec<String>,
    pub total_fields: usize,
    pub present_fields: usize,
}

/// Name-similarity detail attached to a result when the check ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameSimilarity {
    pub similarity: f64,
    pub claimed_name: String,
    pub threshold: f64,
}

/// Field counts and, when applicable, name-similarity detail of a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationDetails {
    pub missing_fields: Vec<String>,
    pub total_fields: usize,
    pub present_fields: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_similarity: Option<NameSimilarity>,
}

/// Outcome of validating one document. Immutable value object: cache-stored
/// copies are independent snapshots, mutating a returned instance never
/// affects the cached entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub score_percent: f64,
    pub classification: Classification,
    pub details: ValidationDetails,
    /// Unix timestamp (seconds) of when the result was produced.
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<ContentFingerprint>,
}

impl ValidationResult {
    fn new(is_valid: bool, score_percent: f64, classification: Classification, details: ValidationDetails) -> Self {
        Self {
            is_valid,
            score_percent: round2(score_percent),
            classification,
            details,
            timestamp: unix_timestamp(),
            fingerprint: None,
        }
    }

    pub(crate) fn document_invalid(report: &FieldReport) -> Self {
        Self::new(
            false,
            report.percent,
            Classification::DocumentInvalid,
            ValidationDetails {
                missing_fields: report.missing_fields.clone(),
                total_fields: report.total_fields,
                present_fields: report.present_fields,
                name_similarity: None,
            },
        )
    }

    pub(crate) fn fields_missing(report: &FieldReport) -> Self {
        Self::new(
            false,
            report.percent,
            Classification::FieldsMissing,
            ValidationDetails {
                missing_fields: report.missing_fields.clone(),
                total_fields: report.total_fields,
                present_fields: report.present_fields,
                name_similarity: None,
            },
        )
    }

    pub(crate) fn name_mismatch(report: &FieldReport, similarity: NameSimilarity) -> Self {
        Self::new(
            false,
            report.percent,
            Classification::NameMismatch,
            ValidationDetails {
                missing_fields: report.missing_fields.clone(),
                total_fields: report.total_fields,
                present_fields: report.present_fields,
                name_similarity: Some(similarity),
            },
        )
    }

    pub(crate) fn valid(report: &FieldReport) -> Self {
        Self::new(
            true,
            report.percent,
            Classification::Valid,
            ValidationDetails {
                missing_fields: Vec::new(),
                total_fields: report.total_fields,
                present_fields: report.total_fields,
                name_similarity: None,
            },
        )
    }

    /// Attach the content fingerprint computed for the source bytes.
    pub fn with_fingerprint(mut self, fingerprint: ContentFingerprint) -> Self {
        self.fingerprint = Some(fingerprint);
        self
    }

    pub fn is_cacheable(&self) -> bool {
        self.classification.is_cacheable()
    }

    /// Human-readable outcome message, suitable for direct display.
    pub fn message(&self) -> String {
        match self.classification {
            Classification::DocumentInvalid => format!(
                "Document invalid: {} required field(s) not found: {}",
                self.details.missing_fields.len(),
                self.details.missing_fields.join(", ")
            ),
            Classification::FieldsMissing => format!(
                "Document incomplete: {} required field(s) not found: {}",
                self.details.missing_fields.len(),
                self.details.missing_fields.join(", ")
            ),
            Classification::NameMismatch => {
                let similarity = self
                    .details
                    .name_similarity
                    .as_ref()
                    .map(|s| s.similarity)
                    .unwrap_or_default();
                format!(
                    "Name on the document does not match the claimed name (similarity {:.0}%)",
                    similarity * 100.0
                )
            }
            Classification::Valid => {
                format!("Document valid ({}% of required fields recognized)", self.score_percent)
            }
        }
    }
}

/// Round to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
