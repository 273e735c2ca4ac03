//! Veridoc - Document Validation Engine
//!
//! Veridoc validates uploaded identity and ownership documents before they
//! enter a registration workflow. It extracts text through an external OCR
//! service (with bounded retries and exponential backoff), scores the text
//! against a configurable per-type required-field list, optionally confirms
//! a claimed person's name by fuzzy similarity, and fronts the whole
//! pipeline with a content-addressed TTL cache so documents already seen —
//! including previously rejected ones — never pay for OCR twice.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use veridoc::{
//!     DocumentValidator, InMemoryTypeProvider, OcrSpaceBackend, ValidationConfig, ValidationOptions,
//! };
//!
//! # async fn example() -> veridoc::Result<()> {
//! let types = InMemoryTypeProvider::from_toml_file("document_types.toml")?;
//! let validator = DocumentValidator::new(
//!     Arc::new(OcrSpaceBackend::new()),
//!     Arc::new(types),
//!     ValidationConfig::default(),
//! );
//!
//! let options = ValidationOptions::with_claimed_name("JUAN PEREZ");
//! let result = validator.validate("uploads/id_card.png", "ID_CARD", &options).await?;
//! println!("{}: {}", result.classification, result.message());
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core** (`core`): configuration loading, file IO, and the
//!   [`DocumentValidator`] facade that sequences the pipeline
//! - **Hashing** (`hash`): streaming SHA-256 content fingerprints
//! - **OCR** (`ocr`): recognition backend trait, HTTP client, retry policy
//! - **Scoring & classification** (`scoring`, `matching`, `classify`):
//!   field coverage, fuzzy name similarity, terminal classification
//! - **Cache** (`cache`): bounded, TTL-evicting result store keyed by
//!   content fingerprint

#![deny(unsafe_code)]

pub mod cache;
pub mod classify;
pub mod core;
pub mod error;
pub mod hash;
pub mod matching;
pub mod ocr;
pub mod scoring;
pub mod types;

pub use error::{ExtractionErrorKind, Result, VeridocError};
pub use types::*;

pub use crate::core::config::{CacheConfig, OcrConfig, Thresholds, ValidationConfig};
pub use crate::core::validator::{
    BatchMode, BatchOptions, BatchOutcome, DocumentValidator, ValidatorHealth, ValidatorStats,
};

pub use cache::{CacheStats, ResultCache};
pub use hash::{ContentFingerprint, fingerprint_bytes, fingerprint_file};
pub use matching::name_similarity;
pub use ocr::{OcrSpaceBackend, RecognitionBackend, TextExtractor};
