//! Shared fixtures: a scripted recognition backend, a small document-type
//! catalog, and fast retry configuration.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use veridoc::{
    DocumentTypeSpec, ExtractionErrorKind, InMemoryTypeProvider, OcrConfig, RecognitionBackend, Result,
    ValidationConfig, VeridocError,
};

pub type ScriptedReply = std::result::Result<String, (ExtractionErrorKind, &'static str)>;

/// Recognition backend replaying a scripted list of replies; the last
/// reply repeats once the script is exhausted.
pub struct ScriptedBackend {
    script: Mutex<Vec<ScriptedReply>>,
    calls: AtomicU32,
}

impl ScriptedBackend {
    pub fn new(script: Vec<ScriptedReply>) -> Arc<Self> {
        assert!(!script.is_empty(), "scripted backend needs at least one reply");
        Arc::new(Self {
            script: Mutex::new(script),
            calls: AtomicU32::new(0),
        })
    }

    pub fn always(text: &str) -> Arc<Self> {
        Self::new(vec![Ok(text.to_string())])
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecognitionBackend for ScriptedBackend {
    async fn recognize(&self, _content: &[u8], _file_name: &str, _config: &OcrConfig) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock();
        let reply = if script.len() > 1 {
            script.remove(0)
        } else {
            script[0].clone()
        };
        reply.map_err(|(kind, message)| VeridocError::extraction(kind, message))
    }
}

/// ID_CARD requires a name match; LEASE does not.
pub fn type_catalog() -> Arc<InMemoryTypeProvider> {
    Arc::new(InMemoryTypeProvider::new(vec![
        DocumentTypeSpec {
            id: "ID_CARD".to_string(),
            name: "Identity card".to_string(),
            required_fields: vec!["NAME".to_string(), "DOB".to_string(), "ID_NUMBER".to_string()],
            requires_name_match: true,
        },
        DocumentTypeSpec {
            id: "LEASE".to_string(),
            name: "Lease contract".to_string(),
            required_fields: vec!["ADDRESS".to_string(), "SIGNATURE".to_string()],
            requires_name_match: false,
        },
    ]))
}

/// Default configuration with retry delays shrunk for test speed.
pub fn fast_config() -> ValidationConfig {
    let mut config = ValidationConfig::default();
    config.ocr.initial_delay_ms = 5;
    config
}

pub fn write_fixture(dir: &tempfile::TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}
