//! Batch validation orchestration tests.
//!
//! Validates group-based parallelism and failure isolation: a batch is
//! processed in groups of at most the concurrency limit, outcomes preserve
//! request order, and one failing item never fails its siblings.

mod common;

use common::{ScriptedBackend, fast_config, type_catalog, write_fixture};
use std::sync::Arc;
use tempfile::tempdir;
use veridoc::{
    BatchMode, BatchOptions, Classification, DocumentValidator, ValidationConfig, ValidationRequest, VeridocError,
};

fn validator_with(backend: Arc<ScriptedBackend>, config: ValidationConfig) -> DocumentValidator {
    DocumentValidator::new(backend, type_catalog(), config)
}

#[tokio::test]
async fn test_one_failing_item_never_fails_its_siblings() {
    let dir = tempdir().unwrap();
    let backend = ScriptedBackend::always("ADDRESS: Calle 5\nSIGNATURE: present");
    let validator = validator_with(backend, fast_config());

    let mut requests = Vec::new();
    for i in 0..5 {
        let path = write_fixture(&dir, &format!("lease-{i}.png"), format!("scan-{i}").as_bytes());
        // Request 3 carries a type id nobody registered.
        let type_id = if i == 2 { "UNREGISTERED" } else { "LEASE" };
        requests.push(ValidationRequest::new(path, type_id));
    }

    let outcomes = validator.validate_batch(requests, BatchOptions::default()).await;

    assert_eq!(outcomes.len(), 5);
    for (index, outcome) in outcomes.iter().enumerate() {
        if index == 2 {
            let error = outcome.error().expect("request 3 must fail");
            assert!(matches!(error, VeridocError::UnknownDocumentType { .. }));
        } else {
            let result = outcome.result().expect("siblings must complete");
            assert_eq!(result.classification, Classification::Valid);
        }
    }
}

#[tokio::test]
async fn test_outcomes_preserve_request_order_across_groups() {
    let dir = tempdir().unwrap();
    let backend = ScriptedBackend::always("ADDRESS: Calle 5\nSIGNATURE: present");
    let validator = validator_with(backend.clone(), fast_config());

    let mut requests = Vec::new();
    let mut expected = Vec::new();
    for i in 0..7 {
        let content = format!("scan-{i}");
        let path = write_fixture(&dir, &format!("lease-{i}.png"), content.as_bytes());
        expected.push(veridoc::fingerprint_bytes(content.as_bytes()));
        requests.push(ValidationRequest::new(path, "LEASE"));
    }

    let outcomes = validator
        .validate_batch(
            requests,
            BatchOptions {
                mode: BatchMode::Parallel,
                concurrency_limit: Some(3),
            },
        )
        .await;

    assert_eq!(outcomes.len(), 7);
    assert_eq!(backend.calls(), 7);
    for (outcome, fingerprint) in outcomes.iter().zip(&expected) {
        let result = outcome.result().expect("all items complete");
        assert_eq!(result.fingerprint.as_ref().unwrap(), fingerprint);
    }
}

#[tokio::test]
async fn test_sequential_mode_processes_in_order() {
    let dir = tempdir().unwrap();
    let backend = ScriptedBackend::always("ADDRESS: Calle 5\nSIGNATURE: present");
    let validator = validator_with(backend.clone(), fast_config());

    let requests = (0..3)
        .map(|i| {
            let path = write_fixture(&dir, &format!("lease-{i}.png"), format!("scan-{i}").as_bytes());
            ValidationRequest::new(path, "LEASE")
        })
        .collect();

    let outcomes = validator
        .validate_batch(
            requests,
            BatchOptions {
                mode: BatchMode::Sequential,
                concurrency_limit: None,
            },
        )
        .await;

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(|o| o.is_completed()));
    assert_eq!(backend.calls(), 3);
}

#[tokio::test]
async fn test_empty_batch_is_a_no_op() {
    let backend = ScriptedBackend::always("anything");
    let validator = validator_with(backend.clone(), fast_config());

    let outcomes = validator.validate_batch(Vec::new(), BatchOptions::default()).await;

    assert!(outcomes.is_empty());
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_failed_outcome_reports_the_request_path() {
    let dir = tempdir().unwrap();
    let present = write_fixture(&dir, "present.png", b"scan-present");
    let missing = dir.path().join("missing.png");
    let backend = ScriptedBackend::always("ADDRESS: Calle 5\nSIGNATURE: present");
    let validator = validator_with(backend, fast_config());

    let outcomes = validator
        .validate_batch(
            vec![
                ValidationRequest::new(&present, "LEASE"),
                ValidationRequest::new(&missing, "LEASE"),
            ],
            BatchOptions::default(),
        )
        .await;

    assert!(outcomes[0].is_completed());
    match &outcomes[1] {
        veridoc::BatchOutcome::Failed { error, path } => {
            assert!(matches!(error, VeridocError::Io(_)));
            assert_eq!(path, &missing);
        }
        other => panic!("expected a failed outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn test_batch_counts_every_item_in_stats() {
    let dir = tempdir().unwrap();
    let backend = ScriptedBackend::always("ADDRESS: Calle 5\nSIGNATURE: present");
    let validator = validator_with(backend, fast_config());

    let requests = (0..4)
        .map(|i| {
            let path = write_fixture(&dir, &format!("lease-{i}.png"), format!("scan-{i}").as_bytes());
            ValidationRequest::new(path, "LEASE")
        })
        .collect();

    validator.validate_batch(requests, BatchOptions::default()).await;

    let stats = validator.stats();
    assert_eq!(stats.validations, 4);
    assert_eq!(stats.ocr_calls, 4);
    assert_eq!(stats.errors, 0);
}
