//! Terminal classification of scored documents.
//!
//! Evaluation order is fixed:
//!
//! 1. coverage below the invalid threshold ⇒ `DOCUMENT_INVALID`
//! 2. name check (when the type requires it and a name was claimed) ⇒
//!    `NAME_MISMATCH` on failure
//! 3. coverage below the partial threshold ⇒ `FIELDS_MISSING`
//! 4. otherwise ⇒ `VALID`
//!
//! The cheap field check runs first so a clearly-invalid document never
//! pays for the similarity computation, and the name check runs before the
//! softer missing-fields band so a wrong name is reported distinctly even
//! when field coverage would otherwise be acceptable.

use crate::core::config::Thresholds;
use crate::matching;
use crate::types::{DocumentTypeSpec, FieldReport, NameSimilarity, ValidationResult};

/// Combine field coverage and (conditionally) name similarity into a
/// terminal [`ValidationResult`].
pub fn classify(
    report: &FieldReport,
    document_text: &str,
    spec: &DocumentTypeSpec,
    claimed_name: Option<&str>,
    thresholds: &Thresholds,
) -> ValidationResult {
    if report.percent < thresholds.invalid {
        return ValidationResult::document_invalid(report);
    }

    if spec.requires_name_match
        && let Some(name) = claimed_name
    {
        let similarity = matching::name_similarity(document_text, name);
        if similarity < thresholds.name {
            return ValidationResult::name_mismatch(
                report,
                NameSimilarity {
                    similarity,
                    claimed_name: name.to_string(),
                    threshold: thresholds.name,
                },
            );
        }
    }

    if report.percent < thresholds.partial {
        return ValidationResult::fields_missing(report);
    }

    ValidationResult::valid(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Classification;

    fn spec(requires_name_match: bool) -> DocumentTypeSpec {
        DocumentTypeSpec {
            id: "ID_CARD".to_string(),
            name: "Identity card".to_string(),
            required_fields: vec!["NAME".into(), "DOB".into(), "ID_NUMBER".into()],
            requires_name_match,
        }
    }

    fn report(percent: f64, missing: &[&str]) -> FieldReport {
        FieldReport {
            percent,
            missing_fields: missing.iter().map(|s| s.to_string()).collect(),
            total_fields: 3,
            present_fields: 3 - missing.len(),
        }
    }

    #[test]
    fn test_below_invalid_threshold() {
        let result = classify(
            &report(39.9, &["NAME", "DOB"]),
            "some text",
            &spec(false),
            None,
            &Thresholds::default(),
        );
        assert_eq!(result.classification, Classification::DocumentInvalid);
        assert!(!result.is_valid);
    }

    #[test]
    fn test_partial_band() {
        for percent in [40.0, 55.0, 69.9] {
            let result = classify(
                &report(percent, &["DOB"]),
                "some text",
                &spec(false),
                None,
                &Thresholds::default(),
            );
            assert_eq!(result.classification, Classification::FieldsMissing, "at {percent}");
        }
    }

    #[test]
    fn test_at_partial_threshold_is_valid() {
        let result = classify(&report(70.0, &[]), "some text", &spec(false), None, &Thresholds::default());
        assert_eq!(result.classification, Classification::Valid);
        assert!(result.is_valid);
    }

    #[test]
    fn test_name_check_runs_before_partial_band() {
        // Coverage in the partial band plus a wrong name: the mismatch wins.
        let result = classify(
            &report(66.67, &["DOB"]),
            "NOMBRE JUAN PEREZ GOMEZ",
            &spec(true),
            Some("MARIA LOPEZ"),
            &Thresholds::default(),
        );
        assert_eq!(result.classification, Classification::NameMismatch);
        let detail = result.details.name_similarity.unwrap();
        assert_eq!(detail.claimed_name, "MARIA LOPEZ");
        assert_eq!(detail.threshold, 0.9);
        assert!(detail.similarity < 0.9);
    }

    #[test]
    fn test_name_check_skipped_below_invalid_threshold() {
        // Invalid coverage short-circuits: no similarity detail computed.
        let result = classify(
            &report(33.33, &["NAME", "DOB"]),
            "NOMBRE JUAN PEREZ",
            &spec(true),
            Some("MARIA LOPEZ"),
            &Thresholds::default(),
        );
        assert_eq!(result.classification, Classification::DocumentInvalid);
        assert!(result.details.name_similarity.is_none());
    }

    #[test]
    fn test_name_check_skipped_without_claimed_name() {
        let result = classify(
            &report(100.0, &[]),
            "NOMBRE JUAN PEREZ",
            &spec(true),
            None,
            &Thresholds::default(),
        );
        assert_eq!(result.classification, Classification::Valid);
    }

    #[test]
    fn test_matching_name_passes_through_to_valid() {
        let result = classify(
            &report(100.0, &[]),
            "NOMBRE JUAN PEREZ GOMEZ",
            &spec(true),
            Some("JUAN PEREZ"),
            &Thresholds::default(),
        );
        assert_eq!(result.classification, Classification::Valid);
    }

    #[test]
    fn test_custom_thresholds_move_the_bands() {
        let loose = Thresholds {
            invalid: 30.0,
            partial: 60.0,
            name: 0.9,
        };
        let result = classify(&report(33.33, &["NAME", "DOB"]), "text", &spec(false), None, &loose);
        assert_eq!(result.classification, Classification::FieldsMissing);

        let result = classify(&report(66.67, &["DOB"]), "text", &spec(false), None, &loose);
        assert_eq!(result.classification, Classification::Valid);
    }
}
