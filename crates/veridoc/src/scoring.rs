//! Required-field presence scoring.
//!
//! A field "hit" is plain textual containment of the field token anywhere
//! in the uppercased extracted text. OCR noise inside a field token is not
//! compensated here; the tokens configured per document type are short,
//! high-contrast labels (headings like `NOMBRE`, `CURP`) that OCR gets
//! right or drops entirely.

use crate::types::{DocumentTypeSpec, FieldReport, round2};

/// Score extracted text against a type's required fields.
///
/// `percent = 100 * (total - missing) / total`; a type with no required
/// fields scores 100.
pub fn score(text: &str, spec: &DocumentTypeSpec) -> FieldReport {
    let haystack = text.to_uppercase();

    let missing_fields: Vec<String> = spec
        .required_fields
        .iter()
        .filter(|field| !haystack.contains(&field.to_uppercase()))
        .cloned()
        .collect();

    let total_fields = spec.required_fields.len();
    let present_fields = total_fields - missing_fields.len();
    let percent = if total_fields == 0 {
        100.0
    } else {
        round2(100.0 * present_fields as f64 / total_fields as f64)
    };

    FieldReport {
        percent,
        missing_fields,
        total_fields,
        present_fields,
    }
}
