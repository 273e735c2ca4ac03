//! Wire types for the remote recognition service.
//!
//! The service responds with PascalCase JSON. `ErrorMessage` is loosely
//! typed on the wire (a string or an array of strings), so it is kept as a
//! raw value and flattened on demand.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct RecognitionResponse {
    #[serde(rename = "ParsedResults", default)]
    pub parsed_results: Vec<ParsedResult>,

    #[serde(rename = "IsErroredOnProcessing", default)]
    pub is_errored_on_processing: bool,

    #[serde(rename = "ErrorMessage", default)]
    pub error_message: Option<serde_json::Value>,

    #[serde(rename = "OCRExitCode", default)]
    pub exit_code: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParsedResult {
    #[serde(rename = "ParsedText", default)]
    pub parsed_text: String,
}

impl RecognitionResponse {
    /// Flatten the service's error message field into one line.
    pub fn error_message_text(&self) -> Option<String> {
        let value = self.error_message.as_ref()?;
        match value {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Array(parts) => {
                let joined = parts
                    .iter()
                    .filter_map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                (!joined.is_empty()).then_some(joined)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_successful_response() {
        let body = r#"{
            "ParsedResults": [{"ParsedText": "NOMBRE JUAN PEREZ\nDOB 1990"}],
            "OCRExitCode": 1,
            "IsErroredOnProcessing": false
        }"#;

        let response: RecognitionResponse = serde_json::from_str(body).unwrap();
        assert!(!response.is_errored_on_processing);
        assert_eq!(response.parsed_results.len(), 1);
        assert!(response.parsed_results[0].parsed_text.contains("JUAN PEREZ"));
    }

    #[test]
    fn test_parse_processing_error_with_string_message() {
        let body = r#"{
            "IsErroredOnProcessing": true,
            "ErrorMessage": "Unable to recognize the file type",
            "OCRExitCode": 99
        }"#;

        let response: RecognitionResponse = serde_json::from_str(body).unwrap();
        assert!(response.is_errored_on_processing);
        assert_eq!(
            response.error_message_text().as_deref(),
            Some("Unable to recognize the file type")
        );
    }

    #[test]
    fn test_parse_processing_error_with_array_message() {
        let body = r#"{
            "IsErroredOnProcessing": true,
            "ErrorMessage": ["Timed out waiting for results", "E101"]
        }"#;

        let response: RecognitionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            response.error_message_text().as_deref(),
            Some("Timed out waiting for results; E101")
        );
    }

    #[test]
    fn test_parse_empty_response() {
        let response: RecognitionResponse = serde_json::from_str("{}").unwrap();
        assert!(response.parsed_results.is_empty());
        assert!(response.error_message_text().is_none());
    }
}
