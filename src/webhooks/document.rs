use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::WebhookConfig;

use super::ValidatorError;

/// uploaded photo of an identity document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityPhoto {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl IdentityPhoto {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

/// answer of the document reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentVerdict {
    pub success: bool,
    pub extracted: Option<String>,
    pub message: Option<String>,
}

/// identity document OCR seam
pub trait DocumentValidator {
    /// read the photo and compare it with the expected document number
    fn validate(&self, photo: &IdentityPhoto, expected_doc: &str) -> Result<DocumentVerdict, ValidatorError>;
}

/// reads the photo bytes as the already extracted document number
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoDocumentValidator;

impl DocumentValidator for EchoDocumentValidator {
    fn validate(&self, photo: &IdentityPhoto, expected_doc: &str) -> Result<DocumentVerdict, ValidatorError> {
        let extracted = String::from_utf8_lossy(&photo.bytes).trim().to_string();
        if extracted.is_empty() {
            return Err(ValidatorError::InvalidResponse {
                message: "no document number found in photo".to_string(),
            });
        }

        let success = extracted == expected_doc.trim();
        Ok(DocumentVerdict {
            success,
            message: (!success).then(|| "document number does not match the reservation".to_string()),
            extracted: Some(extracted),
        })
    }
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    success: bool,
    #[serde(default)]
    extracted_dni: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// posts the photo to the OCR webhook as multipart form data
#[derive(Debug, Clone)]
pub struct WebhookDocumentValidator {
    url: String,
    timeout: Duration,
}

impl WebhookDocumentValidator {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }

    pub fn from_config(config: &WebhookConfig) -> Result<Self, ValidatorError> {
        let url = config.document_url.clone().ok_or(ValidatorError::NotConfigured)?;
        Ok(Self::new(url, Duration::from_secs(config.document_timeout_secs)))
    }
}

impl DocumentValidator for WebhookDocumentValidator {
    fn validate(&self, photo: &IdentityPhoto, expected_doc: &str) -> Result<DocumentVerdict, ValidatorError> {
        let image = reqwest::blocking::multipart::Part::bytes(photo.bytes.clone())
            .file_name(photo.file_name.clone())
            .mime_str("image/jpeg")?;
        let form = reqwest::blocking::multipart::Form::new()
            .part("image", image)
            .text("expected_dni", expected_doc.to_string());

        let client = reqwest::blocking::Client::builder().timeout(self.timeout).build()?;
        let response = client.post(&self.url).multipart(form).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(ValidatorError::Status { status: status.as_u16() });
        }

        let body: OcrResponse = response.json()?;
        tracing::debug!(success = body.success, extracted = ?body.extracted_dni, "document validated");

        Ok(DocumentVerdict {
            success: body.success,
            extracted: body.extracted_dni,
            message: body.message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_validator_matches() {
        let photo = IdentityPhoto::new("dni.jpg", b"45871236\n".to_vec());
        let verdict = EchoDocumentValidator.validate(&photo, "45871236").unwrap();
        assert!(verdict.success);
        assert_eq!(verdict.extracted.as_deref(), Some("45871236"));
        assert!(verdict.message.is_none());
    }

    #[test]
    fn test_echo_validator_mismatch() {
        let photo = IdentityPhoto::new("dni.jpg", b"11111111".to_vec());
        let verdict = EchoDocumentValidator.validate(&photo, "45871236").unwrap();
        assert!(!verdict.success);
        assert!(verdict.message.is_some());
    }

    #[test]
    fn test_echo_validator_empty_photo() {
        let photo = IdentityPhoto::new("dni.jpg", Vec::new());
        assert!(EchoDocumentValidator.validate(&photo, "45871236").is_err());
    }

    #[test]
    fn test_webhook_validator_needs_url() {
        let result = WebhookDocumentValidator::from_config(&WebhookConfig::default());
        assert!(matches!(result, Err(ValidatorError::NotConfigured)));
    }

    #[test]
    fn test_ocr_response_parsing() {
        let body: OcrResponse =
            serde_json::from_str(r#"{"success": false, "message": "no coincide"}"#).unwrap();
        assert!(!body.success);
        assert!(body.extracted_dni.is_none());
        assert_eq!(body.message.as_deref(), Some("no coincide"));
    }
}
