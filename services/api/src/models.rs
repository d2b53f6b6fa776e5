//! API Models
//!
//! This module defines the request and response bodies of the HTTP endpoints,
//! with `utoipa` schemas for the OpenAPI documentation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The subset of Twilio's voice webhook parameters the service reads.
#[derive(Deserialize, ToSchema, Debug, Clone, Default)]
pub struct VoiceWebhook {
    #[serde(rename = "CallSid")]
    #[schema(example = "CA0123456789abcdef0123456789abcdef")]
    pub call_sid: Option<String>,
    #[serde(rename = "AccountSid")]
    pub account_sid: Option<String>,
    #[serde(rename = "CallStatus")]
    #[schema(example = "ringing")]
    pub call_status: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    /// Number of items in the question bank.
    #[schema(example = 9)]
    pub questions: usize,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_webhook_uses_twilio_parameter_names() {
        let payload: VoiceWebhook = serde_json::from_value(serde_json::json!({
            "CallSid": "CA123",
            "AccountSid": "AC456",
            "CallStatus": "ringing",
            "From": "+15550100"
        }))
        .unwrap();

        assert_eq!(payload.call_sid.as_deref(), Some("CA123"));
        assert_eq!(payload.account_sid.as_deref(), Some("AC456"));
        assert_eq!(payload.call_status.as_deref(), Some("ringing"));
    }

    #[test]
    fn test_voice_webhook_fields_are_optional() {
        let payload: VoiceWebhook = serde_json::from_str("{}").unwrap();
        assert!(payload.call_sid.is_none());
    }

    #[test]
    fn test_health_response_serialization() {
        let health = HealthResponse {
            status: "ok".to_string(),
            questions: 9,
        };
        assert_eq!(
            serde_json::to_string(&health).unwrap(),
            r#"{"status":"ok","questions":9}"#
        );
    }

    #[test]
    fn test_error_response_serialization() {
        let error = ErrorResponse {
            message: "CallSid is required".to_string(),
        };

        let json = serde_json::to_string(&error).unwrap();
        assert_eq!(json, r#"{"message":"CallSid is required"}"#);
    }
}
