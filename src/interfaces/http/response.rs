use crate::error::PaymentError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;

pub const SUCCESS_MESSAGE: &str = "Transaction OK";
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed";

/// Outcome of one debit request as sent back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DebitResult {
    Success {
        success: bool,
        message: String,
    },
    Failure {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        received_payload: Option<Value>,
    },
}

impl DebitResult {
    pub fn success() -> Self {
        Self::Success {
            success: true,
            message: SUCCESS_MESSAGE.to_string(),
        }
    }

    /// Failure carrying the error's message.
    ///
    /// When `echo` holds the received payload, invalid-input failures also
    /// report the reason and the payload.
    pub fn failure(err: &PaymentError, echo: Option<Value>) -> Self {
        match (err.details(), echo) {
            (Some(details), Some(payload)) => Self::Failure {
                error: err.to_string(),
                details: Some(details.to_string()),
                received_payload: Some(payload),
            },
            _ => Self::Failure {
                error: err.to_string(),
                details: None,
                received_payload: None,
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Success { .. } => StatusCode::OK,
            Self::Failure { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for DebitResult {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_body() {
        let body = serde_json::to_value(DebitResult::success()).unwrap();
        assert_eq!(body, json!({"success": true, "message": "Transaction OK"}));
    }

    #[test]
    fn test_strict_failure_body() {
        let err = PaymentError::InvalidInput("amount is required".into());
        let result = DebitResult::failure(&err, None);
        assert_eq!(result.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            serde_json::to_value(result).unwrap(),
            json!({"error": "Invalid data"})
        );
    }

    #[test]
    fn test_lenient_failure_body() {
        let err = PaymentError::InvalidInput("amount is required".into());
        let result = DebitResult::failure(&err, Some(json!({"userId": "u1"})));
        assert_eq!(
            serde_json::to_value(result).unwrap(),
            json!({
                "error": "Invalid data",
                "details": "amount is required",
                "received_payload": {"userId": "u1"}
            })
        );
    }

    #[test]
    fn test_echo_ignored_for_business_failures() {
        let result = DebitResult::failure(&PaymentError::InsufficientBalance, Some(json!({})));
        assert_eq!(
            serde_json::to_value(result).unwrap(),
            json!({"error": "Insufficient balance"})
        );
    }
}
