use super::response::{DebitResult, METHOD_NOT_ALLOWED_MESSAGE};
use crate::application::debit::DebitService;
use crate::domain::request::{DebitRequest, decode_body};
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::sync::Arc;

/// Shared per-process state handed to every request.
#[derive(Clone)]
pub struct AppState {
    service: Arc<DebitService>,
    echo_invalid_payload: bool,
}

impl AppState {
    pub fn new(service: DebitService, echo_invalid_payload: bool) -> Self {
        Self {
            service: Arc::new(service),
            echo_invalid_payload,
        }
    }

    /// Decodes, validates and applies one debit.
    pub async fn process(&self, body: &[u8]) -> DebitResult {
        let payload = match decode_body(body) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "rejecting unparsable body");
                return DebitResult::failure(&e, None);
            }
        };

        let request = match DebitRequest::from_payload(&payload) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, details = e.details(), "rejecting invalid debit request");
                return DebitResult::failure(&e, self.echo_invalid_payload.then_some(payload));
            }
        };

        match self.service.debit(&request).await {
            Ok(remaining) => {
                tracing::info!(
                    user_id = %request.user_id,
                    amount = %request.amount.value(),
                    remaining = %remaining.0,
                    "debit committed"
                );
                DebitResult::success()
            }
            Err(e) if e.is_rejection() => {
                tracing::info!(user_id = %request.user_id, error = %e, "debit rejected");
                DebitResult::failure(&e, None)
            }
            Err(e) => {
                tracing::error!(user_id = %request.user_id, error = %e, "debit failed");
                DebitResult::failure(&e, None)
            }
        }
    }
}

/// `/api/pay`: `POST` debits, `OPTIONS` answers preflight, anything else is 405.
pub async fn pay(State(state): State<AppState>, method: Method, body: Bytes) -> Response {
    match method {
        Method::OPTIONS => StatusCode::OK.into_response(),
        Method::POST => state.process(&body).await.into_response(),
        other => {
            tracing::debug!(method = %other, "method not allowed");
            (
                StatusCode::METHOD_NOT_ALLOWED,
                Json(json!({ "error": METHOD_NOT_ALLOWED_MESSAGE })),
            )
                .into_response()
        }
    }
}

/// Allows cross-origin calls from any origin on every response.
pub async fn cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}
