//! Turning an untrusted request payload into a typed `DebitRequest`.
//!
//! The body may be a JSON object or a JSON string that itself encodes the
//! object. The identifier is read from `userId`, falling back to `uid` when
//! `userId` is absent, `null` or empty. The amount may be a JSON number or a
//! numeric string; anything that does not denote a strictly positive finite
//! number is rejected.

use super::account::{Amount, parse_decimal};
use crate::error::{PaymentError, Result};
use serde_json::Value;

/// Field names accepted for the user identifier, in precedence order.
pub const USER_ID_FIELDS: [&str; 2] = ["userId", "uid"];
pub const AMOUNT_FIELD: &str = "amount";

#[derive(Debug, Clone, PartialEq)]
pub struct DebitRequest {
    pub user_id: String,
    pub amount: Amount,
}

impl DebitRequest {
    pub fn new(user_id: impl Into<String>, amount: Amount) -> Self {
        Self {
            user_id: user_id.into(),
            amount,
        }
    }

    /// Validates a decoded payload.
    pub fn from_payload(payload: &Value) -> Result<Self> {
        let object = payload
            .as_object()
            .ok_or_else(|| invalid("payload must be a JSON object"))?;

        let user_id = USER_ID_FIELDS
            .iter()
            .filter_map(|field| object.get(*field))
            .find(|value| !value.is_null() && value.as_str() != Some(""))
            .ok_or_else(|| invalid("userId is required"))?;
        let user_id = user_id
            .as_str()
            .ok_or_else(|| invalid("userId must be a string"))?;
        if user_id.contains('/') {
            return Err(invalid("userId must not contain '/'"));
        }

        let amount = object
            .get(AMOUNT_FIELD)
            .ok_or_else(|| invalid("amount is required"))?;
        let amount = coerce_amount(amount).ok_or_else(|| invalid(unparsed_amount_reason(amount)))?;

        Ok(Self::new(user_id, Amount::try_from(amount)?))
    }
}

/// Decodes the raw request body, unwrapping a JSON-encoded string body.
pub fn decode_body(body: &[u8]) -> Result<Value> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| PaymentError::MalformedInput(e.to_string()))?;
    match value {
        Value::String(inner) => {
            serde_json::from_str(&inner).map_err(|e| PaymentError::MalformedInput(e.to_string()))
        }
        other => Ok(other),
    }
}

/// Numbers are taken as-is; strings must parse as a decimal once trimmed.
pub fn coerce_amount(value: &Value) -> Option<rust_decimal::Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

/// Why an amount could not be coerced. Finite numbers that `Decimal` cannot
/// hold (too large, or too many fractional digits) are still numbers.
fn unparsed_amount_reason(value: &Value) -> &'static str {
    let as_float = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if !s.contains('_') => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match as_float {
        Some(f) if f.is_finite() && f > 0.0 => "amount out of range",
        Some(f) if f.is_finite() => "amount must be a positive number",
        _ => "amount must be a number",
    }
}

fn invalid(reason: &str) -> PaymentError {
    PaymentError::InvalidInput(reason.to_string())
}
