use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;
use std::ops::Sub;
use std::str::FromStr;

use super::transaction::Document;

/// Collection holding one record per user account.
pub const USERS: &str = "users";
/// Field of a user record holding the spendable balance.
pub const BALANCE_FIELD: &str = "balance";

/// Represents a monetary value held by an account.
///
/// This is a wrapper around `rust_decimal::Decimal` so that debits are exact
/// instead of accumulating binary floating point error.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Balance(pub Decimal);

/// Represents a strictly positive amount requested for a debit.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PaymentError::InvalidInput(
                "amount must be a positive number".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> std::result::Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Encodes the balance as a JSON number, preferring an integer when exact.
    pub fn to_json(self) -> Result<Value> {
        let value = self.0.normalize();
        if value.fract().is_zero()
            && let Some(whole) = value.to_i64()
        {
            return Ok(Value::from(whole));
        }
        value
            .to_f64()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| {
                PaymentError::StorageError(format!("balance {value} is not representable"))
            })
    }
}

impl Sub<Amount> for Balance {
    type Output = Self;
    fn sub(self, rhs: Amount) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

/// Parses a decimal out of its textual form, accepting scientific notation.
///
/// Digit separators (`1_000`) are not part of a numeric literal here.
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if text.is_empty() || text.contains('_') {
        return None;
    }
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// A user account as read from the `users` collection.
#[derive(Debug, Clone, PartialEq)]
pub struct UserAccount {
    /// The caller supplied identifier, which is also the record key.
    pub id: String,
    /// Spendable funds; zero when the record has no balance field.
    pub balance: Balance,
}

impl UserAccount {
    pub fn new(id: impl Into<String>, balance: Balance) -> Self {
        Self {
            id: id.into(),
            balance,
        }
    }

    /// Builds an account from a stored record.
    ///
    /// A missing, `null` or `false` balance reads as zero and numeric strings
    /// are accepted. Anything else means the record is corrupt.
    pub fn from_document(id: &str, document: &Document) -> Result<Self> {
        let balance = match document.get(BALANCE_FIELD) {
            None | Some(Value::Null) | Some(Value::Bool(false)) => Some(Decimal::ZERO),
            Some(Value::Number(n)) => parse_decimal(&n.to_string()),
            Some(Value::String(s)) => parse_decimal(s),
            Some(_) => None,
        }
        .ok_or_else(|| {
            PaymentError::StorageError(format!("record {USERS}/{id} has a non-numeric balance"))
        })?;

        Ok(Self::new(id, Balance::new(balance)))
    }

    /// Fields to stage when writing this account's balance back.
    pub fn balance_fields(&self) -> Result<Document> {
        let mut fields = Document::new();
        fields.insert(BALANCE_FIELD.to_string(), self.balance.to_json()?);
        Ok(fields)
    }

    /// Debits the balance if it covers the amount.
    pub fn debit(&mut self, amount: Amount) -> Result<Balance> {
        if self.balance < Balance::from(amount) {
            return Err(PaymentError::InsufficientBalance);
        }
        self.balance = self.balance - amount;
        Ok(self.balance)
    }
}
