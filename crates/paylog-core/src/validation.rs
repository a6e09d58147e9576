//! Call record payload validation.
//!
//! Turns an untyped JSON payload into a [`NewCallRecord`] or the full list of
//! field errors. Every field is checked independently so a client learns about
//! all problems in one round trip.

use std::{fmt, str::FromStr};

use bigdecimal::{BigDecimal, RoundingMode};
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::models::{CallStatus, ErrorCategory, NewCallRecord};

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Payload key the error refers to.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// Validates a call record payload.
///
/// Returns the typed record when every required field is present and well
/// typed, otherwise every violation in payload field order. A payload that is
/// not a JSON object yields a single `body` error.
///
/// # Errors
///
/// Returns a non-empty list of [`FieldError`]s describing every violation.
///
/// # Example
///
/// ```
/// use paylog_core::validation::validate;
/// use serde_json::json;
///
/// let errors = validate(&json!({ "status": "Pending" })).unwrap_err();
/// assert!(errors.iter().any(|e| e.field == "tx_hash"));
/// assert!(errors.iter().any(|e| e.field == "status"));
/// ```
pub fn validate(input: &Value) -> Result<NewCallRecord, Vec<FieldError>> {
    let Some(fields) = input.as_object() else {
        return Err(vec![FieldError::new("body", "must be a JSON object")]);
    };

    let mut check = Checker { fields, errors: Vec::new() };

    let tx_hash = check.string("tx_hash");
    let provider = check.string("provider");
    let provider_node = check.string("provider_node");
    let source_node = check.string("source_node");
    let arg_count = check.integer("arg_count");
    let price_usdc = check.decimal("price_usdc");
    let transferred_usdc = check.decimal("transferred_usdc");
    let status = check.status("status");
    let started_at = check.string("started_at");
    let successful_attempt = check.integer("successful_attempt");
    let total_attempts = check.integer("total_attempts");
    let payment_validated = check.boolean("payment_validated");
    let error_type = check.error_category("error_type");

    let completed_at = check.optional_text("completed_at");
    let total_duration_ms = check.optional_integer("total_duration_ms");
    let response_size_bytes = check.optional_integer("response_size_bytes");
    let error_message = check.optional_text("error_message");
    let validation_error = check.optional_text("validation_error");

    let (
        Some(tx_hash),
        Some(provider),
        Some(provider_node),
        Some(source_node),
        Some(arg_count),
        Some(price_usdc),
        Some(transferred_usdc),
        Some(status),
        Some(started_at),
        Some(successful_attempt),
        Some(total_attempts),
        Some(payment_validated),
        Some(error_type),
        Some(total_duration_ms),
        Some(response_size_bytes),
    ) = (
        tx_hash,
        provider,
        provider_node,
        source_node,
        arg_count,
        price_usdc,
        transferred_usdc,
        status,
        started_at,
        successful_attempt,
        total_attempts,
        payment_validated,
        error_type,
        total_duration_ms,
        response_size_bytes,
    )
    else {
        return Err(check.errors);
    };

    Ok(NewCallRecord {
        tx_hash,
        provider,
        provider_node,
        source_node,
        arg_count,
        price_usdc,
        transferred_usdc,
        status,
        started_at,
        completed_at,
        total_duration_ms,
        successful_attempt,
        total_attempts,
        response_size_bytes,
        error_type,
        error_message,
        validation_error,
        payment_validated,
    })
}

/// Field accessor that records a [`FieldError`] for every failed check.
///
/// Each method returns `None` exactly when it pushed an error.
struct Checker<'a> {
    fields: &'a Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> Checker<'a> {
    /// Returns the value of a present, non-null field.
    fn present(&self, field: &str) -> Option<&'a Value> {
        self.fields.get(field).filter(|value| !value.is_null())
    }

    fn reject(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    fn required(&mut self, field: &'static str) -> Option<&'a Value> {
        match self.present(field) {
            Some(value) => Some(value),
            None => {
                self.reject(field, "is required");
                None
            },
        }
    }

    fn string(&mut self, field: &'static str) -> Option<String> {
        let value = self.required(field)?;
        match value.as_str() {
            Some(s) => Some(s.to_string()),
            None => {
                self.reject(field, "must be a string");
                None
            },
        }
    }

    fn integer(&mut self, field: &'static str) -> Option<i32> {
        let value = self.required(field)?;
        let parsed = match value {
            Value::Number(n) => integral(n),
            _ => Integral::NotIntegral,
        };
        match parsed {
            Integral::Value(v) => match i32::try_from(v) {
                Ok(v) => Some(v),
                Err(_) => {
                    self.reject(field, "is out of range");
                    None
                },
            },
            Integral::OutOfRange => {
                self.reject(field, "is out of range");
                None
            },
            Integral::NotIntegral => {
                self.reject(field, "must be an integer");
                None
            },
        }
    }

    fn decimal(&mut self, field: &'static str) -> Option<BigDecimal> {
        let value = self.required(field)?;
        let parsed = match value {
            Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok(),
            Value::String(s) if !s.trim().is_empty() => BigDecimal::from_str(s.trim()).ok(),
            _ => None,
        };
        let Some(parsed) = parsed else {
            self.reject(field, "must be a number");
            return None;
        };
        let amount = fit_amount(&parsed);
        if amount.is_none() {
            self.reject(field, "is out of range");
        }
        amount
    }

    fn boolean(&mut self, field: &'static str) -> Option<bool> {
        let value = self.required(field)?;
        let parsed = value.as_bool();
        if parsed.is_none() {
            self.reject(field, "must be a boolean");
        }
        parsed
    }

    fn status(&mut self, field: &'static str) -> Option<CallStatus> {
        let value = self.required(field)?;
        let parsed = value.as_str().and_then(|s| s.parse().ok());
        if parsed.is_none() {
            self.reject(field, format!("must be one of: {}", CallStatus::VARIANTS.join(", ")));
        }
        parsed
    }

    /// Outer `None` means the field was rejected; inner `None` means absent.
    fn error_category(&mut self, field: &'static str) -> Option<Option<ErrorCategory>> {
        let Some(value) = self.present(field) else { return Some(None) };
        match value.as_str().and_then(|s| s.parse().ok()) {
            Some(category) => Some(Some(category)),
            None => {
                self.reject(
                    field,
                    format!("must be one of: {}", ErrorCategory::VARIANTS.join(", ")),
                );
                None
            },
        }
    }

    /// Free-form optional field. Non-string values are kept in their JSON
    /// rendering.
    fn optional_text(&self, field: &str) -> Option<String> {
        self.present(field).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Outer `None` means the field was rejected; inner `None` means absent.
    fn optional_integer(&mut self, field: &'static str) -> Option<Option<i64>> {
        let Some(value) = self.present(field) else { return Some(None) };
        let parsed = match value {
            Value::Number(n) => integral(n),
            Value::String(s) => {
                s.trim().parse::<i64>().map_or(Integral::NotIntegral, Integral::Value)
            },
            _ => Integral::NotIntegral,
        };
        match parsed {
            Integral::Value(v) => Some(Some(v)),
            Integral::OutOfRange => {
                self.reject(field, "is out of range");
                None
            },
            Integral::NotIntegral => {
                self.reject(field, "must be an integer");
                None
            },
        }
    }
}

/// Fractional digits kept by the `NUMERIC(20, 6)` amount columns.
const AMOUNT_SCALE: i64 = 6;

/// Exclusive bound on the magnitude of a stored amount.
const AMOUNT_LIMIT: i64 = 100_000_000_000_000;

/// Rounds an amount to the column scale, or `None` when its integer part
/// does not fit the column.
fn fit_amount(value: &BigDecimal) -> Option<BigDecimal> {
    // The magnitude is below 10^integer_digits. Checked before rounding so
    // extreme exponents are never expanded.
    let (_, scale) = value.as_bigint_and_exponent();
    let integer_digits = i128::from(value.digits()) - i128::from(scale);
    if integer_digits > 14 {
        return None;
    }
    if integer_digits <= -i128::from(AMOUNT_SCALE + 1) {
        return Some(BigDecimal::from(0));
    }

    let rounded = value.with_scale_round(AMOUNT_SCALE, RoundingMode::HalfUp);
    (rounded.abs() < BigDecimal::from(AMOUNT_LIMIT)).then_some(rounded)
}

enum Integral {
    Value(i64),
    OutOfRange,
    NotIntegral,
}

/// Accepts integers and floats with no fractional part (`2` and `2.0`).
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn integral(n: &Number) -> Integral {
    if let Some(v) = n.as_i64() {
        return Integral::Value(v);
    }
    if n.is_u64() {
        return Integral::OutOfRange;
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 => {
            if f >= i64::MIN as f64 && f < i64::MAX as f64 {
                Integral::Value(f as i64)
            } else {
                Integral::OutOfRange
            }
        },
        _ => Integral::NotIntegral,
    }
}
