//! Call record domain models.
//!
//! A call record describes one paid provider call: who served it, what it
//! cost, how many attempts it took and how it ended. Records are keyed by
//! the on-chain transaction hash that paid for the call.

use std::{fmt, str::FromStr};

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

type PgDb = sqlx::Postgres;
type PgValueRef<'r> = sqlx::postgres::PgValueRef<'r>;
type PgTypeInfo = sqlx::postgres::PgTypeInfo;
type PgArgumentBuffer = sqlx::postgres::PgArgumentBuffer;
type EncodeResult =
    Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync + 'static>>;
type BoxDynError = sqlx::error::BoxDynError;

/// Final outcome of a provider call.
///
/// Stored verbatim (`Success` / `Failed`) and guarded by a check constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallStatus {
    /// The provider answered and the response was delivered.
    Success,
    /// Every attempt failed or the call was rejected before dispatch.
    Failed,
}

impl CallStatus {
    /// All accepted spellings, in declaration order.
    pub const VARIANTS: [&'static str; 2] = ["Success", "Failed"];

    /// Returns the stored spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Success" => Ok(Self::Success),
            "Failed" => Ok(Self::Failed),
            _ => Err(format!("invalid call status: {s}")),
        }
    }
}

impl sqlx::Type<PgDb> for CallStatus {
    fn type_info() -> PgTypeInfo {
        <&str as sqlx::Type<PgDb>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, PgDb> for CallStatus {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let s = <&str as sqlx::Decode<PgDb>>::decode(value)?;
        Ok(s.parse()?)
    }
}

impl sqlx::Encode<'_, PgDb> for CallStatus {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> EncodeResult {
        <&str as sqlx::Encode<PgDb>>::encode_by_ref(&self.as_str(), buf)
    }
}

/// Classification of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// No provider matched the requested route.
    ProviderNotFound,
    /// The payment attached to the call did not verify.
    PaymentValidationFailed,
    /// Every retry against the provider failed.
    AllRetriesFailed,
    /// The provider API returned an error.
    ApiCallFailed,
}

impl ErrorCategory {
    /// All accepted spellings, in declaration order.
    pub const VARIANTS: [&'static str; 4] =
        ["ProviderNotFound", "PaymentValidationFailed", "AllRetriesFailed", "ApiCallFailed"];

    /// Returns the stored spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProviderNotFound => "ProviderNotFound",
            Self::PaymentValidationFailed => "PaymentValidationFailed",
            Self::AllRetriesFailed => "AllRetriesFailed",
            Self::ApiCallFailed => "ApiCallFailed",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ProviderNotFound" => Ok(Self::ProviderNotFound),
            "PaymentValidationFailed" => Ok(Self::PaymentValidationFailed),
            "AllRetriesFailed" => Ok(Self::AllRetriesFailed),
            "ApiCallFailed" => Ok(Self::ApiCallFailed),
            _ => Err(format!("invalid error category: {s}")),
        }
    }
}

impl sqlx::Type<PgDb> for ErrorCategory {
    fn type_info() -> PgTypeInfo {
        <&str as sqlx::Type<PgDb>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, PgDb> for ErrorCategory {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let s = <&str as sqlx::Decode<PgDb>>::decode(value)?;
        Ok(s.parse()?)
    }
}

impl sqlx::Encode<'_, PgDb> for ErrorCategory {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> EncodeResult {
        <&str as sqlx::Encode<PgDb>>::encode_by_ref(&self.as_str(), buf)
    }
}

/// A validated call record ready to be written.
///
/// Timestamps are kept as submitted; PostgreSQL parses them on write so a
/// malformed timestamp surfaces as a store error rather than a client error.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCallRecord {
    /// Transaction hash that paid for the call. Unique per record.
    pub tx_hash: String,
    /// Provider identifier.
    pub provider: String,
    /// Node of the provider that served the call.
    pub provider_node: String,
    /// Node that originated the call.
    pub source_node: String,
    /// Number of arguments passed to the provider.
    pub arg_count: i32,
    /// Quoted price in USDC.
    pub price_usdc: BigDecimal,
    /// Amount actually transferred in USDC.
    pub transferred_usdc: BigDecimal,
    /// Final outcome.
    pub status: CallStatus,
    /// When the call started, as submitted.
    pub started_at: String,
    /// When the call completed, as submitted.
    pub completed_at: Option<String>,
    /// Wall-clock duration of the whole call.
    pub total_duration_ms: Option<i64>,
    /// Index of the attempt that succeeded.
    pub successful_attempt: i32,
    /// Number of attempts made.
    pub total_attempts: i32,
    /// Size of the provider response.
    pub response_size_bytes: Option<i64>,
    /// Failure classification, if the call failed.
    pub error_type: Option<ErrorCategory>,
    /// Free-form failure description.
    pub error_message: Option<String>,
    /// Payment validation failure detail.
    pub validation_error: Option<String>,
    /// Whether the attached payment verified.
    pub payment_validated: bool,
}

/// A call record as stored.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CallRecord {
    /// Row identifier.
    pub id: i64,
    /// Transaction hash that paid for the call.
    pub tx_hash: String,
    /// Provider identifier.
    pub provider: String,
    /// Node of the provider that served the call.
    pub provider_node: String,
    /// Node that originated the call.
    pub source_node: String,
    /// Number of arguments passed to the provider.
    pub arg_count: i32,
    /// Quoted price in USDC, six fractional digits.
    pub price_usdc: BigDecimal,
    /// Amount actually transferred in USDC, six fractional digits.
    pub transferred_usdc: BigDecimal,
    /// Final outcome.
    pub status: CallStatus,
    /// When the call started.
    pub started_at: DateTime<Utc>,
    /// When the call completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Wall-clock duration of the whole call.
    pub total_duration_ms: Option<i64>,
    /// Index of the attempt that succeeded.
    pub successful_attempt: i32,
    /// Number of attempts made.
    pub total_attempts: i32,
    /// Size of the provider response.
    pub response_size_bytes: Option<i64>,
    /// Failure classification.
    pub error_type: Option<ErrorCategory>,
    /// Free-form failure description.
    pub error_message: Option<String>,
    /// Payment validation failure detail.
    pub validation_error: Option<String>,
    /// Whether the attached payment verified.
    pub payment_validated: bool,
    /// First insert time. Never changes.
    pub created_at: DateTime<Utc>,
    /// Last write time.
    pub updated_at: DateTime<Utc>,
}

/// Identity and timestamps of the row touched by an upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct UpsertReceipt {
    /// Row identifier.
    pub id: i64,
    /// Transaction hash of the row.
    pub tx_hash: String,
    /// First insert time.
    pub created_at: DateTime<Utc>,
    /// Time of this write.
    pub updated_at: DateTime<Utc>,
}
