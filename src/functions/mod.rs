/// Trusted remote functions
///
/// Client side of the callable-function protocol used for mutations the
/// caller is not allowed to perform directly, like ownership transfer.

pub mod http;

pub use http::HttpFunctionsClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Name of the function that transfers record ownership
pub const UPDATE_OWNERS: &str = "updateOwners";

/// Remote function invocation trait
#[async_trait]
pub trait FunctionsClient: Send + Sync {
    /// Invoke `name` with `payload` and return its result
    async fn call(&self, name: &str, payload: Value) -> Result<Value, FunctionsError>;
}

/// Failure of a remote function call
#[derive(Error, Debug, Clone)]
pub enum FunctionsError {
    /// The backend rejected the call with a typed status
    #[error("Functions failed ({code}): {message}")]
    Remote {
        code: FunctionsErrorCode,
        message: String,
        details: Option<Value>,
    },

    /// The call never produced a typed answer (network, decoding)
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Status codes reported by callable functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FunctionsErrorCode {
    Ok,
    Cancelled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
}

impl FunctionsErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionsErrorCode::Ok => "OK",
            FunctionsErrorCode::Cancelled => "CANCELLED",
            FunctionsErrorCode::Unknown => "UNKNOWN",
            FunctionsErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            FunctionsErrorCode::DeadlineExceeded => "DEADLINE_EXCEEDED",
            FunctionsErrorCode::NotFound => "NOT_FOUND",
            FunctionsErrorCode::AlreadyExists => "ALREADY_EXISTS",
            FunctionsErrorCode::PermissionDenied => "PERMISSION_DENIED",
            FunctionsErrorCode::ResourceExhausted => "RESOURCE_EXHAUSTED",
            FunctionsErrorCode::FailedPrecondition => "FAILED_PRECONDITION",
            FunctionsErrorCode::Aborted => "ABORTED",
            FunctionsErrorCode::OutOfRange => "OUT_OF_RANGE",
            FunctionsErrorCode::Unimplemented => "UNIMPLEMENTED",
            FunctionsErrorCode::Internal => "INTERNAL",
            FunctionsErrorCode::Unavailable => "UNAVAILABLE",
            FunctionsErrorCode::DataLoss => "DATA_LOSS",
            FunctionsErrorCode::Unauthenticated => "UNAUTHENTICATED",
        }
    }

    /// Parse a wire status; anything unrecognised is `Unknown`
    pub fn parse(status: &str) -> Self {
        match status {
            "OK" => FunctionsErrorCode::Ok,
            "CANCELLED" => FunctionsErrorCode::Cancelled,
            "INVALID_ARGUMENT" => FunctionsErrorCode::InvalidArgument,
            "DEADLINE_EXCEEDED" => FunctionsErrorCode::DeadlineExceeded,
            "NOT_FOUND" => FunctionsErrorCode::NotFound,
            "ALREADY_EXISTS" => FunctionsErrorCode::AlreadyExists,
            "PERMISSION_DENIED" => FunctionsErrorCode::PermissionDenied,
            "RESOURCE_EXHAUSTED" => FunctionsErrorCode::ResourceExhausted,
            "FAILED_PRECONDITION" => FunctionsErrorCode::FailedPrecondition,
            "ABORTED" => FunctionsErrorCode::Aborted,
            "OUT_OF_RANGE" => FunctionsErrorCode::OutOfRange,
            "UNIMPLEMENTED" => FunctionsErrorCode::Unimplemented,
            "INTERNAL" => FunctionsErrorCode::Internal,
            "UNAVAILABLE" => FunctionsErrorCode::Unavailable,
            "DATA_LOSS" => FunctionsErrorCode::DataLoss,
            "UNAUTHENTICATED" => FunctionsErrorCode::Unauthenticated,
            _ => FunctionsErrorCode::Unknown,
        }
    }
}

impl fmt::Display for FunctionsErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
