//! Protocol error taxonomy surfaced to the host.
//!
//! The provider never throws at the host: every failure becomes an
//! [`ErrorRecord`] appended to an internal queue the host drains.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::identity::ListId;

/// Wire value of the `type` field on every queued error record.
pub const ERROR_TYPE_LIST_ERROR: &str = "LIST_ERROR";

/// Rejection and failure reasons, with their exact wire spellings.
///
/// A stale page token deliberately reuses `INCONSISTENT_LIST_ID`; hosts
/// match on the observed string and there is no separate stale-token reason.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorReason {
    InternalError,
    InvalidListId,
    InconsistentListId,
    MissingListItems,
    LoadTimeout,
}

impl ErrorReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorReason::InternalError => "INTERNAL_ERROR",
            ErrorReason::InvalidListId => "INVALID_LIST_ID",
            ErrorReason::InconsistentListId => "INCONSISTENT_LIST_ID",
            ErrorReason::MissingListItems => "MISSING_LIST_ITEMS",
            ErrorReason::LoadTimeout => "LOAD_TIMEOUT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INTERNAL_ERROR" => Some(ErrorReason::InternalError),
            "INVALID_LIST_ID" => Some(ErrorReason::InvalidListId),
            "INCONSISTENT_LIST_ID" => Some(ErrorReason::InconsistentListId),
            "MISSING_LIST_ITEMS" => Some(ErrorReason::MissingListItems),
            "LOAD_TIMEOUT" => Some(ErrorReason::LoadTimeout),
            _ => None,
        }
    }
}

/// One entry in the provider's pending-error queue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    #[serde(rename = "type", default = "default_error_type")]
    pub error_type: String,
    pub reason: ErrorReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_id: Option<String>,
    pub message: String,
}

fn default_error_type() -> String {
    ERROR_TYPE_LIST_ERROR.to_string()
}

impl ErrorRecord {
    pub fn new(reason: ErrorReason, list_id: Option<&ListId>, message: impl Into<String>) -> Self {
        Self {
            error_type: default_error_type(),
            reason,
            list_id: list_id.map(|id| id.as_str().to_string()),
            message: message.into(),
        }
    }
}

/// Field-level validation failure inside a seed or update envelope.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("field `{field}` is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Decode failure for an inbound payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("malformed payload: {0}")]
    Decode(String),
}
