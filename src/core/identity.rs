//! Identity atoms for the lazy-paging protocol.
//!
//! ListId: host-chosen list identifier
//! PageToken: opaque frontier cursor
//! CorrelationToken: provider-assigned request identifier

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::FieldError;

/// Correlation tokens are issued above this value; the first one is 101.
pub const STARTING_CORRELATION: u64 = 100;

/// List identifier - non-empty string, unique across live lists.
///
/// Hosts name their lists. No validation beyond non-empty.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ListId(String);

impl ListId {
    pub fn parse(s: impl Into<String>) -> Result<Self, FieldError> {
        let s = s.into();
        if s.is_empty() {
            Err(FieldError::Invalid {
                field: "listId",
                reason: "empty".into(),
            })
        } else {
            Ok(Self(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListId({:?})", self.0)
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque paging cursor chosen by the host, compared by string equality only.
///
/// The empty string is reserved on the wire as the "no further page" marker
/// and is never a valid token.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PageToken(String);

impl PageToken {
    pub fn parse(s: impl Into<String>) -> Result<Self, FieldError> {
        let s = s.into();
        if s.is_empty() {
            Err(FieldError::Invalid {
                field: "pageToken",
                reason: "empty".into(),
            })
        } else {
            Ok(Self(s))
        }
    }

    /// Empty and absent both mean "frontier closed" on the wire.
    pub fn parse_optional(s: Option<String>) -> Option<Self> {
        match s {
            Some(s) if !s.is_empty() => Some(Self(s)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageToken({:?})", self.0)
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request correlation token.
///
/// Internally an integer; on the wire always the decimal string (hosts rely
/// on the exact textual form).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CorrelationToken(u64);

impl CorrelationToken {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn parse(s: &str) -> Result<Self, FieldError> {
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| FieldError::Invalid {
                field: "correlationToken",
                reason: format!("`{s}` is not a decimal integer"),
            })
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for CorrelationToken {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for CorrelationToken {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Which frontier of the virtual sequence a fetch extends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        }
    }
}
