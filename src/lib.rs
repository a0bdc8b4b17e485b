#![forbid(unsafe_code)]

//! Lazily-paged dynamic token list data source provider.
//!
//! A host engine binds scrollable containers to virtual item sequences that
//! grow at both ends from asynchronously fetched pages. This crate owns the
//! paging state machine: when to request more items, how to correlate
//! responses with outstanding requests, retry on timeout, splice accepted
//! pages without disturbing the user's position, and surface (never throw)
//! a stable error taxonomy.

pub mod config;
pub mod core;
pub mod list;
pub mod pending;
pub mod provider;
mod scheduler;
pub mod test_harness;

pub use crate::config::{DEFAULT_SOURCE_TYPE, SourceConfig};
pub use crate::core::{
    CorrelationToken, Direction, ERROR_TYPE_LIST_ERROR, EVENT_KIND_FETCH_REQUEST, EnvelopeError,
    ErrorReason, ErrorRecord, FetchRequestEvent, FetchRequestValue, FieldError, ListId, PageToken,
    STARTING_CORRELATION, Seed, UpdateEnvelope,
};
pub use crate::list::{Child, ListChange, ListState};
pub use crate::pending::{PendingRequest, PendingTable};
pub use crate::provider::FeedProvider;
