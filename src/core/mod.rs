//! Wire-level atoms of the lazy-paging protocol.
//!
//! - identity: ListId, PageToken, CorrelationToken, Direction
//! - envelope: Seed, UpdateEnvelope, FetchRequestEvent
//! - error: surfaced error taxonomy and decode errors

pub mod envelope;
pub mod error;
pub mod identity;

pub use envelope::{
    EVENT_KIND_FETCH_REQUEST, FetchRequestEvent, FetchRequestValue, Seed, UpdateEnvelope,
};
pub use error::{
    ERROR_TYPE_LIST_ERROR, EnvelopeError, ErrorReason, ErrorRecord, FieldError,
};
pub use identity::{CorrelationToken, Direction, ListId, PageToken, STARTING_CORRELATION};
