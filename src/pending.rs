//! Outstanding fetch bookkeeping.
//!
//! Timers are plain logical-clock deadlines owned by the table; the host
//! drives time forward and due requests are drained in deadline order.
//! Cancellation is a table removal.

use std::collections::BTreeMap;

use crate::core::{CorrelationToken, Direction, ListId, PageToken};

/// One in-flight fetch awaiting its response envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingRequest {
    pub correlation: CorrelationToken,
    pub list_id: ListId,
    pub direction: Direction,
    /// Frontier token at the moment of send; retries keep it.
    pub expected_page_token: PageToken,
    pub deadline_ms: u64,
    /// Failed attempts recorded so far for this (list, direction, token).
    pub attempts: u32,
}

#[derive(Debug, Default)]
pub struct PendingTable {
    by_correlation: BTreeMap<u64, PendingRequest>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// At most one request per (list, direction) may be outstanding.
    pub fn insert(&mut self, request: PendingRequest) {
        debug_assert!(
            self.for_direction(&request.list_id, request.direction).is_none(),
            "duplicate pending request for {} {}",
            request.list_id,
            request.direction.as_str()
        );
        self.by_correlation
            .insert(request.correlation.get(), request);
    }

    pub fn get(&self, correlation: CorrelationToken) -> Option<&PendingRequest> {
        self.by_correlation.get(&correlation.get())
    }

    pub fn remove(&mut self, correlation: CorrelationToken) -> Option<PendingRequest> {
        self.by_correlation.remove(&correlation.get())
    }

    pub fn for_direction(&self, list_id: &ListId, direction: Direction) -> Option<&PendingRequest> {
        self.by_correlation
            .values()
            .find(|request| request.list_id == *list_id && request.direction == direction)
    }

    /// A live request for `list_id` whose frontier token matches, no matter
    /// which correlation was in flight (retry substitution).
    pub fn for_page_token(&self, list_id: &ListId, token: &PageToken) -> Option<&PendingRequest> {
        self.by_correlation
            .values()
            .find(|request| request.list_id == *list_id && request.expected_page_token == *token)
    }

    /// Earliest request whose deadline has elapsed; ties break on the lower
    /// correlation so draining is deterministic.
    pub fn next_due(&self, now_ms: u64) -> Option<CorrelationToken> {
        self.by_correlation
            .values()
            .filter(|request| request.deadline_ms <= now_ms)
            .min_by_key(|request| (request.deadline_ms, request.correlation.get()))
            .map(|request| request.correlation)
    }

    /// Withdraw every request for a list; returns how many were cancelled.
    pub fn remove_list(&mut self, list_id: &ListId) -> usize {
        let before = self.by_correlation.len();
        self.by_correlation
            .retain(|_, request| request.list_id != *list_id);
        before - self.by_correlation.len()
    }

    pub fn clear(&mut self) {
        self.by_correlation.clear();
    }

    pub fn len(&self) -> usize {
        self.by_correlation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_correlation.is_empty()
    }
}
