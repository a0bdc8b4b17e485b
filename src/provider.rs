//! Provider facade.
//!
//! Owns every bound list, the pending-request table, the correlation
//! counter, the outbound fetch event queue, and the pending-error queue.
//! Components refer to lists by id, never by pointer. All state transitions
//! happen on the host's thread; time only moves when the host advances it.

use std::collections::{BTreeMap, VecDeque};

use serde_json::Value;

use crate::config::SourceConfig;
use crate::core::{
    CorrelationToken, Direction, ErrorReason, ErrorRecord, FetchRequestEvent, FetchRequestValue,
    ListId, PageToken, STARTING_CORRELATION, Seed, UpdateEnvelope,
};
use crate::list::{ListChange, ListState};
use crate::pending::{PendingRequest, PendingTable};
use crate::scheduler;

pub struct FeedProvider {
    config: SourceConfig,
    lists: BTreeMap<ListId, ListState>,
    pending: PendingTable,
    last_correlation: u64,
    errors: Vec<ErrorRecord>,
    events: VecDeque<FetchRequestEvent>,
    now_ms: u64,
}

/// What an inbound envelope resolved to, before any mutation.
enum Resolution {
    Request(CorrelationToken),
    /// Correlation-less first backward page routed by the seed's cursor.
    SeedBackward,
    Reject {
        reason: ErrorReason,
        message: String,
    },
}

impl Default for FeedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedProvider {
    pub fn new() -> Self {
        Self::with_config(SourceConfig::default())
    }

    pub fn with_config(mut config: SourceConfig) -> Self {
        config.cache_chunk_size = config.cache_chunk_size.max(1);
        config.fetch_timeout_ms = config.fetch_timeout_ms.max(1);
        Self {
            config,
            lists: BTreeMap::new(),
            pending: PendingTable::new(),
            last_correlation: STARTING_CORRELATION,
            errors: Vec::new(),
            events: VecDeque::new(),
            now_ms: 0,
        }
    }

    /// Effective configuration, defaults filled in.
    pub fn configuration(&self) -> &SourceConfig {
        &self.config
    }

    /// Bind a dynamic source from its seed payload.
    ///
    /// Returns `None` with a queued `INTERNAL_ERROR` when the seed is
    /// malformed, carries the wrong type tag, or reuses a live list id.
    /// During reinflation a known id re-binds the surviving list instead.
    pub fn create_list(&mut self, payload: &Value) -> Option<ListId> {
        let seed = match Seed::decode(payload) {
            Ok(seed) => seed,
            Err(err) => {
                self.report(
                    ErrorReason::InternalError,
                    None,
                    format!("Missing required fields: {err}."),
                );
                return None;
            }
        };
        if seed.source_type != self.config.source_type {
            let list_id = seed.list_id;
            self.report(
                ErrorReason::InternalError,
                Some(&list_id),
                format!("Unknown data source type: {}.", seed.source_type),
            );
            return None;
        }

        let list_id = seed.list_id.clone();
        if let Some(existing) = self.lists.get_mut(&list_id) {
            if existing.reattach() {
                let fetches = Self::initial_fetches(existing);
                for (direction, token) in fetches {
                    self.dispatch_fetch(&list_id, direction, token, 0);
                }
                return Some(list_id);
            }
            self.report(
                ErrorReason::InternalError,
                Some(&list_id),
                "Trying to reuse existing listId.",
            );
            return None;
        }

        let list = ListState::from_seed(seed);
        let fetches = Self::initial_fetches(&list);
        self.lists.insert(list_id.clone(), list);
        for (direction, token) in fetches {
            self.dispatch_fetch(&list_id, direction, token, 0);
        }
        Some(list_id)
    }

    fn initial_fetches(list: &ListState) -> Vec<(Direction, PageToken)> {
        scheduler::creation_fetches(list)
            .into_iter()
            .filter_map(|direction| {
                list.frontier_token(direction)
                    .cloned()
                    .map(|token| (direction, token))
            })
            .collect()
    }

    /// Apply a host response envelope.
    ///
    /// Returns `true` iff the envelope was accepted and changed list state.
    /// Every rejection queues an error record and leaves state untouched,
    /// except failed attempts (empty items) which advance the retry counter.
    pub fn process_update(&mut self, payload: &Value) -> bool {
        let envelope = match UpdateEnvelope::decode(payload) {
            Ok(envelope) => envelope,
            Err(err) => {
                self.report(
                    ErrorReason::InternalError,
                    None,
                    format!("Unable to process update: {err}."),
                );
                return false;
            }
        };
        self.apply_update(envelope)
    }

    fn apply_update(&mut self, envelope: UpdateEnvelope) -> bool {
        let resolution = self.resolve(&envelope);
        let matched = match resolution {
            Resolution::Reject { reason, message } => {
                self.report(reason, Some(&envelope.list_id), message);
                return false;
            }
            Resolution::Request(correlation) => Some(correlation),
            Resolution::SeedBackward => None,
        };

        if envelope.items.is_empty() {
            match matched {
                Some(correlation) => self.fail_attempt(
                    correlation,
                    ErrorReason::MissingListItems,
                    "Update has no items.".to_string(),
                ),
                None => self.report(
                    ErrorReason::MissingListItems,
                    Some(&envelope.list_id),
                    "Update has no items.",
                ),
            }
            return false;
        }

        let direction = match matched {
            Some(correlation) => {
                let request = self
                    .pending
                    .remove(correlation)
                    .expect("resolved request is live");
                request.direction
            }
            None => Direction::Backward,
        };

        let list = self
            .lists
            .get_mut(&envelope.list_id)
            .expect("resolved list exists");
        list.splice(direction, envelope.items, envelope.next_page_token);
        self.evaluate(&envelope.list_id);
        true
    }

    /// Validation order: list existence, correlation/list consistency, page
    /// token match, then retry substitution and the seed-cursor pathway.
    fn resolve(&self, envelope: &UpdateEnvelope) -> Resolution {
        if !self.lists.contains_key(&envelope.list_id) {
            let live_correlation = envelope
                .correlation_token
                .is_some_and(|correlation| self.pending.get(correlation).is_some());
            return if live_correlation {
                Resolution::Reject {
                    reason: ErrorReason::InconsistentListId,
                    message: "Non-existing listId.".to_string(),
                }
            } else {
                Resolution::Reject {
                    reason: ErrorReason::InvalidListId,
                    message: "Unexpected response.".to_string(),
                }
            };
        }

        match envelope.correlation_token {
            Some(correlation) => match self.pending.get(correlation) {
                Some(request) if request.list_id == envelope.list_id => {
                    if request.expected_page_token == envelope.page_token {
                        Resolution::Request(correlation)
                    } else {
                        Resolution::Reject {
                            reason: ErrorReason::InconsistentListId,
                            message: format!("Unexpected pageToken: {}.", envelope.page_token),
                        }
                    }
                }
                Some(_) => Resolution::Reject {
                    reason: ErrorReason::InconsistentListId,
                    message: "listId does not match correlationToken.".to_string(),
                },
                // A retry may already be in flight; the page token decides.
                None => match self
                    .pending
                    .for_page_token(&envelope.list_id, &envelope.page_token)
                {
                    Some(request) => Resolution::Request(request.correlation),
                    None => Resolution::Reject {
                        reason: ErrorReason::InternalError,
                        message: "Wrong correlation token.".to_string(),
                    },
                },
            },
            None => {
                if let Some(request) = self
                    .pending
                    .for_page_token(&envelope.list_id, &envelope.page_token)
                {
                    Resolution::Request(request.correlation)
                } else if self.lists[&envelope.list_id]
                    .accepts_unsolicited_backward(&envelope.page_token)
                {
                    Resolution::SeedBackward
                } else {
                    Resolution::Reject {
                        reason: ErrorReason::InternalError,
                        message: "Missing correlation token.".to_string(),
                    }
                }
            }
        }
    }

    /// Record a failed attempt for a live request: retry while the budget
    /// lasts, otherwise abandon the frontier.
    fn fail_attempt(&mut self, correlation: CorrelationToken, reason: ErrorReason, message: String) {
        let Some(request) = self.pending.remove(correlation) else {
            return;
        };
        let PendingRequest {
            list_id,
            direction,
            expected_page_token,
            mut attempts,
            ..
        } = request;
        attempts += 1;

        if attempts <= self.config.fetch_retries {
            self.report(reason, Some(&list_id), message);
            self.dispatch_fetch(&list_id, direction, expected_page_token, attempts);
        } else {
            self.report(
                ErrorReason::InternalError,
                Some(&list_id),
                format!("Giving up on {} fetch: retries exhausted.", direction.as_str()),
            );
            if let Some(list) = self.lists.get_mut(&list_id) {
                list.abandon(direction);
            }
        }
    }

    /// Move the logical clock forward and fire elapsed deadlines.
    pub fn advance_to(&mut self, now_ms: u64) {
        if now_ms > self.now_ms {
            self.now_ms = now_ms;
        }
        while let Some(correlation) = self.pending.next_due(self.now_ms) {
            self.fail_attempt(
                correlation,
                ErrorReason::LoadTimeout,
                format!("Retrying timed out request: {correlation}."),
            );
        }
    }

    /// Viewport hint in virtual indices; re-evaluates scheduling.
    pub fn notify_visible(&mut self, list_id: &ListId, first: i64, last: i64) {
        let Some(list) = self.lists.get_mut(list_id) else {
            return;
        };
        list.set_viewport(first, last);
        self.evaluate(list_id);
    }

    fn evaluate(&mut self, list_id: &ListId) {
        for direction in [Direction::Backward, Direction::Forward] {
            let Some(list) = self.lists.get(list_id) else {
                return;
            };
            if self.pending.for_direction(list_id, direction).is_some() {
                continue;
            }
            if !scheduler::wants_fetch(list, direction, self.config.cache_chunk_size) {
                continue;
            }
            let Some(token) = list.frontier_token(direction).cloned() else {
                continue;
            };
            self.dispatch_fetch(list_id, direction, token, 0);
        }
    }

    fn dispatch_fetch(
        &mut self,
        list_id: &ListId,
        direction: Direction,
        expected_page_token: PageToken,
        attempts: u32,
    ) {
        let correlation = self.next_correlation();
        tracing::debug!(
            list_id = list_id.as_str(),
            correlation = %correlation,
            page_token = expected_page_token.as_str(),
            "dispatching {} fetch",
            direction.as_str()
        );
        self.events.push_back(FetchRequestEvent {
            name: self.config.source_type.clone(),
            value: FetchRequestValue {
                list_id: list_id.clone(),
                correlation_token: correlation,
                page_token: expected_page_token.clone(),
            },
        });
        self.pending.insert(PendingRequest {
            correlation,
            list_id: list_id.clone(),
            direction,
            expected_page_token,
            deadline_ms: self.now_ms + self.config.fetch_timeout_ms,
            attempts,
        });
    }

    fn next_correlation(&mut self) -> CorrelationToken {
        self.last_correlation += 1;
        CorrelationToken::new(self.last_correlation)
    }

    /// Next undelivered fetch request event, if any.
    pub fn pop_event(&mut self) -> Option<FetchRequestEvent> {
        self.events.pop_front()
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Drain child-visible changes for one list.
    pub fn take_changes(&mut self, list_id: &ListId) -> Vec<ListChange> {
        self.lists
            .get_mut(list_id)
            .map(ListState::take_changes)
            .unwrap_or_default()
    }

    /// Destructively drain the error queue, oldest first.
    pub fn pending_errors(&mut self) -> Vec<ErrorRecord> {
        std::mem::take(&mut self.errors)
    }

    pub fn list(&self, list_id: &ListId) -> Option<&ListState> {
        self.lists.get(list_id)
    }

    /// Declare the consuming container's template sentinels.
    pub fn bind_sentinels(&mut self, list_id: &ListId, has_first_item: bool, has_last_item: bool) {
        if let Some(list) = self.lists.get_mut(list_id) {
            list.set_sentinels(has_first_item, has_last_item);
        }
    }

    /// Outstanding request table. For testing only.
    pub fn pending_requests(&self) -> &PendingTable {
        &self.pending
    }

    /// Tear down one list; its timers are withdrawn before release.
    pub fn remove_list(&mut self, list_id: &ListId) {
        let withdrawn = self.pending.remove_list(list_id);
        if withdrawn > 0 {
            tracing::debug!(
                list_id = list_id.as_str(),
                "withdrew {withdrawn} pending request(s) on teardown"
            );
        }
        self.events.retain(|event| event.value.list_id != *list_id);
        self.lists.remove(list_id);
    }

    /// Configuration-change re-inflation: every pending request is
    /// cancelled and every list detached. Items, base indices, and frontier
    /// tokens survive; re-binding the same list id resumes scheduling.
    pub fn reinflate(&mut self) {
        self.pending.clear();
        self.events.clear();
        for list in self.lists.values_mut() {
            list.detach();
        }
    }

    fn report(&mut self, reason: ErrorReason, list_id: Option<&ListId>, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(
            reason = reason.as_str(),
            list_id = list_id.map_or("N/A", ListId::as_str),
            "{message}"
        );
        self.errors.push(ErrorRecord::new(reason, list_id, message));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn seed(list_id: &str) -> Value {
        json!({
            "type": "dynamicTokenList",
            "listId": list_id,
            "pageToken": "pageToken",
            "forwardPageToken": "forwardPageToken",
            "items": [10, 11, 12, 13, 14]
        })
    }

    #[test]
    fn correlation_tokens_increase_across_lists() {
        let mut provider = FeedProvider::new();
        provider.create_list(&seed("a")).unwrap();
        provider.create_list(&seed("b")).unwrap();

        let first = provider.pop_event().unwrap();
        let second = provider.pop_event().unwrap();
        assert_eq!(first.value.correlation_token, CorrelationToken::new(101));
        assert_eq!(second.value.correlation_token, CorrelationToken::new(102));
        assert!(provider.pending_errors().is_empty());
    }

    #[test]
    fn counter_survives_list_teardown() {
        let mut provider = FeedProvider::new();
        let list_a = provider.create_list(&seed("a")).unwrap();
        provider.remove_list(&list_a);
        assert!(provider.pending_requests().is_empty());

        provider.create_list(&seed("b")).unwrap();
        // Events for the removed list were dropped with it.
        let event = provider.pop_event().unwrap();
        assert_eq!(event.value.list_id.as_str(), "b");
        assert_eq!(event.value.correlation_token, CorrelationToken::new(102));
    }

    #[test]
    fn wrong_type_tag_is_rejected() {
        let mut provider = FeedProvider::new();
        let payload = json!({
            "type": "dynamicIndexList",
            "listId": "a",
            "pageToken": "pageToken",
            "items": []
        });
        assert!(provider.create_list(&payload).is_none());
        let errors = provider.pending_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].reason, ErrorReason::InternalError);
    }
}
