//! Deterministic harness for exercising the provider the way a consuming
//! container would: uniform-height children, a pixel scroll position with
//! backward-splice compensation, and viewport reports after every layout.

use std::ops::RangeInclusive;

use serde_json::{Value, json};

use crate::core::ListId;
use crate::list::{Child, ListChange};
use crate::provider::FeedProvider;

pub const CHILD_HEIGHT_PX: i64 = 100;

/// A scrollable sequence bound to one list.
pub struct TestSequence {
    list_id: ListId,
    viewport_height_px: i64,
    child_height_px: i64,
    scroll_px: i64,
    first_id: Option<String>,
    last_id: Option<String>,
}

impl TestSequence {
    pub fn bind(provider: &mut FeedProvider, list_id: &ListId, viewport_height_px: i64) -> Self {
        let mut sequence = Self {
            list_id: list_id.clone(),
            viewport_height_px,
            child_height_px: CHILD_HEIGHT_PX,
            scroll_px: 0,
            first_id: None,
            last_id: None,
        };
        sequence.layout(provider);
        sequence
    }

    pub fn bind_with_sentinels(
        provider: &mut FeedProvider,
        list_id: &ListId,
        viewport_height_px: i64,
        first_id: Option<&str>,
        last_id: Option<&str>,
    ) -> Self {
        provider.bind_sentinels(list_id, first_id.is_some(), last_id.is_some());
        let mut sequence = Self::bind(provider, list_id, viewport_height_px);
        sequence.first_id = first_id.map(str::to_string);
        sequence.last_id = last_id.map(str::to_string);
        sequence
    }

    /// Apply queued child changes, compensate scroll for backward growth,
    /// and report the resulting visible range back to the provider.
    pub fn layout(&mut self, provider: &mut FeedProvider) {
        for change in provider.take_changes(&self.list_id) {
            if let ListChange::Prepended { count } = change {
                self.scroll_px += count as i64 * self.child_height_px;
            }
        }
        self.report_viewport(provider);
    }

    pub fn scroll_to(&mut self, provider: &mut FeedProvider, scroll_px: i64) {
        self.scroll_px = scroll_px.max(0);
        self.layout(provider);
    }

    pub fn scroll_px(&self) -> i64 {
        self.scroll_px
    }

    /// Pixel offset of the child currently holding the given virtual index.
    pub fn offset_of_index(&self, provider: &FeedProvider, index: i64) -> Option<i64> {
        let list = provider.list(&self.list_id)?;
        let slot = index - list.base_index() + i64::from(list.has_first_item());
        Some(slot * self.child_height_px - self.scroll_px)
    }

    pub fn child_count(&self, provider: &FeedProvider) -> usize {
        provider
            .list(&self.list_id)
            .map_or(0, |list| list.child_count())
    }

    pub fn child_id(&self, provider: &FeedProvider, position: usize) -> Option<String> {
        let list = provider.list(&self.list_id)?;
        match list.child_at(position)? {
            Child::First => self.first_id.clone(),
            Child::Last => self.last_id.clone(),
            Child::Item(item) => Some(item_id(item)),
        }
    }

    fn report_viewport(&self, provider: &mut FeedProvider) {
        let (base, len, first_offset) = match provider.list(&self.list_id) {
            Some(list) if !list.items().is_empty() => (
                list.base_index(),
                list.items().len() as i64,
                i64::from(list.has_first_item()),
            ),
            _ => return,
        };

        let first_slot = self.scroll_px.div_euclid(self.child_height_px);
        let last_slot =
            (self.scroll_px + self.viewport_height_px - 1).div_euclid(self.child_height_px);
        let first_index = (first_slot - first_offset).clamp(0, len - 1) + base;
        let last_index = (last_slot - first_offset).clamp(0, len - 1) + base;
        provider.notify_visible(&self.list_id, first_index, last_index);
    }
}

/// Child id the way the reference templates derive it: `id${data}`.
fn item_id(item: &Value) -> String {
    match item {
        Value::String(s) => format!("id{s}"),
        Value::Number(n) => format!("id{n}"),
        Value::Bool(b) => format!("id{b}"),
        other => format!("id{other}"),
    }
}

/// Seed payload builder. Empty frontier tokens are omitted.
pub fn seed_payload(
    list_id: &str,
    forward_page_token: &str,
    backward_page_token: &str,
    items: Vec<Value>,
) -> Value {
    let mut payload = json!({
        "type": "dynamicTokenList",
        "listId": list_id,
        "pageToken": "pageToken",
        "items": items,
    });
    if !forward_page_token.is_empty() {
        payload["forwardPageToken"] = json!(forward_page_token);
    }
    if !backward_page_token.is_empty() {
        payload["backwardPageToken"] = json!(backward_page_token);
    }
    payload
}

/// Lazy-load response builder. A negative correlation omits the field; an
/// empty next token omits the field (closing the frontier).
pub fn lazy_load(
    list_id: &str,
    correlation_token: i64,
    page_token: &str,
    next_page_token: &str,
    items: Vec<Value>,
) -> Value {
    let mut payload = json!({
        "presentationToken": "presentationToken",
        "listId": list_id,
        "pageToken": page_token,
        "items": items,
    });
    if correlation_token >= 0 {
        payload["correlationToken"] = json!(correlation_token.to_string());
    }
    if !next_page_token.is_empty() {
        payload["nextPageToken"] = json!(next_page_token);
    }
    payload
}

/// Inclusive integer item range, matching the reference fixtures.
pub fn int_items(range: RangeInclusive<i64>) -> Vec<Value> {
    range.map(Value::from).collect()
}

/// Drain the error queue down to its wire reasons.
pub fn drain_reasons(provider: &mut FeedProvider) -> Vec<&'static str> {
    provider
        .pending_errors()
        .iter()
        .map(|record| record.reason.as_str())
        .collect()
}

/// Pop the next fetch event and check its routing fields.
pub fn expect_fetch(
    provider: &mut FeedProvider,
    list_id: &str,
    correlation_token: u64,
    page_token: &str,
) {
    let event = provider
        .pop_event()
        .unwrap_or_else(|| panic!("expected fetch request {correlation_token} for {list_id}"));
    assert_eq!(event.value.list_id.as_str(), list_id);
    assert_eq!(event.value.correlation_token.get(), correlation_token);
    assert_eq!(event.value.page_token.as_str(), page_token);
}
