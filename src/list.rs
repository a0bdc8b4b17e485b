//! Virtual list state and splicing.
//!
//! A `ListState` is one lazily-paged sequence: a contiguous window of opaque
//! items whose absolute index space may extend in both directions from the
//! seed. Splices only ever touch a frontier; there are never gaps.

use serde_json::Value;

use crate::core::{Direction, ListId, PageToken, Seed};

/// Child-visible mutation, drained by the consuming container.
///
/// A `Prepended` change implies a compensating scroll adjustment of `count`
/// child slots so previously visible content keeps its on-screen offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListChange {
    Appended { count: usize },
    Prepended { count: usize },
}

/// One relative child slot of the consuming container.
///
/// Template sentinels sit at the outermost slots and never participate in
/// virtual indexing or paging.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Child<'a> {
    First,
    Item(&'a Value),
    Last,
}

#[derive(Clone, Debug)]
pub struct ListState {
    list_id: ListId,
    items: Vec<Value>,
    base_index: i64,
    forward_token: Option<PageToken>,
    backward_token: Option<PageToken>,
    presentation_token: PageToken,
    has_first_item: bool,
    has_last_item: bool,
    forward_abandoned: bool,
    backward_abandoned: bool,
    backward_seeded: bool,
    backward_spliced: bool,
    viewport: Option<(i64, i64)>,
    changes: Vec<ListChange>,
    detached: bool,
}

impl ListState {
    pub(crate) fn from_seed(seed: Seed) -> Self {
        let backward_seeded = seed.backward_page_token.is_some();
        Self {
            list_id: seed.list_id,
            items: seed.items,
            base_index: 0,
            forward_token: seed.forward_page_token,
            backward_token: seed.backward_page_token,
            presentation_token: seed.page_token,
            has_first_item: false,
            has_last_item: false,
            forward_abandoned: false,
            backward_abandoned: false,
            backward_seeded,
            backward_spliced: false,
            viewport: None,
            changes: Vec::new(),
            detached: false,
        }
    }

    pub fn list_id(&self) -> &ListId {
        &self.list_id
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    /// Absolute index of `items[0]`; goes negative as backward pages arrive.
    pub fn base_index(&self) -> i64 {
        self.base_index
    }

    pub fn presentation_token(&self) -> &PageToken {
        &self.presentation_token
    }

    pub fn frontier_token(&self, direction: Direction) -> Option<&PageToken> {
        match direction {
            Direction::Forward => self.forward_token.as_ref(),
            Direction::Backward => self.backward_token.as_ref(),
        }
    }

    /// An open frontier has a token and may still grow.
    pub fn is_open(&self, direction: Direction) -> bool {
        self.frontier_token(direction).is_some()
    }

    /// Abandoned frontiers keep their token for diagnostics but are never
    /// fetched again until the list is re-bound.
    pub fn is_abandoned(&self, direction: Direction) -> bool {
        match direction {
            Direction::Forward => self.forward_abandoned,
            Direction::Backward => self.backward_abandoned,
        }
    }

    pub(crate) fn abandon(&mut self, direction: Direction) {
        match direction {
            Direction::Forward => self.forward_abandoned = true,
            Direction::Backward => self.backward_abandoned = true,
        }
    }

    pub(crate) fn set_viewport(&mut self, first: i64, last: i64) {
        self.viewport = Some((first, last));
    }

    /// Last reported visible range in virtual indices. With no report yet
    /// the whole loaded range counts as visible.
    pub(crate) fn visible_range(&self) -> (i64, i64) {
        match self.viewport {
            Some(range) => range,
            None => (
                self.base_index,
                self.base_index + self.items.len() as i64 - 1,
            ),
        }
    }

    /// Extend one frontier with an accepted page.
    ///
    /// Returns the number of items spliced in. The caller guarantees `items`
    /// is non-empty; zero-item responses are failed attempts, not splices.
    pub(crate) fn splice(
        &mut self,
        direction: Direction,
        items: Vec<Value>,
        next_token: Option<PageToken>,
    ) -> usize {
        let count = items.len();
        debug_assert!(count > 0, "zero-item splice");
        match direction {
            Direction::Forward => {
                self.items.extend(items);
                self.forward_token = next_token;
                self.changes.push(ListChange::Appended { count });
            }
            Direction::Backward => {
                self.items.splice(0..0, items);
                self.base_index -= count as i64;
                self.backward_token = next_token;
                self.backward_spliced = true;
                self.changes.push(ListChange::Prepended { count });
            }
        }
        count
    }

    /// Whether a correlation-less envelope carrying `token` may act as the
    /// pre-registered first backward page: the list was seeded without a
    /// backward token, nothing has extended backward yet, and the token is
    /// the seed's distinguished cursor.
    pub(crate) fn accepts_unsolicited_backward(&self, token: &PageToken) -> bool {
        !self.backward_seeded && !self.backward_spliced && *token == self.presentation_token
    }

    pub(crate) fn take_changes(&mut self) -> Vec<ListChange> {
        std::mem::take(&mut self.changes)
    }

    pub(crate) fn set_sentinels(&mut self, has_first_item: bool, has_last_item: bool) {
        self.has_first_item = has_first_item;
        self.has_last_item = has_last_item;
    }

    pub fn has_first_item(&self) -> bool {
        self.has_first_item
    }

    pub fn has_last_item(&self) -> bool {
        self.has_last_item
    }

    /// Number of container children, sentinels included.
    pub fn child_count(&self) -> usize {
        self.items.len()
            + usize::from(self.has_first_item)
            + usize::from(self.has_last_item)
    }

    pub fn child_at(&self, position: usize) -> Option<Child<'_>> {
        let first_offset = usize::from(self.has_first_item);
        if self.has_first_item && position == 0 {
            return Some(Child::First);
        }
        let index = position - first_offset;
        if index < self.items.len() {
            return Some(Child::Item(&self.items[index]));
        }
        if self.has_last_item && index == self.items.len() {
            return Some(Child::Last);
        }
        None
    }

    pub(crate) fn detach(&mut self) {
        self.detached = true;
        self.forward_abandoned = false;
        self.backward_abandoned = false;
        self.viewport = None;
    }

    pub(crate) fn reattach(&mut self) -> bool {
        let was_detached = self.detached;
        self.detached = false;
        was_detached
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::core::Seed;

    fn seeded(items: Vec<Value>, forward: Option<&str>, backward: Option<&str>) -> ListState {
        ListState::from_seed(Seed {
            source_type: "dynamicTokenList".to_string(),
            list_id: ListId::parse("vQdpOESlok").unwrap(),
            page_token: PageToken::parse("pageToken").unwrap(),
            forward_page_token: forward.map(|t| PageToken::parse(t).unwrap()),
            backward_page_token: backward.map(|t| PageToken::parse(t).unwrap()),
            items,
        })
    }

    #[test]
    fn forward_splice_keeps_base_index() {
        let mut list = seeded(vec![json!(10), json!(11)], Some("fwd"), None);
        let count = list.splice(
            Direction::Forward,
            vec![json!(12), json!(13)],
            Some(PageToken::parse("fwd1").unwrap()),
        );
        assert_eq!(count, 2);
        assert_eq!(list.base_index(), 0);
        assert_eq!(list.items().len(), 4);
        assert_eq!(list.frontier_token(Direction::Forward).unwrap().as_str(), "fwd1");
        assert_eq!(list.take_changes(), vec![ListChange::Appended { count: 2 }]);
    }

    #[test]
    fn backward_splice_shifts_base_index() {
        let mut list = seeded(vec![json!(10)], None, Some("back"));
        list.splice(Direction::Backward, vec![json!(8), json!(9)], None);
        assert_eq!(list.base_index(), -2);
        assert_eq!(list.items()[0], json!(8));
        assert_eq!(list.items()[2], json!(10));
        assert!(!list.is_open(Direction::Backward));
        assert_eq!(list.take_changes(), vec![ListChange::Prepended { count: 2 }]);
    }

    #[test]
    fn child_view_places_sentinels_at_ends() {
        let mut list = seeded(vec![json!(10), json!(11)], None, None);
        list.set_sentinels(true, true);
        assert_eq!(list.child_count(), 4);
        assert!(matches!(list.child_at(0), Some(Child::First)));
        assert!(matches!(list.child_at(1), Some(Child::Item(v)) if *v == json!(10)));
        assert!(matches!(list.child_at(3), Some(Child::Last)));
        assert!(list.child_at(4).is_none());
    }

    #[test]
    fn unsolicited_backward_requires_unseeded_untouched_frontier() {
        let seed_cursor = PageToken::parse("pageToken").unwrap();

        let list = seeded(vec![json!(10)], Some("fwd"), None);
        assert!(list.accepts_unsolicited_backward(&seed_cursor));
        assert!(!list.accepts_unsolicited_backward(&PageToken::parse("other").unwrap()));

        let seeded_backward = seeded(vec![json!(10)], None, Some("back"));
        assert!(!seeded_backward.accepts_unsolicited_backward(&seed_cursor));

        let mut spliced = seeded(vec![json!(10)], Some("fwd"), None);
        spliced.splice(Direction::Backward, vec![json!(9)], None);
        assert!(!spliced.accepts_unsolicited_backward(&seed_cursor));
    }

    #[test]
    fn detach_clears_abandonment_and_viewport() {
        let mut list = seeded(vec![json!(10)], Some("fwd"), None);
        list.abandon(Direction::Forward);
        list.set_viewport(0, 0);
        list.detach();
        assert!(!list.is_abandoned(Direction::Forward));
        assert!(list.reattach());
        assert!(!list.reattach());
    }
}
