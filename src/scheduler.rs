//! Fetch scheduling policy.
//!
//! Decides which frontiers to extend from viewport hints and frontier state.
//! The provider layers the one-pending-per-direction rule on top.

use crate::core::Direction;
use crate::list::ListState;

/// Frontiers fetched as soon as a list is bound, in dispatch order.
///
/// A non-empty seed fetches every open frontier, forward first. An empty
/// seed has no anchor item yet, so only one direction is fetched; the other
/// is picked up by re-evaluation after the first splice.
pub(crate) fn creation_fetches(list: &ListState) -> Vec<Direction> {
    if list.items().is_empty() {
        if list.is_open(Direction::Forward) {
            vec![Direction::Forward]
        } else if list.is_open(Direction::Backward) {
            vec![Direction::Backward]
        } else {
            Vec::new()
        }
    } else {
        [Direction::Forward, Direction::Backward]
            .into_iter()
            .filter(|direction| list.is_open(*direction))
            .collect()
    }
}

/// The visible range is within `cache_chunk_size` items of the given end.
pub(crate) fn near_end(list: &ListState, direction: Direction, cache_chunk_size: usize) -> bool {
    if list.items().is_empty() {
        return true;
    }
    let (first_visible, last_visible) = list.visible_range();
    let chunk = cache_chunk_size as i64;
    match direction {
        Direction::Forward => {
            let end = list.base_index() + list.items().len() as i64 - 1;
            end - last_visible <= chunk
        }
        Direction::Backward => first_visible - list.base_index() <= chunk,
    }
}

/// Fetch-worthiness of a frontier, ignoring whether one is already pending.
pub(crate) fn wants_fetch(list: &ListState, direction: Direction, cache_chunk_size: usize) -> bool {
    list.is_open(direction)
        && !list.is_abandoned(direction)
        && near_end(list, direction, cache_chunk_size)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::core::{ListId, PageToken, Seed};

    fn list(
        items: usize,
        forward: Option<&str>,
        backward: Option<&str>,
        viewport: Option<(i64, i64)>,
    ) -> ListState {
        let mut state = ListState::from_seed(Seed {
            source_type: "dynamicTokenList".to_string(),
            list_id: ListId::parse("vQdpOESlok").unwrap(),
            page_token: PageToken::parse("pageToken").unwrap(),
            forward_page_token: forward.map(|t| PageToken::parse(t).unwrap()),
            backward_page_token: backward.map(|t| PageToken::parse(t).unwrap()),
            items: (0..items).map(|i| json!(i)).collect(),
        });
        if let Some((first, last)) = viewport {
            state.set_viewport(first, last);
        }
        state
    }

    #[test]
    fn creation_fetches_forward_then_backward() {
        let both = list(5, Some("fwd"), Some("back"), None);
        assert_eq!(
            creation_fetches(&both),
            vec![Direction::Forward, Direction::Backward]
        );

        let forward_only = list(5, Some("fwd"), None, None);
        assert_eq!(creation_fetches(&forward_only), vec![Direction::Forward]);
    }

    #[test]
    fn empty_seed_fetches_one_direction_only() {
        let both = list(0, Some("fwd"), Some("back"), None);
        assert_eq!(creation_fetches(&both), vec![Direction::Forward]);

        let backward_only = list(0, None, Some("back"), None);
        assert_eq!(creation_fetches(&backward_only), vec![Direction::Backward]);

        assert!(creation_fetches(&list(0, None, None, None)).is_empty());
    }

    #[test]
    fn near_end_uses_viewport_distance() {
        // 26 items at base 0 (indices 0..=25), chunk 10.
        let far_forward = list(26, Some("fwd"), Some("back"), Some((5, 7)));
        assert!(!near_end(&far_forward, Direction::Forward, 10));
        assert!(near_end(&far_forward, Direction::Backward, 10));

        let near_forward = list(26, Some("fwd"), Some("back"), Some((20, 25)));
        assert!(near_end(&near_forward, Direction::Forward, 10));
        assert!(!near_end(&near_forward, Direction::Backward, 9));
    }

    #[test]
    fn no_viewport_treats_loaded_range_as_visible() {
        let small = list(5, Some("fwd"), Some("back"), None);
        assert!(near_end(&small, Direction::Forward, 10));
        assert!(near_end(&small, Direction::Backward, 10));
    }

    #[test]
    fn wants_fetch_respects_closed_and_abandoned() {
        let closed = list(3, None, None, None);
        assert!(!wants_fetch(&closed, Direction::Forward, 10));

        let mut abandoned = list(3, Some("fwd"), None, None);
        abandoned.abandon(Direction::Forward);
        assert!(!wants_fetch(&abandoned, Direction::Forward, 10));

        let open = list(3, Some("fwd"), None, None);
        assert!(wants_fetch(&open, Direction::Forward, 10));
    }
}
