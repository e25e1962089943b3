//! Message-level filter satisfaction.
//!
//! A message satisfies a filter list when, for every segment type the list
//! mentions, at least one line of that type satisfies all of that type's
//! predicates. Each segment type is checked on its own: a match on one type
//! never covers for a missing match on another.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::predicate::line_matches;
use crate::{EditGroup, FilterPredicate, Message, Segment};

/// Outcome of checking one message against one filter list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterMatch {
    pub matched: bool,
    /// For each referenced segment type, the 0-based ordinal (among lines of
    /// that type) of the first line that satisfied its predicates. Empty when
    /// the message does not match.
    pub lines: BTreeMap<String, usize>,
}

impl FilterMatch {
    fn rejected() -> Self {
        FilterMatch::default()
    }
}

/// Check one message against a filter list.
pub fn message_matches(message: &Message, filters: &[FilterPredicate]) -> FilterMatch {
    let mut by_type: HashMap<&str, Vec<Segment<'_>>> = HashMap::new();
    for seg in message.segments() {
        by_type.entry(seg.segment_type()).or_default().push(seg);
    }

    // keep the order in which segment types first appear in the filters
    let mut wanted: Vec<(&str, Vec<&FilterPredicate>)> = Vec::new();
    for f in filters {
        match wanted.iter_mut().find(|(seg, _)| *seg == f.segment_type) {
            Some((_, preds)) => preds.push(f),
            None => wanted.push((f.segment_type.as_str(), vec![f])),
        }
    }

    let mut lines = BTreeMap::new();
    for (seg_type, preds) in wanted {
        let candidates = by_type.get(seg_type).map(Vec::as_slice).unwrap_or(&[]);
        let hit = candidates
            .iter()
            .position(|seg| line_matches(seg, preds.iter().copied()));
        match hit {
            Some(ordinal) => {
                lines.insert(seg_type.to_string(), ordinal);
            }
            None => return FilterMatch::rejected(),
        }
    }

    FilterMatch {
        matched: true,
        lines,
    }
}

/// Check one message against a group's filters.
pub fn group_matches(message: &Message, group: &EditGroup) -> FilterMatch {
    message_matches(message, group.filters())
}

/// A message that satisfied every group, with the per-group details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageMatch {
    /// Position of the message in the corpus.
    pub index: usize,
    /// One entry per group, in group order.
    pub groups: Vec<FilterMatch>,
}

/// Messages that satisfy the filters of all `groups`, in corpus order.
///
/// With no groups every message qualifies.
pub fn select_matching(messages: &[Message], groups: &[EditGroup]) -> Vec<MessageMatch> {
    let selected: Vec<MessageMatch> = messages
        .iter()
        .enumerate()
        .filter_map(|(index, msg)| {
            let mut results = Vec::with_capacity(groups.len());
            for group in groups {
                let m = group_matches(msg, group);
                if !m.matched {
                    return None;
                }
                results.push(m);
            }
            Some(MessageMatch {
                index,
                groups: results,
            })
        })
        .collect();

    debug!(
        messages = messages.len(),
        groups = groups.len(),
        selected = selected.len(),
        "selected matching messages"
    );
    selected
}
