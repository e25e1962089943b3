//! Bulk edit application.
//!
//! Groups are applied line by line. For each line, a group takes part only if
//! it has both filters and edits for that line's segment type; its filters are
//! then checked against that line alone. Matching groups apply their edits in
//! order, and a later group sees the line as already rewritten by an earlier
//! one. Lines no group touches are copied through unchanged.
//!
//! A group whose filters name one segment type and whose edits name another
//! therefore never fires: the filters and edits must meet on the same line.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::predicate::line_matches;
use crate::record::{COMPONENT_DELIMITER, FIELD_DELIMITER, LINE_SEPARATOR, is_blank};
use crate::{EditGroup, EditOperation, Message, Segment};

/// Apply `groups` to every message, returning a corpus of the same length
/// and order. The input is left untouched.
///
/// Messages are independent, so they are processed in parallel.
pub fn apply_groups(messages: &[Message], groups: &[EditGroup]) -> Vec<Message> {
    let results: Vec<(Message, usize)> = messages
        .par_iter()
        .map(|msg| rewrite_message(msg, groups))
        .collect();

    let lines_changed: usize = results.iter().map(|(_, n)| n).sum();
    info!(
        messages = messages.len(),
        groups = groups.len(),
        lines_changed,
        "applied edit groups"
    );

    results.into_iter().map(|(msg, _)| msg).collect()
}

/// Apply `groups` to a single message.
pub fn apply_to_message(message: &Message, groups: &[EditGroup]) -> Message {
    rewrite_message(message, groups).0
}

fn rewrite_message(message: &Message, groups: &[EditGroup]) -> (Message, usize) {
    let mut out = String::with_capacity(message.as_str().len());
    let mut changed = 0;

    for (i, line) in message.lines().enumerate() {
        if i > 0 {
            out.push(LINE_SEPARATOR);
        }
        match apply_to_line(line, groups) {
            Some(rewritten) => {
                if rewritten != line {
                    changed += 1;
                }
                out.push_str(&rewritten);
            }
            None => out.push_str(line),
        }
    }

    if changed > 0 {
        debug!(lines = changed, "message rewritten");
    }
    (Message::new(out), changed)
}

/// Run every group over one line. `None` means no group applied.
pub fn apply_to_line(line: &str, groups: &[EditGroup]) -> Option<String> {
    if is_blank(line) {
        return None;
    }

    let seg_type = Segment::parse(line).segment_type().to_string();
    let mut current: Option<String> = None;

    for group in groups {
        let mut filters = group.filters_for(&seg_type).peekable();
        let mut edits = group.edits_for(&seg_type).peekable();
        if filters.peek().is_none() || edits.peek().is_none() {
            continue;
        }

        let text = current.as_deref().unwrap_or(line);
        let segment = Segment::parse(text);
        if !line_matches(&segment, filters) {
            continue;
        }

        let mut fields: Vec<String> = segment.fields().iter().map(|f| f.to_string()).collect();
        for edit in edits {
            apply_edit(&mut fields, edit);
        }
        current = Some(fields.join(FIELD_DELIMITER));
    }

    current
}

/// Write one edit into a split line. A field beyond the end of the line is
/// left alone; a missing component is created by padding with empties.
fn apply_edit(fields: &mut [String], edit: &EditOperation) {
    let Some(field) = fields.get_mut(edit.address.field_index()) else {
        return;
    };
    let value = edit.action.value();

    match edit.address.component_index() {
        None => *field = value.to_string(),
        Some(c) => {
            let mut comps: Vec<&str> = field.split(COMPONENT_DELIMITER).collect();
            if comps.len() < c {
                comps.resize(c, "");
            }
            comps[c - 1] = value;
            let joined = comps.join(COMPONENT_DELIMITER);
            *field = joined;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EditAction, FieldAddress, FilterPredicate};

    const SAMPLE: &str = "HDR|A\nPID|1||999^^^MRN||SMITH^JANE\nOBX|1|TX|RESULT||POSITIVE";

    fn group(filters: Vec<FilterPredicate>, edits: Vec<EditOperation>) -> EditGroup {
        EditGroup::new(filters, edits).unwrap()
    }

    fn lines(msg: &Message) -> Vec<&str> {
        msg.lines().collect()
    }

    #[test]
    fn test_set_empty_field() {
        let g = group(
            vec![FilterPredicate::new("OBX", FieldAddress::field(3), "RESULT")],
            vec![EditOperation::set("OBX", FieldAddress::field(4), "NEGATIVE")],
        );
        let out = apply_groups(&[Message::new(SAMPLE)], &[g]);
        assert_eq!(
            lines(&out[0]),
            vec![
                "HDR|A",
                "PID|1||999^^^MRN||SMITH^JANE",
                "OBX|1|TX|RESULT|NEGATIVE|POSITIVE",
            ]
        );
    }

    #[test]
    fn test_clear_component() {
        let g = group(
            vec![FilterPredicate::new("PID", FieldAddress::field(1), "1")],
            vec![EditOperation::clear("PID", FieldAddress::component(5, 2))],
        );
        let out = apply_to_message(&Message::new(SAMPLE), &[g]);
        assert_eq!(lines(&out)[1], "PID|1||999^^^MRN||SMITH^");
    }

    #[test]
    fn test_component_padding() {
        let g = group(
            vec![FilterPredicate::new("PID", FieldAddress::field(1), "1")],
            vec![EditOperation::set("PID", FieldAddress::component(2, 3), "X")],
        );
        let out = apply_to_line("PID|1|A", &[g]).unwrap();
        assert_eq!(out, "PID|1|A^^X");
    }

    #[test]
    fn test_padding_to_largest_component() {
        let addr = FieldAddress::new(2, Some(crate::address::MAX_INDEX)).unwrap();
        let g = group(
            vec![FilterPredicate::new("PID", FieldAddress::field(1), "1")],
            vec![EditOperation::set("PID", addr, "X")],
        );
        let out = apply_to_line("PID|1|A", &[g]).unwrap();
        let field = out.split('|').nth(2).unwrap();
        assert_eq!(field.split('^').count(), crate::address::MAX_INDEX);
        assert!(field.starts_with("A^^") && field.ends_with("^X"));
    }

    #[test]
    fn test_out_of_range_field_is_noop() {
        let g = group(
            vec![FilterPredicate::new("PID", FieldAddress::field(1), "1")],
            vec![EditOperation::set("PID", FieldAddress::field(9), "X")],
        );
        let out = apply_to_message(&Message::new(SAMPLE), &[g]);
        assert_eq!(out.as_str(), SAMPLE);
    }

    #[test]
    fn test_groups_are_cumulative() {
        let first = group(
            vec![FilterPredicate::new("OBX", FieldAddress::field(5), "POSITIVE")],
            vec![EditOperation::set("OBX", FieldAddress::field(5), "NEGATIVE")],
        );
        // only matches after the first group rewrote field 5
        let second = group(
            vec![FilterPredicate::new("OBX", FieldAddress::field(5), "NEGATIVE")],
            vec![EditOperation::set("OBX", FieldAddress::field(4), "CHECKED")],
        );
        let out = apply_to_line("OBX|1|TX|RESULT||POSITIVE", &[first, second]).unwrap();
        assert_eq!(out, "OBX|1|TX|RESULT|CHECKED|NEGATIVE");
    }

    #[test]
    fn test_edits_need_filter_on_same_segment_type() {
        let g = group(
            vec![FilterPredicate::new("PID", FieldAddress::field(1), "1")],
            vec![EditOperation::set("OBX", FieldAddress::field(4), "X")],
        );
        let out = apply_to_message(&Message::new(SAMPLE), &[g]);
        assert_eq!(out.as_str(), SAMPLE);
    }

    #[test]
    fn test_every_matching_line_is_edited() {
        let msg = Message::new("MSH|1\nOBX|1|A\nOBX|2|A\nOBX|3|B");
        let g = group(
            vec![FilterPredicate::new("OBX", FieldAddress::field(2), "A")],
            vec![EditOperation::set("OBX", FieldAddress::field(2), "Z")],
        );
        let out = apply_to_message(&msg, &[g]);
        assert_eq!(out.as_str(), "MSH|1\nOBX|1|Z\nOBX|2|Z\nOBX|3|B");
    }

    #[test]
    fn test_blank_lines_pass_through() {
        let msg = Message::new("MSH|1\n\nOBX|1|A\n  ");
        let g = group(
            vec![FilterPredicate::new("OBX", FieldAddress::field(1), "1")],
            vec![EditOperation::new(
                "OBX",
                FieldAddress::field(2),
                EditAction::Set("B".to_string()),
            )],
        );
        let out = apply_to_message(&msg, &[g]);
        assert_eq!(out.as_str(), "MSH|1\n\nOBX|1|B\n  ");
    }

    #[test]
    fn test_literal_delete_value_is_written() {
        let g = group(
            vec![FilterPredicate::new("OBX", FieldAddress::field(1), "1")],
            vec![EditOperation::set("OBX", FieldAddress::field(2), "DELETE")],
        );
        assert_eq!(apply_to_line("OBX|1|A", &[g]).unwrap(), "OBX|1|DELETE");
    }

    #[test]
    fn test_input_corpus_untouched_and_order_kept() {
        let corpus = vec![
            Message::new("MSH|1\nOBX|1|A"),
            Message::new("MSH|2\nOBX|1|B"),
            Message::new("MSH|3\nOBX|1|A"),
        ];
        let snapshot = corpus.clone();
        let g = group(
            vec![FilterPredicate::new("OBX", FieldAddress::field(2), "A")],
            vec![EditOperation::clear("OBX", FieldAddress::field(2))],
        );
        let out = apply_groups(&corpus, &[g]);
        assert_eq!(corpus, snapshot);
        let texts: Vec<&str> = out.iter().map(|m| m.as_str()).collect();
        assert_eq!(texts, vec!["MSH|1\nOBX|1|", "MSH|2\nOBX|1|B", "MSH|3\nOBX|1|"]);
    }
}
