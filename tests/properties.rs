//! Property tests for corpus-wide invariants.
//!
//! Generated values never contain `|` or `^`, since a delimiter inside a
//! written value changes the positions of everything after it.

use hl7_edit_rs::record::COMPONENT_DELIMITER;
use hl7_edit_rs::{
    AddressCatalog, EditAction, EditGroup, EditOperation, FieldAddress, FilterPredicate, Message,
    Segment, apply_groups, join_messages, message_matches, predicate_holds, split_messages,
};
use proptest::prelude::*;

const SEGMENT_TYPES: &[&str] = &["PID", "OBX", "ZZZ"];

fn arb_segment_type() -> impl Strategy<Value = String> {
    prop::sample::select(SEGMENT_TYPES).prop_map(|s| s.to_string())
}

fn arb_value() -> impl Strategy<Value = String> {
    "[A-C]{0,2}"
}

fn arb_field() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_value(), 1..=3).prop_map(|comps| comps.join("^"))
}

fn arb_line() -> impl Strategy<Value = String> {
    (arb_segment_type(), prop::collection::vec(arb_field(), 0..6)).prop_map(|(seg, fields)| {
        let mut line = seg;
        for f in fields {
            line.push('|');
            line.push_str(&f);
        }
        line
    })
}

fn arb_message() -> impl Strategy<Value = Message> {
    prop::collection::vec(arb_line(), 0..6).prop_map(|lines| {
        let mut text = "MSH|X".to_string();
        for line in lines {
            text.push('\n');
            text.push_str(&line);
        }
        Message::new(text)
    })
}

fn arb_corpus() -> impl Strategy<Value = Vec<Message>> {
    prop::collection::vec(arb_message(), 0..6)
}

fn arb_address() -> impl Strategy<Value = FieldAddress> {
    (1usize..7, prop::option::of(1usize..4)).prop_map(|(f, c)| FieldAddress::new(f, c).unwrap())
}

fn arb_filter() -> impl Strategy<Value = FilterPredicate> {
    (arb_segment_type(), arb_address(), arb_value())
        .prop_map(|(seg, addr, value)| FilterPredicate::new(seg, addr, value))
}

fn arb_edit() -> impl Strategy<Value = EditOperation> {
    (arb_segment_type(), arb_address(), prop::option::of(arb_value())).prop_map(
        |(seg, addr, value)| {
            let action = match value {
                Some(v) => EditAction::Set(v),
                None => EditAction::Clear,
            };
            EditOperation::new(seg, addr, action)
        },
    )
}

fn arb_group() -> impl Strategy<Value = EditGroup> {
    (
        prop::collection::vec(arb_filter(), 1..4),
        prop::collection::vec(arb_edit(), 1..4),
    )
        .prop_map(|(filters, edits)| EditGroup::new(filters, edits).unwrap())
}

/// Does `addr` occur on some `seg` line, by the catalog's own rule?
fn occurs(corpus: &[Message], seg: &str, addr: FieldAddress) -> bool {
    corpus
        .iter()
        .flat_map(|m| m.segments())
        .filter(|s| s.segment_type() == seg)
        .any(|s| match (s.field(addr.field_index()), addr.component_index()) {
            (Some(field), None) => !field.contains(COMPONENT_DELIMITER),
            (Some(field), Some(c)) => {
                field.contains(COMPONENT_DELIMITER) && field.split(COMPONENT_DELIMITER).count() >= c
            }
            (None, _) => false,
        })
}

proptest! {
    #[test]
    fn prop_single_group_is_idempotent(corpus in arb_corpus(), group in arb_group()) {
        let groups = [group];
        let once = apply_groups(&corpus, &groups);
        let twice = apply_groups(&once, &groups);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_apply_preserves_shape(corpus in arb_corpus(), groups in prop::collection::vec(arb_group(), 0..3)) {
        let edited = apply_groups(&corpus, &groups);
        prop_assert_eq!(edited.len(), corpus.len());
        for (before, after) in corpus.iter().zip(&edited) {
            prop_assert_eq!(before.line_count(), after.line_count());
        }
    }

    #[test]
    fn prop_untargeted_lines_are_untouched(corpus in arb_corpus(), group in arb_group()) {
        let edited = apply_groups(&corpus, std::slice::from_ref(&group));
        for (before, after) in corpus.iter().zip(&edited) {
            for (b, a) in before.lines().zip(after.lines()) {
                let seg = Segment::parse(b).segment_type();
                let applies = group.filters_for(seg).next().is_some()
                    && group.edits_for(seg).next().is_some();
                if !applies {
                    prop_assert_eq!(b, a);
                }
            }
        }
    }

    #[test]
    fn prop_catalog_is_complete_and_exact(corpus in arb_corpus()) {
        let catalog = AddressCatalog::build(&corpus);

        for seg in corpus.iter().flat_map(|m| m.segments()) {
            for (i, field) in seg.fields().iter().enumerate().skip(1) {
                if field.contains(COMPONENT_DELIMITER) {
                    for c in 1..=field.split(COMPONENT_DELIMITER).count() {
                        prop_assert!(catalog.contains(seg.segment_type(), FieldAddress::new(i, Some(c)).unwrap()));
                    }
                } else {
                    prop_assert!(catalog.contains(seg.segment_type(), FieldAddress::new(i, None).unwrap()));
                }
            }
        }

        for (seg, addrs) in catalog.iter() {
            for addr in addrs {
                prop_assert!(occurs(&corpus, seg, *addr), "{}.{} not in corpus", seg, addr);
            }
        }
    }

    #[test]
    fn prop_extra_filter_never_grows_matches(
        corpus in arb_corpus(),
        filters in prop::collection::vec(arb_filter(), 1..4),
        extra in arb_filter(),
    ) {
        let mut narrowed = filters.clone();
        narrowed.push(extra);
        for msg in &corpus {
            if message_matches(msg, &narrowed).matched {
                prop_assert!(message_matches(msg, &filters).matched);
            }
        }
    }

    #[test]
    fn prop_out_of_range_field_never_matches(line in arb_line(), value in arb_value(), extra in 1usize..5) {
        let seg = Segment::parse(&line);
        let addr = FieldAddress::new(seg.field_count() + extra, None).unwrap();
        let filter = FilterPredicate::new(seg.segment_type(), addr, value);
        prop_assert!(!predicate_holds(&seg, &filter));
    }

    #[test]
    fn prop_split_join_round_trip(corpus in arb_corpus()) {
        let text = join_messages(&corpus);
        prop_assert_eq!(join_messages(&split_messages(&text)), text.as_str());

        let carriage = text.replace('\n', "\r");
        prop_assert_eq!(split_messages(&carriage), corpus);
    }
}
