//! Per-line predicate evaluation.

use crate::{FilterPredicate, Segment};

/// Does one predicate hold on this line?
///
/// An out-of-range field or component never matches.
pub fn predicate_holds(segment: &Segment<'_>, predicate: &FilterPredicate) -> bool {
    segment.resolve(predicate.address) == Some(predicate.expected.as_str())
}

/// Conjunction of `predicates` over one line, stopping at the first failure.
///
/// Callers pass only the predicates for this line's segment type; the
/// segment type itself is not checked here.
pub fn line_matches<'p, I>(segment: &Segment<'_>, predicates: I) -> bool
where
    I: IntoIterator<Item = &'p FilterPredicate>,
{
    predicates
        .into_iter()
        .all(|p| predicate_holds(segment, p))
}
