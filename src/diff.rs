//! Field-level change highlighting between a message and its edited copy.
//!
//! The highlighter returns byte ranges ("marks") rather than styled text. A
//! caller can render them however it likes; [`Highlight::render`] wraps them
//! in plain-text markers for terminals and snapshots.

use std::ops::Range;

use serde::Serialize;

use crate::record::{COMPONENT_DELIMITER, FIELD_DELIMITER, LINE_SEPARATOR, is_blank};
use crate::{EditOperation, FieldAddress, Message, Segment};

/// One changed span on one side of a preview pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mark {
    /// 0-based line index within the message, blank lines included.
    pub line: usize,
    pub segment_type: String,
    pub address: FieldAddress,
    /// Byte range within the line.
    pub start: usize,
    pub end: usize,
}

impl Mark {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Old-value spans of the before message and new-value spans of the after
/// message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Highlight {
    pub removed: Vec<Mark>,
    pub added: Vec<Mark>,
}

/// Text wrapped around marked spans by [`Highlight::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Markers<'a> {
    pub removed_open: &'a str,
    pub removed_close: &'a str,
    pub added_open: &'a str,
    pub added_close: &'a str,
}

impl Default for Markers<'_> {
    fn default() -> Self {
        Markers {
            removed_open: "[-",
            removed_close: "-]",
            added_open: "{+",
            added_close: "+}",
        }
    }
}

impl Highlight {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }

    /// Render both sides with `markers` around each changed span.
    pub fn render(
        &self,
        before: &Message,
        after: &Message,
        markers: &Markers<'_>,
    ) -> (String, String) {
        (
            render_marks(
                before,
                &self.removed,
                markers.removed_open,
                markers.removed_close,
            ),
            render_marks(after, &self.added, markers.added_open, markers.added_close),
        )
    }
}

/// Find the spans that changed between `before` and `after`.
///
/// Only line pairs that differ and whose before-line has a segment type
/// named in `edits` are examined. For each such edit, the address is marked
/// on both sides when it resolves on both and its value differs. Lines past
/// the shorter message are ignored.
pub fn highlight(before: &Message, after: &Message, edits: &[EditOperation]) -> Highlight {
    let mut out = Highlight::default();

    for (i, (b_line, a_line)) in before.lines().zip(after.lines()).enumerate() {
        if b_line == a_line || is_blank(b_line) {
            continue;
        }
        let seg_type = Segment::parse(b_line).segment_type();

        let mut removed = Vec::new();
        let mut added = Vec::new();
        for edit in edits.iter().filter(|e| e.segment_type == seg_type) {
            let (Some(b), Some(a)) = (
                span_of(b_line, edit.address),
                span_of(a_line, edit.address),
            ) else {
                continue;
            };
            if b_line[b.clone()] == a_line[a.clone()] {
                continue;
            }
            removed.push(mark(i, seg_type, edit.address, b));
            added.push(mark(i, seg_type, edit.address, a));
        }

        out.removed.extend(disjoint(removed));
        out.added.extend(disjoint(added));
    }

    out
}

fn mark(line: usize, seg_type: &str, address: FieldAddress, range: Range<usize>) -> Mark {
    Mark {
        line,
        segment_type: seg_type.to_string(),
        address,
        start: range.start,
        end: range.end,
    }
}

/// Drop duplicate marks and marks nested inside a wider one, so that
/// rendering never has to interleave markers.
fn disjoint(mut marks: Vec<Mark>) -> Vec<Mark> {
    marks.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
    let mut kept: Vec<Mark> = Vec::with_capacity(marks.len());
    for m in marks {
        match kept.last() {
            Some(last) if m.start < last.end || (m.start == last.start && m.end == last.end) => {}
            _ => kept.push(m),
        }
    }
    kept
}

/// Byte range of an address within a raw line, if it exists there.
pub fn span_of(line: &str, addr: FieldAddress) -> Option<Range<usize>> {
    let (start, field) = nth_piece(line, FIELD_DELIMITER, addr.field_index())?;
    match addr.component_index() {
        None => Some(start..start + field.len()),
        Some(c) => {
            let (offset, comp) = nth_piece(field, COMPONENT_DELIMITER, c - 1)?;
            let start = start + offset;
            Some(start..start + comp.len())
        }
    }
}

fn nth_piece<'a>(text: &'a str, delim: &str, n: usize) -> Option<(usize, &'a str)> {
    let mut offset = 0;
    for (i, piece) in text.split(delim).enumerate() {
        if i == n {
            return Some((offset, piece));
        }
        offset += piece.len() + delim.len();
    }
    None
}

/// Wrap each marked span of `message` in `open`/`close`.
///
/// Marks must be disjoint within a line, as produced by [`highlight`].
pub fn render_marks(message: &Message, marks: &[Mark], open: &str, close: &str) -> String {
    let mut out = String::with_capacity(message.as_str().len());

    for (i, line) in message.lines().enumerate() {
        if i > 0 {
            out.push(LINE_SEPARATOR);
        }
        let mut line_marks: Vec<&Mark> = marks.iter().filter(|m| m.line == i).collect();
        line_marks.sort_by_key(|m| m.start);

        let mut pos = 0;
        for m in line_marks {
            if m.start < pos || m.end > line.len() {
                continue;
            }
            out.push_str(&line[pos..m.start]);
            out.push_str(open);
            out.push_str(&line[m.range()]);
            out.push_str(close);
            pos = m.end;
        }
        out.push_str(&line[pos..]);
    }

    out
}
