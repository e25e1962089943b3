//! Record model: messages, segment lines, fields and components.
//!
//! All splitting is plain fixed-delimiter splitting. There is no escape
//! handling, so a literal `|` or `^` inside data is indistinguishable from
//! a structural delimiter.

use serde::Serialize;

use crate::FieldAddress;

/// Separator between segment lines once input has been normalised.
pub const LINE_SEPARATOR: char = '\n';
/// Separator between fields of a segment line.
pub const FIELD_DELIMITER: &str = "|";
/// Separator between components of a field.
pub const COMPONENT_DELIMITER: &str = "^";

/// One message: an ordered run of segment lines.
///
/// A `Message` is never edited in place. The applier derives a new value so
/// that the original and the edited message can be compared side by side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Message(String);

impl Message {
    pub fn new(text: impl Into<String>) -> Self {
        Message(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// All lines, blank ones included, in their original positions.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.0.split(LINE_SEPARATOR)
    }

    pub fn line_count(&self) -> usize {
        self.lines().count()
    }

    /// Parsed segments for every non-blank line.
    pub fn segments(&self) -> impl Iterator<Item = Segment<'_>> {
        self.lines()
            .filter(|line| !is_blank(line))
            .map(Segment::parse)
    }
}

impl AsRef<str> for Message {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Blank lines keep their position in a message but are never addressed.
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Split a field into its components. A field without `^` is one component.
pub fn components(field: &str) -> Vec<&str> {
    field.split(COMPONENT_DELIMITER).collect()
}

/// A borrowed view of one segment line split into fields.
///
/// Index 0 holds the segment type code; addressable fields start at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    fields: Vec<&'a str>,
}

impl<'a> Segment<'a> {
    pub fn parse(line: &'a str) -> Self {
        Segment {
            fields: line.split(FIELD_DELIMITER).collect(),
        }
    }

    pub fn segment_type(&self) -> &'a str {
        self.fields[0]
    }

    /// Raw split, including the type code at index 0.
    pub fn fields(&self) -> &[&'a str] {
        &self.fields
    }

    /// Number of addressable fields (the type code is not counted).
    pub fn field_count(&self) -> usize {
        self.fields.len() - 1
    }

    /// Field `index` (1-based), or `None` when the line is too short.
    pub fn field(&self, index: usize) -> Option<&'a str> {
        if index == 0 {
            return None;
        }
        self.fields.get(index).copied()
    }

    /// Resolve an address strictly: `None` if the field or the component
    /// does not exist in this occurrence.
    pub fn resolve(&self, addr: FieldAddress) -> Option<&'a str> {
        let value = self.field(addr.field_index())?;
        match addr.component_index() {
            None => Some(value),
            Some(c) => value.split(COMPONENT_DELIMITER).nth(c - 1),
        }
    }
}
