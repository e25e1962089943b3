//! Filter predicates, edit operations and edit groups.

use std::fmt;

use crate::{FieldAddress, RuleError};

/// Exact-match condition on one address of one segment type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterPredicate {
    pub segment_type: String,
    pub address: FieldAddress,
    pub expected: String,
}

impl FilterPredicate {
    pub fn new(
        segment_type: impl Into<String>,
        address: FieldAddress,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            segment_type: segment_type.into(),
            address,
            expected: expected.into(),
        }
    }
}

impl fmt::Display for FilterPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} = {}",
            self.segment_type,
            self.address,
            delimited(&self.expected)
        )
    }
}

/// What an edit writes at its address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EditAction {
    /// Write this exact value.
    Set(String),
    /// Clear the addressed value to the empty string.
    Clear,
}

impl EditAction {
    /// Interpret operator-typed text, where `DELETE` in any case means clear.
    ///
    /// Only for free-text input. Rule files and API callers pick the variant
    /// explicitly, so a literal value reading "delete" stays writable.
    pub fn from_input(text: &str) -> Self {
        if text.eq_ignore_ascii_case("delete") {
            EditAction::Clear
        } else {
            EditAction::Set(text.to_string())
        }
    }

    /// The string written into the line.
    pub fn value(&self) -> &str {
        match self {
            EditAction::Set(v) => v,
            EditAction::Clear => "",
        }
    }
}

/// Rewrite of one address of one segment type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EditOperation {
    pub segment_type: String,
    pub address: FieldAddress,
    pub action: EditAction,
}

impl EditOperation {
    pub fn new(segment_type: impl Into<String>, address: FieldAddress, action: EditAction) -> Self {
        Self {
            segment_type: segment_type.into(),
            address,
            action,
        }
    }

    pub fn set(
        segment_type: impl Into<String>,
        address: FieldAddress,
        value: impl Into<String>,
    ) -> Self {
        Self::new(segment_type, address, EditAction::Set(value.into()))
    }

    pub fn clear(segment_type: impl Into<String>, address: FieldAddress) -> Self {
        Self::new(segment_type, address, EditAction::Clear)
    }
}

impl fmt::Display for EditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.action {
            EditAction::Set(v) => write!(
                f,
                "{}.{} = {}",
                self.segment_type,
                self.address,
                delimited(v)
            ),
            EditAction::Clear => write!(f, "{}.{} CLEAR", self.segment_type, self.address),
        }
    }
}

/// A bundle of filters and the edits to apply where they hold.
///
/// Always has at least one filter and one edit; construction fails otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditGroup {
    name: Option<String>,
    filters: Vec<FilterPredicate>,
    edits: Vec<EditOperation>,
}

impl EditGroup {
    pub fn new(
        filters: Vec<FilterPredicate>,
        edits: Vec<EditOperation>,
    ) -> Result<Self, RuleError> {
        if filters.is_empty() {
            return Err(RuleError::NoFilters);
        }
        if edits.is_empty() {
            return Err(RuleError::NoEdits);
        }
        Ok(Self {
            name: None,
            filters,
            edits,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn filters(&self) -> &[FilterPredicate] {
        &self.filters
    }

    pub fn edits(&self) -> &[EditOperation] {
        &self.edits
    }

    /// Filters that target `segment_type`, in order.
    pub fn filters_for<'a>(
        &'a self,
        segment_type: &'a str,
    ) -> impl Iterator<Item = &'a FilterPredicate> + 'a {
        self.filters
            .iter()
            .filter(move |f| f.segment_type == segment_type)
    }

    /// Edits that target `segment_type`, in order.
    pub fn edits_for<'a>(
        &'a self,
        segment_type: &'a str,
    ) -> impl Iterator<Item = &'a EditOperation> + 'a {
        self.edits
            .iter()
            .filter(move |e| e.segment_type == segment_type)
    }
}

impl fmt::Display for EditGroup {
    /// Rule-file form, readable back by [`crate::dsl::parse_rules`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => writeln!(f, "GROUP {name}")?,
            None => writeln!(f, "GROUP")?,
        }
        for filter in &self.filters {
            writeln!(f, "| FILTER {filter}")?;
        }
        for edit in &self.edits {
            writeln!(f, "| EDIT {edit}")?;
        }
        write!(f, "?")
    }
}

/// Wrap a value in the first delimiter it does not contain.
fn delimited(value: &str) -> String {
    let delim = ['"', '/', '\'', '!', '#', '~', '%']
        .into_iter()
        .find(|d| !value.contains(*d))
        .unwrap_or('\u{1}');
    format!("{delim}{value}{delim}")
}

/// Every edit of every group, in group order.
pub fn flatten_edits(groups: &[EditGroup]) -> Vec<EditOperation> {
    groups.iter().flat_map(|g| g.edits().iter().cloned()).collect()
}
