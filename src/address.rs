//! Field and component addressing.
//!
//! An address is `field` or `field.component`, both 1-based. Field 0 is the
//! segment type code and is never addressable. Neither index may exceed
//! [`MAX_INDEX`].
//!
//! ```
//! use hl7_edit_rs::FieldAddress;
//!
//! let addr: FieldAddress = "5.2".parse().unwrap();
//! assert_eq!(addr, FieldAddress::new(5, Some(2)).unwrap());
//! assert_eq!(addr.to_string(), "5.2");
//! assert!("5.100000".parse::<FieldAddress>().is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::RuleError;

/// Largest field or component index a rule may name.
///
/// Component edits pad a field up to the addressed component, so this also
/// bounds how far one edit can grow a line.
pub const MAX_INDEX: usize = 999;

/// A `(field, component?)` locator within one segment line.
///
/// Ordering is by field index, then component index with the whole-field
/// form sorting first. This is the display order of the address catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldAddress {
    field: usize,
    component: Option<usize>,
}

impl FieldAddress {
    /// Address a whole field.
    ///
    /// # Panics
    /// Panics if `field` is zero.
    pub(crate) fn field(field: usize) -> Self {
        assert!(field >= 1, "field index is 1-based");
        Self {
            field,
            component: None,
        }
    }

    /// Address one component of a field.
    ///
    /// # Panics
    /// Panics if either index is zero.
    pub(crate) fn component(field: usize, component: usize) -> Self {
        assert!(field >= 1 && component >= 1, "indices are 1-based");
        Self {
            field,
            component: Some(component),
        }
    }

    /// Checked constructor, rejecting zero indices and indices above
    /// [`MAX_INDEX`].
    pub fn new(field: usize, component: Option<usize>) -> Result<Self, RuleError> {
        let in_range = |i: usize| (1..=MAX_INDEX).contains(&i);
        if !in_range(field) || component.is_some_and(|c| !in_range(c)) {
            let text = match component {
                Some(c) => format!("{field}.{c}"),
                None => field.to_string(),
            };
            return Err(RuleError::InvalidAddress(text));
        }
        Ok(Self { field, component })
    }

    pub fn field_index(&self) -> usize {
        self.field
    }

    pub fn component_index(&self) -> Option<usize> {
        self.component
    }

    pub fn is_component(&self) -> bool {
        self.component.is_some()
    }
}

impl fmt::Display for FieldAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.component {
            Some(c) => write!(f, "{}.{}", self.field, c),
            None => write!(f, "{}", self.field),
        }
    }
}

impl FromStr for FieldAddress {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RuleError::InvalidAddress(s.to_string());
        let mut parts = s.trim().split('.');

        let field = parts
            .next()
            .and_then(|p| p.parse::<usize>().ok())
            .ok_or_else(invalid)?;
        let component = match parts.next() {
            Some(p) => Some(p.parse::<usize>().map_err(|_| invalid())?),
            None => None,
        };
        if parts.next().is_some() {
            return Err(invalid());
        }

        FieldAddress::new(field, component).map_err(|_| invalid())
    }
}

impl TryFrom<String> for FieldAddress {
    type Error = RuleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldAddress> for String {
    fn from(addr: FieldAddress) -> Self {
        addr.to_string()
    }
}

/// Split `SEG.field[.component]` into a segment type and an address.
pub fn parse_segment_address(text: &str) -> Result<(String, FieldAddress), RuleError> {
    let text = text.trim();
    let (segment, rest) = text
        .split_once('.')
        .ok_or_else(|| RuleError::InvalidAddress(text.to_string()))?;
    if segment.is_empty() || segment.contains('|') || segment.contains(char::is_whitespace) {
        return Err(RuleError::InvalidAddress(text.to_string()));
    }
    let address = rest
        .parse()
        .map_err(|_| RuleError::InvalidAddress(text.to_string()))?;
    Ok((segment.to_string(), address))
}
