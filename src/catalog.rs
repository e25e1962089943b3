//! Address catalog: which field/component addresses occur per segment type.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::record::COMPONENT_DELIMITER;
use crate::{FieldAddress, Message};

/// Observed addresses per segment type, each set in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AddressCatalog {
    segments: BTreeMap<String, BTreeSet<FieldAddress>>,
}

impl AddressCatalog {
    /// Scan a corpus.
    ///
    /// A field containing `^` contributes `field.1 ..= field.n` for the `n`
    /// components present in that occurrence; any other field contributes
    /// the whole-field address. The result is the union over all lines.
    pub fn build(messages: &[Message]) -> Self {
        let mut catalog = AddressCatalog::default();
        catalog.extend(messages);
        catalog
    }

    /// Add the addresses of more messages. Since the catalog is a union,
    /// extending batch by batch gives the same result as one `build`.
    pub fn extend(&mut self, messages: &[Message]) {
        let segments = &mut self.segments;

        for msg in messages {
            for seg in msg.segments() {
                let seen = segments.entry(seg.segment_type().to_string()).or_default();
                for (i, field) in seg.fields().iter().enumerate().skip(1) {
                    if field.contains(COMPONENT_DELIMITER) {
                        let count = field.split(COMPONENT_DELIMITER).count();
                        seen.extend((1..=count).map(|c| FieldAddress::component(i, c)));
                    } else {
                        seen.insert(FieldAddress::field(i));
                    }
                }
            }
        }

        debug!(
            messages = messages.len(),
            segment_types = segments.len(),
            "extended address catalog"
        );
    }

    /// Segment types in sorted order.
    pub fn segment_types(&self) -> impl Iterator<Item = &str> {
        self.segments.keys().map(String::as_str)
    }

    pub fn addresses(&self, segment_type: &str) -> Option<&BTreeSet<FieldAddress>> {
        self.segments.get(segment_type)
    }

    pub fn contains(&self, segment_type: &str, addr: FieldAddress) -> bool {
        self.segments
            .get(segment_type)
            .is_some_and(|set| set.contains(&addr))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<FieldAddress>)> {
        self.segments.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
