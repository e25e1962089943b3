//! Value census: how often each distinct value occurs at one address.

use std::collections::HashMap;

use serde::Serialize;

use crate::record::COMPONENT_DELIMITER;
use crate::{FieldAddress, Message};

/// Distinct values at one `(segment type, address)` and their counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueCensus {
    counts: HashMap<String, usize>,
}

/// One row of a ranked census.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CensusEntry<'a> {
    pub value: &'a str,
    pub count: usize,
}

impl ValueCensus {
    /// Count values across every line of `segment_type`.
    ///
    /// Lines too short to hold the field are skipped. A missing component in
    /// a present field counts as the empty string.
    pub fn build(messages: &[Message], segment_type: &str, addr: FieldAddress) -> Self {
        let mut counts: HashMap<String, usize> = HashMap::new();

        let lines = messages
            .iter()
            .flat_map(|m| m.segments())
            .filter(|seg| seg.segment_type() == segment_type);

        for seg in lines {
            let Some(field) = seg.field(addr.field_index()) else {
                continue;
            };
            let value = match addr.component_index() {
                None => field,
                Some(c) => field.split(COMPONENT_DELIMITER).nth(c - 1).unwrap_or(""),
            };
            *counts.entry(value.to_string()).or_insert(0) += 1;
        }

        ValueCensus { counts }
    }

    pub fn count(&self, value: &str) -> usize {
        self.counts.get(value).copied().unwrap_or(0)
    }

    /// Number of distinct values.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of lines that contributed a value.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn counts(&self) -> &HashMap<String, usize> {
        &self.counts
    }

    /// Entries by descending count, ties broken by ascending value.
    pub fn ranked(&self) -> Vec<CensusEntry<'_>> {
        let mut entries: Vec<CensusEntry<'_>> = self
            .counts
            .iter()
            .map(|(value, &count)| CensusEntry { value, count })
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(b.value)));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Message> {
        vec![
            Message::new("MSH|1\nPID|1||A^X||SMITH^JANE\nOBX|1|TX|RESULT||POSITIVE"),
            Message::new("MSH|2\nPID|1||B||DOE^JOHN\nOBX|1|TX|RESULT||NEGATIVE"),
            Message::new("MSH|3\nPID|1\nOBX|1|TX|RESULT||POSITIVE\nOBX|2|TX|NOTE||POSITIVE"),
        ]
    }

    #[test]
    fn test_whole_field_counts() {
        let census = ValueCensus::build(&corpus(), "OBX", FieldAddress::field(5));
        assert_eq!(census.count("POSITIVE"), 3);
        assert_eq!(census.count("NEGATIVE"), 1);
        assert_eq!(census.total(), 4);
        assert_eq!(census.len(), 2);
    }

    #[test]
    fn test_short_lines_are_skipped() {
        // third message's PID has only one field
        let census = ValueCensus::build(&corpus(), "PID", FieldAddress::component(5, 1));
        assert_eq!(census.total(), 2);
        assert_eq!(census.count("SMITH"), 1);
        assert_eq!(census.count("DOE"), 1);
    }

    #[test]
    fn test_missing_component_counts_as_empty() {
        let census = ValueCensus::build(&corpus(), "PID", FieldAddress::component(3, 2));
        assert_eq!(census.count("X"), 1);
        assert_eq!(census.count(""), 1);
        assert_eq!(census.total(), 2);
    }

    #[test]
    fn test_ranked_order() {
        let census = ValueCensus::build(&corpus(), "OBX", FieldAddress::field(3));
        let ranked = census.ranked();
        assert_eq!(
            ranked,
            vec![
                CensusEntry { value: "RESULT", count: 3 },
                CensusEntry { value: "NOTE", count: 1 },
            ]
        );

        let tied = ValueCensus::build(&corpus(), "PID", FieldAddress::component(5, 2));
        let values: Vec<&str> = tied.ranked().iter().map(|e| e.value).collect();
        assert_eq!(values, vec!["JANE", "JOHN"]);
    }

    #[test]
    fn test_unknown_segment() {
        let census = ValueCensus::build(&corpus(), "ZZZ", FieldAddress::field(1));
        assert!(census.is_empty());
        assert!(census.ranked().is_empty());
    }
}
