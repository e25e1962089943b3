//! Editing session: the loaded corpus, its catalog and the active rules.
//!
//! A `Session` is the one value passed between loading, rule authoring,
//! preview and export. The catalog grows with every loaded blob.

use tracing::{info, warn};

use crate::diff::{Highlight, highlight};
use crate::filter::{MessageMatch, select_matching};
use crate::rule::flatten_edits;
use crate::splitter::{MESSAGE_HEADER, join_messages, partition, split_messages_with};
use crate::{
    AddressCatalog, EditGroup, FieldAddress, Message, RuleError, ValueCensus, apply_groups,
    apply_to_message,
};

/// Before/after view of the first message that satisfies every group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    /// Position of the previewed message in the corpus.
    pub index: usize,
    pub before: Message,
    pub after: Message,
    pub highlight: Highlight,
}

/// A rule address that never occurs in the loaded corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAddress {
    /// 0-based index of the group naming it.
    pub group: usize,
    pub segment_type: String,
    pub address: FieldAddress,
}

#[derive(Debug, Clone)]
pub struct Session {
    header: String,
    messages: Vec<Message>,
    catalog: AddressCatalog,
    groups: Vec<EditGroup>,
}

impl Default for Session {
    fn default() -> Self {
        Session::new(MESSAGE_HEADER)
    }
}

impl Session {
    /// Empty session splitting on `header`.
    pub fn new(header: impl Into<String>) -> Self {
        Session {
            header: header.into(),
            messages: Vec::new(),
            catalog: AddressCatalog::default(),
            groups: Vec::new(),
        }
    }

    /// Append the messages of one blob and add them to the catalog.
    /// Returns the number of messages added.
    pub fn load(&mut self, blob: &str) -> usize {
        let added = split_messages_with(blob, &self.header);
        let count = added.len();
        self.catalog.extend(&added);
        self.messages.extend(added);
        info!(
            added = count,
            total = self.messages.len(),
            "loaded messages"
        );
        count
    }

    /// Append several blobs, in order.
    pub fn load_all<I, S>(&mut self, blobs: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        blobs.into_iter().map(|b| self.load(b.as_ref())).sum()
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn catalog(&self) -> &AddressCatalog {
        &self.catalog
    }

    pub fn census(&self, segment_type: &str, addr: FieldAddress) -> ValueCensus {
        ValueCensus::build(&self.messages, segment_type, addr)
    }

    pub fn groups(&self) -> &[EditGroup] {
        &self.groups
    }

    pub fn add_group(&mut self, group: EditGroup) {
        self.groups.push(group);
    }

    pub fn set_groups(&mut self, groups: Vec<EditGroup>) {
        self.groups = groups;
    }

    /// Rule addresses that the catalog has never seen. Such rules are legal
    /// but can only match or edit nothing, which is usually a typo.
    pub fn unknown_addresses(&self) -> Vec<UnknownAddress> {
        let mut unknown = Vec::new();
        for (i, group) in self.groups.iter().enumerate() {
            let filters = group.filters().iter().map(|f| (&f.segment_type, f.address));
            let edits = group.edits().iter().map(|e| (&e.segment_type, e.address));
            for (seg, addr) in filters.chain(edits) {
                if !self.catalog.contains(seg, addr) {
                    warn!(group = i, segment = %seg, address = %addr, "address not in catalog");
                    unknown.push(UnknownAddress {
                        group: i,
                        segment_type: seg.clone(),
                        address: addr,
                    });
                }
            }
        }
        unknown
    }

    /// Messages satisfying the filters of every group.
    pub fn matching(&self) -> Vec<MessageMatch> {
        select_matching(&self.messages, &self.groups)
    }

    /// Apply all groups to the first matching message and highlight the
    /// changes. `None` without groups or without a match.
    pub fn preview(&self) -> Option<Preview> {
        if self.groups.is_empty() {
            return None;
        }
        let first = self.matching().into_iter().next()?;
        let before = self.messages[first.index].clone();
        let after = apply_to_message(&before, &self.groups);
        let highlight = highlight(&before, &after, &flatten_edits(&self.groups));
        Some(Preview {
            index: first.index,
            before,
            after,
            highlight,
        })
    }

    /// Apply all groups to the whole corpus. The session keeps the originals.
    pub fn apply(&self) -> Vec<Message> {
        apply_groups(&self.messages, &self.groups)
    }

    /// The corpus as one text stream.
    pub fn merged(&self) -> String {
        join_messages(&self.messages)
    }

    /// The corpus cut into chunks of `size` messages.
    pub fn partitions(&self, size: usize) -> Result<Vec<&[Message]>, RuleError> {
        partition(&self.messages, size)
    }
}
