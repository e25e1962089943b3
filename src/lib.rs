//! # hl7-edit-rs
//!
//! Field-addressed filtering and bulk editing of pipe-delimited HL7 v2
//! messages.
//!
//! ## Overview
//!
//! A corpus is loaded from one or more text blobs and split into messages at
//! every `MSH|` header. From there:
//! - **Catalog**: which `field` / `field.component` addresses occur per segment type
//! - **Census**: how often each value occurs at one address
//! - **Filters**: exact-match predicates, checked per segment line
//! - **Edit groups**: filters plus edits, applied line by line across the corpus
//! - **Highlighting**: which addressed spans changed between a message and its edit
//!
//! ## Example
//!
//! ```
//! use hl7_edit_rs::{
//!     EditGroup, EditOperation, FieldAddress, FilterPredicate, apply_groups, split_messages,
//! };
//!
//! let corpus = split_messages("MSH|1\rPID|1||999^^^MRN||SMITH^JANE\rOBX|1|TX|RESULT||POSITIVE\r");
//!
//! let group = EditGroup::new(
//!     vec![FilterPredicate::new("PID", "1".parse().unwrap(), "1")],
//!     vec![EditOperation::clear("PID", FieldAddress::new(5, Some(2)).unwrap())],
//! )
//! .unwrap();
//!
//! let edited = apply_groups(&corpus, &[group]);
//! assert!(edited[0].as_str().contains("PID|1||999^^^MRN||SMITH^\n"));
//! ```

pub mod address;
pub mod apply;
pub mod catalog;
pub mod census;
pub mod diff;
pub mod dsl;
pub mod error;
pub mod filter;
pub mod predicate;
pub mod record;
pub mod rule;
pub mod session;
pub mod splitter;

pub use address::{FieldAddress, MAX_INDEX, parse_segment_address};
pub use apply::{apply_groups, apply_to_line, apply_to_message};
pub use catalog::AddressCatalog;
pub use census::{CensusEntry, ValueCensus};
pub use diff::{Highlight, Mark, Markers, highlight, render_marks};
pub use dsl::{Command, parse_inline_group, parse_rules};
pub use error::RuleError;
pub use filter::{FilterMatch, MessageMatch, group_matches, message_matches, select_matching};
pub use predicate::{line_matches, predicate_holds};
pub use record::{Message, Segment};
pub use rule::{EditAction, EditGroup, EditOperation, FilterPredicate, flatten_edits};
pub use session::{Preview, Session, UnknownAddress};
pub use splitter::{
    MESSAGE_HEADER, join_messages, partition, split_blobs, split_messages, split_messages_with,
    window,
};
