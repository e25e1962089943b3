//! Error types for rule definitions.
//!
//! Message content never produces an error: out-of-range addresses resolve
//! to "no match" or "no-op". Only malformed rules supplied by the caller fail.

use thiserror::Error;

/// Errors raised while building or parsing edit rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// Address text could not be parsed, or used an index out of range.
    #[error(
        "invalid address '{0}' (expected SEG.field[.component] with indices from 1 to {max})",
        max = crate::address::MAX_INDEX
    )]
    InvalidAddress(String),

    /// Form-style input was not of the shape `SEG.field[.component]=value`.
    #[error("invalid assignment '{0}' (expected SEG.field[.component]=value)")]
    InvalidAssignment(String),

    /// An edit group was built without any filters.
    #[error("edit group has no filters")]
    NoFilters,

    /// An edit group was built without any edits.
    #[error("edit group has no edits")]
    NoEdits,

    /// A rules file could not be parsed.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Partitioned export was asked for zero-sized chunks.
    #[error("partition size must be at least 1")]
    ZeroPartitionSize,
}

impl RuleError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        RuleError::Parse {
            line,
            message: message.into(),
        }
    }
}
