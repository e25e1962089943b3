//! Message splitting and corpus export helpers.
//!
//! Raw text is normalised to `\n` line endings and cut immediately before
//! every occurrence of the header marker (`MSH|` by default). The marker is
//! kept at the start of each message.

use tracing::debug;

use crate::record::LINE_SEPARATOR;
use crate::{Message, RuleError};

/// Marker that begins every message.
pub const MESSAGE_HEADER: &str = "MSH|";

/// Convert `\r\n` and lone `\r` line endings to `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Split one blob into messages using [`MESSAGE_HEADER`].
pub fn split_messages(raw: &str) -> Vec<Message> {
    split_messages_with(raw, MESSAGE_HEADER)
}

/// Split one blob into messages at every occurrence of `header`.
///
/// Text before the first marker is discarded, so a blob without any marker
/// yields no messages. Each chunk is trimmed and empty chunks are dropped.
/// An empty `header` treats the whole blob as a single message.
pub fn split_messages_with(raw: &str, header: &str) -> Vec<Message> {
    let text = normalize_line_endings(raw);

    if header.is_empty() {
        let chunk = text.trim();
        return if chunk.is_empty() {
            vec![]
        } else {
            vec![Message::new(chunk)]
        };
    }

    let starts: Vec<usize> = text.match_indices(header).map(|(i, _)| i).collect();
    let messages: Vec<Message> = starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let end = starts.get(n + 1).copied().unwrap_or(text.len());
            text[start..end].trim()
        })
        .filter(|chunk| !chunk.is_empty())
        .map(Message::new)
        .collect();

    debug!(markers = starts.len(), messages = messages.len(), "split blob");
    messages
}

/// Split several blobs into one flat corpus, preserving blob order.
pub fn split_blobs<I, S>(blobs: I, header: &str) -> Vec<Message>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    blobs
        .into_iter()
        .flat_map(|blob| split_messages_with(blob.as_ref(), header))
        .collect()
}

/// Re-join a corpus into a single text stream (merged export).
pub fn join_messages(messages: &[Message]) -> String {
    let mut out = String::new();
    for (i, msg) in messages.iter().enumerate() {
        if i > 0 {
            out.push(LINE_SEPARATOR);
        }
        out.push_str(msg.as_str());
    }
    out
}

/// Messages `[start, start + len)`, clamped to the corpus.
pub fn window(messages: &[Message], start: usize, len: usize) -> &[Message] {
    let start = start.min(messages.len());
    let end = start.saturating_add(len).min(messages.len());
    &messages[start..end]
}

/// Cut a corpus into consecutive chunks of `size` messages.
///
/// Every message lands in exactly one chunk and order is preserved; only the
/// last chunk may be short.
pub fn partition(messages: &[Message], size: usize) -> Result<Vec<&[Message]>, RuleError> {
    if size == 0 {
        return Err(RuleError::ZeroPartitionSize);
    }
    Ok(messages.chunks(size).collect())
}
