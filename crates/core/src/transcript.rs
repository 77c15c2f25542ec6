//! The crab's conversation with its model.

use std::collections::HashSet;
use std::error::Error as StdError;
use std::fmt::{self, Display};

use hermitclaw_model::{ToolResult, TranscriptItem};
use serde_json::Value;

/// Returned when a tool result refers to a call the transcript has never
/// seen.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UnmatchedToolResult {
    /// The dangling call id.
    pub call_id: String,
}

impl Display for UnmatchedToolResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no tool call with id \"{}\"", self.call_id)
    }
}

impl StdError for UnmatchedToolResult {}

/// An append-only transcript.
///
/// Every tool result must answer a tool call that was pushed before it.
/// Items are never removed or reordered, so a provider always sees the
/// conversation the way it was produced.
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    items: Vec<TranscriptItem>,
    call_ids: HashSet<String>,
}

impl Transcript {
    /// Creates an empty transcript.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an item.
    pub fn push(
        &mut self,
        item: TranscriptItem,
    ) -> Result<(), UnmatchedToolResult> {
        match &item {
            TranscriptItem::ToolCall(call) => {
                self.call_ids.insert(call.call_id.clone());
            }
            TranscriptItem::ToolResult(result)
                if !self.call_ids.contains(&result.call_id) =>
            {
                return Err(UnmatchedToolResult {
                    call_id: result.call_id.clone(),
                });
            }
            _ => {}
        }
        self.items.push(item);
        Ok(())
    }

    /// Appends every item in order, stopping at the first one that breaks
    /// the call id rule.
    pub fn extend(
        &mut self,
        items: impl IntoIterator<Item = TranscriptItem>,
    ) -> Result<(), UnmatchedToolResult> {
        items.into_iter().try_for_each(|item| self.push(item))
    }

    /// Appends a plain user message.
    #[inline]
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.items.push(TranscriptItem::user(content));
    }

    /// Appends a plain assistant message.
    #[inline]
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.items.push(TranscriptItem::assistant(content));
    }

    /// Appends the result of the tool call `call_id`.
    pub fn push_tool_result(
        &mut self,
        call_id: impl Into<String>,
        output: impl Into<Value>,
    ) -> Result<(), UnmatchedToolResult> {
        let mut result = ToolResult::new(call_id, "");
        result.output = output.into();
        self.push(TranscriptItem::ToolResult(result))
    }

    /// Returns the items, oldest first.
    #[inline]
    pub fn items(&self) -> &[TranscriptItem] {
        &self.items
    }

    /// Returns the number of items.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if nothing has been said yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl AsRef<[TranscriptItem]> for Transcript {
    #[inline]
    fn as_ref(&self) -> &[TranscriptItem] {
        &self.items
    }
}
