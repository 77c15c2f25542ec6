use hermitclaw_model::{CallResult, ToolCall, ToolInvocation, TranscriptItem};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool call the fake model should request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetToolCall {
    pub call_id: String,
    pub name: String,
    pub arguments: Value,
}

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "text")]
    Text(String),
    #[serde(rename = "tool_call")]
    ToolCall(PresetToolCall),
}

/// The preset response for one model call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the request will fail in the first `failure` attempts.
    /// `Some(0)` means the request will fail infinitely.
    #[serde(default)]
    pub failures: Option<u64>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            failures: None,
        }
    }

    /// Creates a `PresetResponse` that only says `text`.
    #[inline]
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::with_events([PresetEvent::Text(text.into())])
    }

    /// Sets failure times before a successful response. `0` means the
    /// response will always be a failure.
    #[inline]
    pub fn with_failures(mut self, failures: u64) -> Self {
        self.failures = Some(failures);
        self
    }

    /// Builds the normalized result the way a provider would: text
    /// fragments are concatenated, and the items to append hold the
    /// assistant message followed by the tool calls.
    pub fn to_call_result(&self) -> CallResult {
        let mut text = String::new();
        let mut result = CallResult::default();
        let mut calls = vec![];
        for event in &self.events {
            match event {
                PresetEvent::Text(fragment) => text.push_str(fragment),
                PresetEvent::ToolCall(call) => {
                    let call = ToolCall::new(
                        &call.call_id,
                        &call.name,
                        call.arguments.to_string(),
                    );
                    result
                        .tool_calls
                        .push(ToolInvocation::from_tool_call(&call));
                    calls.push(TranscriptItem::ToolCall(call));
                }
            }
        }
        if !text.is_empty() {
            result.append_items.push(TranscriptItem::assistant(&text));
            result.text = Some(text);
        }
        result.append_items.extend(calls);
        result
    }
}
