use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::transcript::{ToolCall, TranscriptItem};

/// Describes a tool call request from the model, with its arguments
/// already decoded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// The name of the tool to call.
    pub name: String,
    /// The decoded arguments. Arguments that are not valid JSON are
    /// replaced with an empty object.
    pub arguments: Value,
    /// The identifier the tool result must refer to.
    pub call_id: String,
}

impl ToolInvocation {
    /// Decodes a transcript tool call.
    pub fn from_tool_call(call: &ToolCall) -> Self {
        Self {
            name: call.name.clone(),
            arguments: decode_arguments(&call.arguments),
            call_id: call.call_id.clone(),
        }
    }
}

/// Decodes JSON-encoded tool arguments. The model is allowed to produce
/// garbage here, which decodes to an empty object instead of an error.
pub fn decode_arguments(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::Object(Map::new()))
}

/// The normalized result of one model call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallResult {
    /// The text the model produced, or `None` when it produced no text
    /// (for example, a turn that only calls tools).
    pub text: Option<String>,
    /// Tool calls requested by the model, in order.
    pub tool_calls: Vec<ToolInvocation>,
    /// Items the caller must append to its transcript before the next
    /// call, so that the provider sees this turn again.
    pub append_items: Vec<TranscriptItem>,
}

impl CallResult {
    /// Returns the text, or an empty string when there is none.
    #[inline]
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}
