use std::borrow::Cow;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::OpaqueItem;

/// The speaker of a plain message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The crab's owner, or whoever feeds input to the crab.
    User,
    /// The model.
    Assistant,
}

/// An ordinary turn, as written by the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainMessage {
    /// Who said it.
    pub role: Role,
    /// What was said.
    pub content: String,
}

/// A tool invocation the model requested.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// The name of the tool to call.
    pub name: String,
    /// The JSON-encoded arguments, exactly as the model produced them.
    #[serde(default = "empty_arguments")]
    pub arguments: String,
    /// The identifier tool results refer back to.
    pub call_id: String,
    /// Provider fields that are kept but not interpreted.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolCall {
    /// Creates a tool call without provider fields.
    #[inline]
    pub fn new(
        call_id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into(),
            call_id: call_id.into(),
            extra: Map::new(),
        }
    }
}

fn empty_arguments() -> String {
    "{}".to_owned()
}

/// The outcome of a tool call, fed back by the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The identifier of the [`ToolCall`] this result answers.
    pub call_id: String,
    /// The result of the tool call, usually a string.
    #[serde(default)]
    pub output: Value,
    /// Provider fields that are kept but not interpreted.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolResult {
    /// Creates a tool result with a text output.
    #[inline]
    pub fn new(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            output: Value::String(output.into()),
            extra: Map::new(),
        }
    }

    /// Returns the output as text. Non-string outputs are rendered as
    /// JSON.
    pub fn output_text(&self) -> Cow<'_, str> {
        match &self.output {
            Value::String(text) => Cow::Borrowed(text),
            Value::Null => Cow::Borrowed(""),
            other => Cow::Owned(other.to_string()),
        }
    }
}

/// A message that was already normalized by a provider, re-entering the
/// transcript on a later turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SerializedMessage {
    /// The role as the provider named it.
    #[serde(default = "default_role")]
    pub role: String,
    /// The message content.
    #[serde(default)]
    pub content: MessageContent,
    /// Provider fields that are kept but not interpreted.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_role() -> String {
    "assistant".to_owned()
}

/// The content of a [`SerializedMessage`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text.
    Text(String),
    /// A list of typed fragments, only some of which carry text.
    Fragments(Vec<ContentFragment>),
}

impl Default for MessageContent {
    #[inline]
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

impl MessageContent {
    /// Iterates over the text-bearing parts of the content.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        let (text, fragments) = match self {
            MessageContent::Text(text) => (Some(text.as_str()), &[][..]),
            MessageContent::Fragments(fragments) => (None, &fragments[..]),
        };
        text.into_iter()
            .chain(fragments.iter().filter_map(|f| f.text.as_deref()))
    }

    /// Joins the text-bearing parts with `separator`, dropping everything
    /// else.
    #[inline]
    pub fn flatten(&self, separator: &str) -> String {
        self.texts().collect::<Vec<_>>().join(separator)
    }
}

/// One typed fragment of a message's content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentFragment {
    /// The fragment type, like `output_text` or `refusal`.
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub kind: String,
    /// The text of the fragment, if it carries any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Provider fields that are kept but not interpreted.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An item of the unified, protocol-agnostic conversation history.
///
/// The serialized form of every variant is the item shape of the native
/// protocol, so a transcript can be sent to it without translation:
///
/// | Variant      | Wire shape                                      |
/// |--------------|-------------------------------------------------|
/// | `Message`    | `{"role", "content"}`                           |
/// | `ToolCall`   | `{"type": "function_call", "name", ...}`        |
/// | `ToolResult` | `{"type": "function_call_output", "call_id", ...}` |
/// | `Serialized` | `{"type": "message", "role", "content", ...}`   |
/// | `Opaque`     | the raw object                                  |
///
/// Deserialization never fails on an unknown object: anything that
/// doesn't match a known variant becomes [`TranscriptItem::Opaque`].
#[derive(Clone, Debug, PartialEq)]
pub enum TranscriptItem {
    /// An ordinary user or assistant turn.
    Message(PlainMessage),
    /// A tool invocation the model requested.
    ToolCall(ToolCall),
    /// The outcome of a tool invocation.
    ToolResult(ToolResult),
    /// A message normalized by a provider on an earlier turn.
    Serialized(SerializedMessage),
    /// An item only its provider understands.
    Opaque(OpaqueItem),
}

impl TranscriptItem {
    /// Creates a user message.
    #[inline]
    pub fn user(content: impl Into<String>) -> Self {
        TranscriptItem::Message(PlainMessage {
            role: Role::User,
            content: content.into(),
        })
    }

    /// Creates an assistant message.
    #[inline]
    pub fn assistant(content: impl Into<String>) -> Self {
        TranscriptItem::Message(PlainMessage {
            role: Role::Assistant,
            content: content.into(),
        })
    }

    /// Creates a tool result with a text output.
    #[inline]
    pub fn tool_result(
        call_id: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        TranscriptItem::ToolResult(ToolResult::new(call_id, output))
    }

    /// Returns `true` if this item is a tool call.
    #[inline]
    pub fn is_tool_call(&self) -> bool {
        matches!(self, TranscriptItem::ToolCall(_))
    }

    /// Returns the tool call, if this item is one.
    #[inline]
    pub fn as_tool_call(&self) -> Option<&ToolCall> {
        match self {
            TranscriptItem::ToolCall(call) => Some(call),
            _ => None,
        }
    }

    /// Builds an item from a raw JSON value, falling back to
    /// [`TranscriptItem::Opaque`] for anything unrecognized.
    pub fn from_value(value: Value) -> Self {
        let parsed: Option<TranscriptItem> = match value.get("type") {
            Some(Value::String(_)) => {
                TypedItem::deserialize(&value).ok().map(Into::into)
            }
            Some(_) => None,
            None => PlainMessage::deserialize(&value)
                .ok()
                .map(TranscriptItem::Message),
        };
        parsed
            .unwrap_or_else(|| TranscriptItem::Opaque(OpaqueItem::new(value)))
    }
}

impl From<PlainMessage> for TranscriptItem {
    #[inline]
    fn from(msg: PlainMessage) -> Self {
        TranscriptItem::Message(msg)
    }
}

impl From<ToolCall> for TranscriptItem {
    #[inline]
    fn from(call: ToolCall) -> Self {
        TranscriptItem::ToolCall(call)
    }
}

impl From<ToolResult> for TranscriptItem {
    #[inline]
    fn from(result: ToolResult) -> Self {
        TranscriptItem::ToolResult(result)
    }
}

// Typed items share the `type` discriminator of the native protocol.

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TypedItemRef<'a> {
    FunctionCall(&'a ToolCall),
    FunctionCallOutput(&'a ToolResult),
    Message(&'a SerializedMessage),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TypedItem {
    FunctionCall(ToolCall),
    FunctionCallOutput(ToolResult),
    Message(SerializedMessage),
}

impl From<TypedItem> for TranscriptItem {
    #[inline]
    fn from(item: TypedItem) -> Self {
        match item {
            TypedItem::FunctionCall(call) => TranscriptItem::ToolCall(call),
            TypedItem::FunctionCallOutput(result) => {
                TranscriptItem::ToolResult(result)
            }
            TypedItem::Message(msg) => TranscriptItem::Serialized(msg),
        }
    }
}

impl Serialize for TranscriptItem {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match self {
            TranscriptItem::Message(msg) => msg.serialize(serializer),
            TranscriptItem::ToolCall(call) => {
                TypedItemRef::FunctionCall(call).serialize(serializer)
            }
            TranscriptItem::ToolResult(result) => {
                TypedItemRef::FunctionCallOutput(result).serialize(serializer)
            }
            TranscriptItem::Serialized(msg) => {
                TypedItemRef::Message(msg).serialize(serializer)
            }
            TranscriptItem::Opaque(item) => item.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for TranscriptItem {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(TranscriptItem::from_value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_plain_message_shape() {
        let item = TranscriptItem::user("Hello");
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({ "role": "user", "content": "Hello" })
        );

        let back: TranscriptItem = serde_json::from_value(json!({
            "role": "assistant",
            "content": "Hi"
        }))
        .unwrap();
        assert_eq!(back, TranscriptItem::assistant("Hi"));
    }

    #[test]
    fn test_native_items_keep_provider_fields() {
        let raw = json!([
            {
                "type": "function_call",
                "id": "fc_1",
                "call_id": "call_1",
                "name": "shell",
                "arguments": "{\"command\":\"ls\"}",
                "status": "completed"
            },
            {
                "type": "message",
                "id": "msg_1",
                "role": "assistant",
                "status": "completed",
                "content": [
                    { "type": "output_text", "text": "Done.", "annotations": [] }
                ]
            },
            { "type": "function_call_output", "call_id": "call_1", "output": "a.txt" }
        ]);
        let items: Vec<TranscriptItem> =
            serde_json::from_value(raw.clone()).unwrap();

        let call = items[0].as_tool_call().unwrap();
        assert_eq!(call.call_id, "call_1");
        assert_eq!(call.extra["id"], json!("fc_1"));
        assert!(!call.extra.contains_key("type"));
        assert!(matches!(items[1], TranscriptItem::Serialized(_)));
        assert!(matches!(items[2], TranscriptItem::ToolResult(_)));

        assert_eq!(serde_json::to_value(&items).unwrap(), raw);
    }

    #[test]
    fn test_unknown_items_become_opaque() {
        let raw = json!([
            { "type": "reasoning", "id": "rs_1", "summary": [] },
            { "role": "system", "content": "Be nice." },
            { "type": "function_call", "name": "shell" },
            { "type": 42 }
        ]);
        let items: Vec<TranscriptItem> =
            serde_json::from_value(raw.clone()).unwrap();

        assert!(
            items
                .iter()
                .all(|item| matches!(item, TranscriptItem::Opaque(_)))
        );
        assert_eq!(serde_json::to_value(&items).unwrap(), raw);
    }

    #[test]
    fn test_tool_call_defaults() {
        let item = TranscriptItem::from_value(json!({
            "type": "function_call",
            "name": "respond",
            "call_id": "c1"
        }));
        assert_eq!(
            item,
            TranscriptItem::ToolCall(ToolCall::new("c1", "respond", "{}"))
        );
    }

    #[test]
    fn test_content_texts() {
        let content: MessageContent = serde_json::from_value(json!([
            { "type": "output_text", "text": "Hello" },
            { "type": "refusal", "refusal": "no" },
            { "type": "output_text", "text": "world" }
        ]))
        .unwrap();
        assert_eq!(content.flatten(" "), "Hello world");
        assert_eq!(content.flatten("\n"), "Hello\nworld");

        let content = MessageContent::Text("plain".to_owned());
        assert_eq!(content.texts().collect::<Vec<_>>(), ["plain"]);
    }

    #[test]
    fn test_tool_result_output_text() {
        let result = ToolResult::new("c1", "ok");
        assert_eq!(result.output_text(), "ok");

        let result = ToolResult {
            call_id: "c2".to_owned(),
            output: json!({ "exit": 0 }),
            extra: Map::new(),
        };
        assert_eq!(result.output_text(), r#"{"exit":0}"#);
    }
}
