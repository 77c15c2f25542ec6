use hermitclaw_model::{
    CallResult, ModelRequest, ModelTool, PlainMessage, Role,
    SerializedMessage, ToolCall as TranscriptToolCall, ToolInvocation,
    TranscriptItem,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::Protocol;
use crate::Error;

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FunctionTool {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Tool {
    r#type: &'static str,
    function: FunctionTool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<ToolCall>>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

// ----------------------------------------
// Types both sent to and received from the server
// ----------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_arguments")]
    pub arguments: String,
}

/// Some servers send `null` arguments for calls without parameters.
fn deserialize_arguments<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let arguments = Option::<String>::deserialize(deserializer)?;
    Ok(arguments.unwrap_or_else(|| "{}".to_owned()))
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(default = "function_type")]
    pub r#type: String,
    pub function: FunctionCall,
}

fn function_type() -> String {
    "function".to_owned()
}

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ChatCompletion {
    pub choices: Vec<Choice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
}

// -----------
// Conversions
// -----------

/// The OpenAI-compatible Chat Completions protocol.
#[derive(Clone, Copy, Debug)]
pub struct ChatCompletions;

impl Protocol for ChatCompletions {
    const PATH: &'static str = "/chat/completions";

    type Request = ChatCompletionRequest;
    type Response = ChatCompletion;

    fn encode(req: &ModelRequest, model: &str) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(req.transcript.len() + 1);
        if let Some(instructions) = req.instructions() {
            messages.push(Message::System {
                content: instructions.to_owned(),
            });
        }
        messages.extend(
            group_items(&req.transcript)
                .into_iter()
                .filter_map(create_message),
        );

        let tools: Vec<_> = req.tools.iter().filter_map(create_tool).collect();
        let tool_choice = if tools.is_empty() { None } else { Some("auto") };

        ChatCompletionRequest {
            model: model.to_owned(),
            messages,
            max_tokens: req.max_output_tokens,
            tools,
            tool_choice,
        }
    }

    fn normalize(resp: ChatCompletion) -> Result<CallResult, Error> {
        let Some(choice) = resp.choices.into_iter().next() else {
            return Err(Error::malformed("chat completion has no choices"));
        };
        let msg = choice.message;

        if let Some(calls) = msg.tool_calls.filter(|c| !c.is_empty()) {
            let append_items: Vec<_> = calls
                .into_iter()
                .map(|call| {
                    TranscriptItem::ToolCall(TranscriptToolCall {
                        name: call.function.name,
                        arguments: call.function.arguments,
                        call_id: call.id,
                        extra: Map::new(),
                    })
                })
                .collect();
            let tool_calls = append_items
                .iter()
                .filter_map(TranscriptItem::as_tool_call)
                .map(ToolInvocation::from_tool_call)
                .collect();
            return Ok(CallResult {
                text: None,
                tool_calls,
                append_items,
            });
        }

        let text = msg.content.filter(|c| !c.is_empty());
        let append_items = text
            .iter()
            .map(|text| TranscriptItem::assistant(text.as_str()))
            .collect();
        Ok(CallResult {
            text,
            tool_calls: vec![],
            append_items,
        })
    }
}

/// A unit of the transcript that turns into exactly one message.
#[derive(Debug, PartialEq)]
enum Group<'a> {
    Item(&'a TranscriptItem),
    /// Tool calls the model emitted back to back. The protocol only knows
    /// about one assistant turn announcing several calls, so they must be
    /// sent together.
    ToolCalls(Vec<&'a TranscriptToolCall>),
}

fn group_items(items: &[TranscriptItem]) -> Vec<Group<'_>> {
    items
        .chunk_by(|a, b| a.is_tool_call() && b.is_tool_call())
        .map(|run| match run {
            [item] if !item.is_tool_call() => Group::Item(item),
            calls => Group::ToolCalls(
                calls
                    .iter()
                    .filter_map(TranscriptItem::as_tool_call)
                    .collect(),
            ),
        })
        .collect()
}

fn create_message(group: Group<'_>) -> Option<Message> {
    let item = match group {
        Group::Item(item) => item,
        Group::ToolCalls(calls) => return Some(create_batch(calls)),
    };
    match item {
        TranscriptItem::Message(msg) => Some(create_plain(msg)),
        TranscriptItem::Serialized(msg) => Some(create_serialized(msg)),
        TranscriptItem::ToolResult(result) => Some(Message::Tool {
            tool_call_id: result.call_id.clone(),
            content: result.output_text().into_owned(),
        }),
        TranscriptItem::ToolCall(call) => Some(create_batch(vec![call])),
        TranscriptItem::Opaque(opaque) => {
            trace!("skipping opaque item: {opaque:?}");
            None
        }
    }
}

#[inline]
fn create_batch(calls: Vec<&TranscriptToolCall>) -> Message {
    Message::Assistant {
        content: None,
        tool_calls: Some(calls.into_iter().map(create_tool_call).collect()),
    }
}

#[inline]
fn create_plain(msg: &PlainMessage) -> Message {
    match msg.role {
        Role::User => Message::User {
            content: msg.content.clone(),
        },
        Role::Assistant => Message::Assistant {
            content: Some(msg.content.clone()),
            tool_calls: None,
        },
    }
}

fn create_serialized(msg: &SerializedMessage) -> Message {
    let content = msg.content.flatten(" ");
    match msg.role.as_str() {
        "user" => Message::User { content },
        "system" | "developer" => Message::System { content },
        _ => Message::Assistant {
            content: Some(content),
            tool_calls: None,
        },
    }
}

#[inline]
fn create_tool_call(call: &TranscriptToolCall) -> ToolCall {
    ToolCall {
        id: call.call_id.clone(),
        r#type: function_type(),
        function: FunctionCall {
            name: call.name.clone(),
            arguments: call.arguments.clone(),
        },
    }
}

#[inline]
fn create_tool(tool: &ModelTool) -> Option<Tool> {
    // Built-in tools only exist in the native protocol.
    let function = tool.as_function()?;
    Some(Tool {
        r#type: "function",
        function: FunctionTool {
            name: function.name.clone(),
            description: function.description.clone(),
            parameters: function.parameters.clone(),
        },
    })
}

#[cfg(test)]
mod tests {
    use hermitclaw_model::{
        ErrorKind, FunctionTool, ModelProviderError, ToolResult,
    };
    use serde_json::json;

    use super::*;

    fn function_tool(name: &str) -> ModelTool {
        ModelTool::Function(FunctionTool {
            name: name.to_owned(),
            description: format!("The {name} tool."),
            parameters: json!({ "type": "object", "properties": {} }),
        })
    }

    fn tool_call(call_id: &str, command: &str) -> TranscriptItem {
        TranscriptItem::ToolCall(TranscriptToolCall::new(
            call_id,
            "shell",
            json!({ "command": command }).to_string(),
        ))
    }

    fn completion(message: Value) -> ChatCompletion {
        serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": message,
                "finish_reason": "stop"
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_create_request() {
        let mut request = ModelRequest::new([
            TranscriptItem::user("Hello"),
            TranscriptItem::assistant("Hi, owner."),
        ]);
        request.instructions = Some("You are a hermit crab.".to_owned());
        request.max_output_tokens = 128;

        let encoded = serde_json::to_value(ChatCompletions::encode(
            &request, "custom",
        ))
        .unwrap();
        assert_eq!(
            encoded,
            json!({
                "model": "custom",
                "messages": [
                    { "role": "system", "content": "You are a hermit crab." },
                    { "role": "user", "content": "Hello" },
                    { "role": "assistant", "content": "Hi, owner." }
                ],
                "max_tokens": 128
            })
        );
    }

    #[test]
    fn test_consecutive_tool_calls_are_batched() {
        let request = ModelRequest::new([
            TranscriptItem::user("Look around."),
            tool_call("c1", "ls"),
            tool_call("c2", "pwd"),
            tool_call("c3", "whoami"),
            TranscriptItem::tool_result("c1", "notes.txt"),
            TranscriptItem::tool_result("c2", "/box"),
            TranscriptItem::tool_result("c3", "crab"),
        ]);
        let encoded = ChatCompletions::encode(&request, "custom");

        assert_eq!(encoded.messages.len(), 5);
        let Message::Assistant {
            content: None,
            tool_calls: Some(tool_calls),
        } = &encoded.messages[1]
        else {
            panic!("expected a tool call batch: {:?}", encoded.messages[1]);
        };
        let ids: Vec<_> = tool_calls.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["c1", "c2", "c3"]);
        assert_eq!(tool_calls[1].function.name, "shell");
        assert_eq!(tool_calls[1].function.arguments, r#"{"command":"pwd"}"#);
        assert_eq!(
            encoded.messages[2],
            Message::Tool {
                tool_call_id: "c1".to_owned(),
                content: "notes.txt".to_owned(),
            }
        );

        let encoded = serde_json::to_value(&encoded).unwrap();
        assert_eq!(encoded["messages"][1]["content"], Value::Null);
        assert_eq!(encoded["messages"][1]["tool_calls"][2]["type"], "function");
    }

    #[test]
    fn test_separated_tool_calls_stay_separate() {
        let request = ModelRequest::new([
            tool_call("c1", "ls"),
            TranscriptItem::tool_result("c1", "notes.txt"),
            tool_call("c2", "cat notes.txt"),
        ]);
        let groups = group_items(&request.transcript);
        assert_eq!(groups.len(), 3);
        assert!(matches!(&groups[0], Group::ToolCalls(calls) if calls.len() == 1));
        assert!(matches!(groups[1], Group::Item(_)));
        assert!(matches!(&groups[2], Group::ToolCalls(calls) if calls.len() == 1));
    }

    #[test]
    fn test_serialized_and_opaque_items() {
        let transcript: Vec<TranscriptItem> = serde_json::from_value(json!([
            { "type": "reasoning", "id": "rs_1", "summary": [] },
            {
                "type": "message",
                "role": "assistant",
                "content": [
                    { "type": "output_text", "text": "I found" },
                    { "type": "image", "url": "https://example.com/crab.png" },
                    { "type": "output_text", "text": "a shell." }
                ]
            },
            { "type": "message", "role": "user", "content": "Nice!" },
            { "type": "message", "content": "No role given." }
        ]))
        .unwrap();
        let mut transcript = transcript;
        transcript.push(TranscriptItem::ToolResult(ToolResult {
            call_id: "c9".to_owned(),
            output: json!({ "exit_code": 0 }),
            extra: Map::new(),
        }));

        let encoded = ChatCompletions::encode(&ModelRequest::new(transcript), "m");
        assert_eq!(
            encoded.messages,
            [
                Message::Assistant {
                    content: Some("I found a shell.".to_owned()),
                    tool_calls: None,
                },
                Message::User {
                    content: "Nice!".to_owned(),
                },
                Message::Assistant {
                    content: Some("No role given.".to_owned()),
                    tool_calls: None,
                },
                Message::Tool {
                    tool_call_id: "c9".to_owned(),
                    content: r#"{"exit_code":0}"#.to_owned(),
                },
            ]
        );
    }

    #[test]
    fn test_web_search_is_dropped() {
        let mut request = ModelRequest::new([TranscriptItem::user("Hi")]);
        request.tools = vec![
            ModelTool::WebSearch,
            function_tool("shell"),
            function_tool("respond"),
        ];
        let encoded =
            serde_json::to_value(ChatCompletions::encode(&request, "m")).unwrap();

        assert_eq!(encoded["tool_choice"], "auto");
        let tools = encoded["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 2);
        assert!(tools.iter().all(|t| t["type"] == "function"));
        assert_eq!(tools[0]["function"]["name"], "shell");
        assert_eq!(tools[1]["function"]["description"], "The respond tool.");

        // Nothing left to offer, so no tool choice either.
        request.tools = vec![ModelTool::WebSearch];
        let encoded =
            serde_json::to_value(ChatCompletions::encode(&request, "m")).unwrap();
        assert!(encoded.get("tools").is_none());
        assert!(encoded.get("tool_choice").is_none());
    }

    #[test]
    fn test_normalize_text() {
        let result = ChatCompletions::normalize(completion(json!({
            "role": "assistant",
            "content": "The tide is low."
        })))
        .unwrap();
        assert_eq!(result.text.as_deref(), Some("The tide is low."));
        assert!(result.tool_calls.is_empty());
        assert_eq!(
            result.append_items,
            [TranscriptItem::assistant("The tide is low.")]
        );

        let result = ChatCompletions::normalize(completion(json!({
            "role": "assistant",
            "content": ""
        })))
        .unwrap();
        assert_eq!(result, CallResult::default());
    }

    #[test]
    fn test_normalize_tool_call() {
        let result = ChatCompletions::normalize(completion(json!({
            "role": "assistant",
            "content": "Let me check.",
            "tool_calls": [{
                "id": "c1",
                "type": "function",
                "function": {
                    "name": "shell",
                    "arguments": "{\"command\":\"echo hi\"}"
                }
            }]
        })))
        .unwrap();

        assert_eq!(
            result,
            CallResult {
                text: None,
                tool_calls: vec![ToolInvocation {
                    name: "shell".to_owned(),
                    arguments: json!({ "command": "echo hi" }),
                    call_id: "c1".to_owned(),
                }],
                append_items: vec![TranscriptItem::ToolCall(
                    TranscriptToolCall::new(
                        "c1",
                        "shell",
                        r#"{"command":"echo hi"}"#
                    )
                )],
            }
        );
    }

    #[test]
    fn test_bad_arguments_are_tolerated() {
        let result = ChatCompletions::normalize(completion(json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "c1",
                "type": "function",
                "function": { "name": "move", "arguments": "{bad json" }
            }]
        })))
        .unwrap();

        assert_eq!(result.tool_calls.len(), 1);
        assert_eq!(result.tool_calls[0].arguments, json!({}));
        // The raw arguments survive, so the call can be re-sent as is.
        let call = result.append_items[0].as_tool_call().unwrap();
        assert_eq!(call.arguments, "{bad json");
    }

    #[test]
    fn test_null_arguments_are_tolerated() {
        let result = ChatCompletions::normalize(completion(json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "c1",
                "type": "function",
                "function": { "name": "respond", "arguments": null }
            }]
        })))
        .unwrap();

        assert_eq!(result.tool_calls.len(), 1);
        assert_eq!(result.tool_calls[0].name, "respond");
        assert_eq!(result.tool_calls[0].arguments, json!({}));
        let call = result.append_items[0].as_tool_call().unwrap();
        assert_eq!(call.arguments, "{}");
    }

    #[test]
    fn test_normalized_calls_batch_again() {
        let result = ChatCompletions::normalize(completion(json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [
                {
                    "id": "c1",
                    "type": "function",
                    "function": { "name": "move", "arguments": "{}" }
                },
                {
                    "id": "c2",
                    "type": "function",
                    "function": { "name": "respond", "arguments": "{}" }
                }
            ]
        })))
        .unwrap();

        let mut transcript = vec![TranscriptItem::user("Hello?")];
        transcript.extend(result.append_items);
        let encoded = ChatCompletions::encode(&ModelRequest::new(transcript), "m");
        assert_eq!(encoded.messages.len(), 2);
        assert!(matches!(
            &encoded.messages[1],
            Message::Assistant { tool_calls: Some(calls), .. } if calls.len() == 2
        ));
    }

    #[test]
    fn test_normalize_malformed() {
        let resp: ChatCompletion =
            serde_json::from_value(json!({ "choices": [] })).unwrap();
        let err = ChatCompletions::normalize(resp).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);

        let resp = serde_json::from_value::<ChatCompletion>(json!({
            "error": "nope"
        }));
        assert!(resp.is_err());
    }
}
