use hermitclaw_model::{
    CallResult, ModelRequest, ModelTool, ToolInvocation, TranscriptItem,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Protocol;
use crate::Error;

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tool {
    Function {
        name: String,
        description: String,
        parameters: Value,
    },
    WebSearchPreview,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResponsesRequest {
    model: String,
    input: Vec<TranscriptItem>,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ResponsesResponse {
    pub output: Vec<TranscriptItem>,
}

// -----------
// Conversions
// -----------

/// The native protocol. Transcript items are already in its shape, so
/// requests carry them as they are and responses are kept verbatim.
#[derive(Clone, Copy, Debug)]
pub struct Responses;

impl Protocol for Responses {
    const PATH: &'static str = "/responses";

    type Request = ResponsesRequest;
    type Response = ResponsesResponse;

    fn encode(req: &ModelRequest, model: &str) -> ResponsesRequest {
        ResponsesRequest {
            model: model.to_owned(),
            input: req.transcript.clone(),
            max_output_tokens: req.max_output_tokens,
            instructions: req.instructions().map(ToOwned::to_owned),
            tools: req.tools.iter().map(create_tool).collect(),
        }
    }

    fn normalize(resp: ResponsesResponse) -> Result<CallResult, Error> {
        let mut text_parts = vec![];
        let mut tool_calls = vec![];
        for item in &resp.output {
            match item {
                TranscriptItem::Serialized(msg) => {
                    text_parts.extend(msg.content.texts());
                }
                TranscriptItem::ToolCall(call) => {
                    tool_calls.push(ToolInvocation::from_tool_call(call));
                }
                TranscriptItem::Opaque(opaque)
                    if opaque.kind() == Some("function_call") =>
                {
                    return Err(Error::malformed(
                        "function call item is missing required fields",
                    ));
                }
                _ => trace!("keeping output item as is: {item:?}"),
            }
        }

        let text = if text_parts.is_empty() {
            None
        } else {
            Some(text_parts.join("\n"))
        };

        Ok(CallResult {
            text,
            tool_calls,
            // The native protocol wants its own items echoed back
            // unchanged on the next request.
            append_items: resp.output,
        })
    }
}

#[inline]
fn create_tool(tool: &ModelTool) -> Tool {
    match tool {
        ModelTool::Function(function) => Tool::Function {
            name: function.name.clone(),
            description: function.description.clone(),
            parameters: function.parameters.clone(),
        },
        ModelTool::WebSearch => Tool::WebSearchPreview,
    }
}
