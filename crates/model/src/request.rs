use crate::tool::ModelTool;
use crate::transcript::TranscriptItem;

/// The output token budget used when the caller doesn't pick one.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2000;

/// A request to be sent to the model provider.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelRequest {
    /// The conversation so far, oldest item first.
    pub transcript: Vec<TranscriptItem>,
    /// The system instructions, if any.
    pub instructions: Option<String>,
    /// Tools that are available to the model. Empty means the model
    /// can't call any tool in this turn.
    pub tools: Vec<ModelTool>,
    /// The maximum number of tokens the model may produce.
    pub max_output_tokens: u32,
}

impl ModelRequest {
    /// Creates a request without instructions or tools, and with the
    /// default output token budget.
    #[inline]
    pub fn new(transcript: impl Into<Vec<TranscriptItem>>) -> Self {
        Self {
            transcript: transcript.into(),
            instructions: None,
            tools: vec![],
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }

    /// Returns the instructions, treating an empty string as absent.
    #[inline]
    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref().filter(|s| !s.is_empty())
    }
}
