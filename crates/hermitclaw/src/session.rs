use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::path::PathBuf;

use hermitclaw_core::tool::{CrabTool, Location, ToolCatalog};
use hermitclaw_core::{
    CallOptions, ModelClient, Transcript, UnmatchedToolResult,
};
use hermitclaw_model::{ModelProvider, ModelProviderError, ToolInvocation};

use crate::tools::run_command_line;

/// The number of model calls a single message may trigger.
pub const DEFAULT_MAX_STEPS: usize = 16;

type TextCallback = Box<dyn Fn(&str) + Send + Sync>;
type MoveCallback = Box<dyn Fn(Location) + Send + Sync>;

/// Errors that end a turn of a [`Session`].
#[derive(Debug)]
pub enum Error {
    /// The model provider failed.
    Model(Box<dyn ModelProviderError>),
    /// The model answered a tool call it never made.
    Transcript(UnmatchedToolResult),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Model(err) => {
                write!(f, "Model error ({}): {err}", err.kind())
            }
            Error::Transcript(err) => write!(f, "Transcript error: {err}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Model(err) => {
                let err: &(dyn StdError + 'static) = &**err;
                Some(err)
            }
            Error::Transcript(err) => Some(err),
        }
    }
}

impl From<Box<dyn ModelProviderError>> for Error {
    #[inline]
    fn from(err: Box<dyn ModelProviderError>) -> Self {
        Error::Model(err)
    }
}

impl From<UnmatchedToolResult> for Error {
    #[inline]
    fn from(err: UnmatchedToolResult) -> Self {
        Error::Transcript(err)
    }
}

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    client: ModelClient,
    system_prompt: Option<String>,
    box_dir: PathBuf,
    max_steps: usize,
    on_thought: Option<TextCallback>,
    on_speech: Option<TextCallback>,
    on_move: Option<MoveCallback>,
}

impl SessionBuilder {
    /// Creates a session builder with a specified model provider.
    pub fn with_model_provider<M: ModelProvider + 'static>(
        provider: M,
    ) -> Self {
        Self {
            client: ModelClient::new(provider),
            system_prompt: None,
            box_dir: PathBuf::from("."),
            max_steps: DEFAULT_MAX_STEPS,
            on_thought: None,
            on_speech: None,
            on_move: None,
        }
    }

    /// Sets the system prompt for the crab.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sets the directory the crab lives in. Shell commands run there.
    #[inline]
    pub fn with_box_dir<P: Into<PathBuf>>(mut self, box_dir: P) -> Self {
        self.box_dir = box_dir.into();
        self
    }

    /// Sets the number of model calls a single message may trigger.
    #[inline]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Replaces the tools offered to the model.
    #[inline]
    pub fn with_catalog(mut self, catalog: ToolCatalog) -> Self {
        self.client = self.client.with_catalog(catalog);
        self
    }

    /// Attaches a callback to be invoked with the text the model produces.
    #[inline]
    pub fn on_thought(
        mut self,
        on_thought: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.on_thought = Some(Box::new(on_thought));
        self
    }

    /// Attaches a callback to be invoked when the crab talks to its owner.
    #[inline]
    pub fn on_speech(
        mut self,
        on_speech: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.on_speech = Some(Box::new(on_speech));
        self
    }

    /// Attaches a callback to be invoked when the crab moves.
    #[inline]
    pub fn on_move(
        mut self,
        on_move: impl Fn(Location) + Send + Sync + 'static,
    ) -> Self {
        self.on_move = Some(Box::new(on_move));
        self
    }

    /// Builds a new session.
    pub fn build(self) -> Session {
        Session {
            client: self.client,
            options: CallOptions {
                instructions: self.system_prompt,
                ..Default::default()
            },
            box_dir: self.box_dir,
            max_steps: self.max_steps,
            on_thought: self.on_thought,
            on_speech: self.on_speech,
            on_move: self.on_move,
            transcript: Transcript::new(),
            location: Location::Center,
        }
    }
}

/// A crab's brain.
///
/// Every message starts a turn: the model is called with the transcript,
/// the tools it asks for are executed, and their results are fed back until
/// the model stops calling tools or the step limit is reached.
pub struct Session {
    client: ModelClient,
    options: CallOptions,
    box_dir: PathBuf,
    max_steps: usize,
    on_thought: Option<TextCallback>,
    on_speech: Option<TextCallback>,
    on_move: Option<MoveCallback>,
    transcript: Transcript,
    location: Location,
}

impl Session {
    /// Sends a message to the crab and runs the turn to its end.
    pub async fn send_message(&mut self, message: &str) -> Result<(), Error> {
        self.transcript.push_user(message);

        for step in 0..self.max_steps {
            let result = self
                .client
                .call(self.transcript.items(), self.options.clone())
                .await?;
            self.transcript.extend(result.append_items)?;

            if let (Some(text), Some(on_thought)) =
                (result.text.as_deref(), &self.on_thought)
            {
                on_thought(text);
            }
            if result.tool_calls.is_empty() {
                debug!("turn finished after {} step(s)", step + 1);
                return Ok(());
            }

            for invocation in &result.tool_calls {
                let output = self.execute(invocation).await;
                self.transcript
                    .push_tool_result(&invocation.call_id, output)?;
            }
        }

        warn!("turn stopped at the step limit ({})", self.max_steps);
        Ok(())
    }

    /// Returns everything said so far.
    #[inline]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Returns where the crab is in its room.
    #[inline]
    pub fn location(&self) -> Location {
        self.location
    }

    async fn execute(&mut self, invocation: &ToolInvocation) -> String {
        trace!("executing {}: {}", invocation.name, invocation.arguments);
        let tool = match CrabTool::from_invocation(invocation) {
            Ok(tool) => tool,
            Err(err) => {
                warn!("rejected a tool call: {err}");
                return format!("Error: {}", err.reason());
            }
        };

        match tool {
            CrabTool::Shell(params) => {
                match run_command_line(&params.command, &self.box_dir).await {
                    Ok(output) if output.is_empty() => "(no output)".to_owned(),
                    Ok(output) => output,
                    Err(err) => format!("Error: {err}"),
                }
            }
            CrabTool::Respond(params) => {
                if let Some(on_speech) = &self.on_speech {
                    on_speech(&params.message);
                }
                "Message delivered.".to_owned()
            }
            CrabTool::Move(params) => {
                self.location = params.location;
                if let Some(on_move) = &self.on_move {
                    on_move(params.location);
                }
                format!("You moved to the {}.", params.location)
            }
        }
    }
}
