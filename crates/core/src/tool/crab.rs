use std::fmt::{self, Display};

use hermitclaw_model::ToolInvocation;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{Error, ToolCatalog};

const SHELL_DESCRIPTION: &str = "\
Run a shell command inside your environment folder. \
You can use ls, cat, mkdir, mv, cp, touch, echo, tee, find, grep, head, \
tail, wc, etc. You can also run Python scripts: 'python script.py' or \
'python -c \"code\"'. Use 'cat > file.txt << EOF' or 'echo ... > file.txt' \
to write files. Create folders with mkdir. Organize however you like. \
All paths are relative to your environment root.";

const RESPOND_DESCRIPTION: &str = "\
Talk to your owner! Use this whenever you hear their voice and want to \
reply. After you speak, they might say something back. If they do, use \
respond AGAIN to keep the conversation going. You can go back and forth as \
many times as you like.";

const MOVE_DESCRIPTION: &str = "\
Move to a location in your room. Use this to go where feels natural for \
what you're doing: desk for writing, bookshelf for research, window for \
pondering, bed for resting.";

/// Arguments of the `shell` tool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ShellParameters {
    /// The shell command to run
    pub command: String,
}

/// Arguments of the `respond` tool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RespondParameters {
    /// What you say back to them
    pub message: String,
}

/// Arguments of the `move` tool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MoveParameters {
    /// Where to go
    pub location: Location,
}

/// A spot in the crab's room.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
#[schemars(inline)]
#[allow(missing_docs)]
pub enum Location {
    Desk,
    Bookshelf,
    Window,
    Plant,
    Bed,
    Rug,
    Center,
}

impl Location {
    /// Returns the name the model uses for this location.
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Desk => "desk",
            Location::Bookshelf => "bookshelf",
            Location::Window => "window",
            Location::Plant => "plant",
            Location::Bed => "bed",
            Location::Rug => "rug",
            Location::Center => "center",
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action requested by the model through the crab's catalog.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "name", content = "arguments", rename_all = "snake_case")]
pub enum CrabTool {
    /// Runs a command inside the box.
    Shell(ShellParameters),
    /// Says something to the owner.
    Respond(RespondParameters),
    /// Walks to another spot in the room.
    Move(MoveParameters),
}

impl CrabTool {
    const NAMES: [&'static str; 3] = ["shell", "respond", "move"];

    /// Decodes a tool invocation.
    ///
    /// Fails with [`ErrorKind::UnknownTool`](super::ErrorKind::UnknownTool)
    /// for names outside the catalog, and with
    /// [`ErrorKind::InvalidInput`](super::ErrorKind::InvalidInput) for
    /// arguments that don't fit the tool.
    pub fn from_invocation(invocation: &ToolInvocation) -> Result<Self, Error> {
        if !Self::NAMES.contains(&invocation.name.as_str()) {
            return Err(Error::unknown_tool().with_reason(format!(
                "no tool named \"{}\"",
                invocation.name
            )));
        }
        serde_json::from_value(json!({
            "name": invocation.name,
            "arguments": invocation.arguments,
        }))
        .map_err(|err| Error::invalid_input().with_reason(format!("{err}")))
    }
}

impl ToolCatalog {
    /// Returns the crab's catalog: web search, then `shell`, `respond` and
    /// `move`.
    pub fn crab() -> Self {
        Self::new()
            .with_web_search()
            .with_function::<ShellParameters>("shell", SHELL_DESCRIPTION)
            .with_function::<RespondParameters>("respond", RESPOND_DESCRIPTION)
            .with_function::<MoveParameters>("move", MOVE_DESCRIPTION)
    }
}
