//! The tools offered to the model.

mod crab;
mod error;

use hermitclaw_model::{FunctionTool, ModelTool};
use schemars::{JsonSchema, schema_for};

pub use crab::{
    CrabTool, Location, MoveParameters, RespondParameters, ShellParameters,
};
pub use error::{Error, ErrorKind};

/// An ordered list of tools offered to the model. Requests keep the order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolCatalog {
    tools: Vec<ModelTool>,
}

impl ToolCatalog {
    /// Creates an empty catalog.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the provider's built-in web search.
    #[inline]
    pub fn with_web_search(mut self) -> Self {
        self.tools.push(ModelTool::WebSearch);
        self
    }

    /// Appends a function tool whose parameter schema is derived from `P`.
    pub fn with_function<P: JsonSchema>(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.tools.push(ModelTool::Function(FunctionTool {
            name: name.into(),
            description: description.into(),
            parameters: schema_for!(P).to_value(),
        }));
        self
    }

    /// Returns the tools in order.
    #[inline]
    pub fn tools(&self) -> &[ModelTool] {
        &self.tools
    }

    /// Returns `true` if the catalog offers no tool.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Returns the function tool named `name`.
    pub fn function(&self, name: &str) -> Option<&FunctionTool> {
        self.tools
            .iter()
            .filter_map(ModelTool::as_function)
            .find(|function| function.name == name)
    }
}

impl From<Vec<ModelTool>> for ToolCatalog {
    #[inline]
    fn from(tools: Vec<ModelTool>) -> Self {
        Self { tools }
    }
}
