use serde_json::Value;

/// Describes a tool that can be used by the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModelTool {
    /// A function the caller executes on the model's behalf.
    Function(FunctionTool),
    /// The provider's built-in web search.
    ///
    /// Only the native protocol offers it. Encoders for other protocols
    /// leave it out of the request instead of failing.
    WebSearch,
}

impl ModelTool {
    /// Returns the function description, if this is a function tool.
    #[inline]
    pub fn as_function(&self) -> Option<&FunctionTool> {
        match self {
            ModelTool::Function(function) => Some(function),
            ModelTool::WebSearch => None,
        }
    }
}

/// A function tool exposed to the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionTool {
    /// Name of the tool.
    pub name: String,
    /// Description of the tool.
    pub description: String,
    /// Parameters definition of the tool.
    ///
    /// For most model providers, the parameters should typically be
    /// defined by a [JSON schema](https://json-schema.org/).
    pub parameters: Value,
}
