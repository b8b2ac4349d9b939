//! The capability offered to the model during generation

use gamesmith_runtime::{ToolCall, ToolDefinition, RUN_CODE_TOOL};
use serde::Deserialize;

/// Arguments of a `run_code` call
#[derive(Debug, Clone, Deserialize)]
pub struct RunCode {
    pub code: String,
}

/// What the model asked for, once its tool call has been read
#[derive(Debug, Clone)]
pub enum ToolRequest {
    RunCode(RunCode),
    /// A call that cannot be served; the message goes back as the tool result
    Rejected(String),
}

impl ToolRequest {
    pub fn from_call(call: &ToolCall) -> Self {
        if call.name != RUN_CODE_TOOL {
            return Self::Rejected(format!(
                "error: unknown tool `{}`; the only available tool is `{}`",
                call.name, RUN_CODE_TOOL
            ));
        }
        match call.parse_arguments::<RunCode>() {
            Ok(args) => Self::RunCode(args),
            Err(e) => Self::Rejected(format!(
                "error: invalid arguments for `{}`: {}. Pass {{\"code\": \"<python source>\"}}",
                RUN_CODE_TOOL, e
            )),
        }
    }
}

pub fn run_code_definition() -> ToolDefinition {
    ToolDefinition::new(
        RUN_CODE_TOOL,
        "Run a complete Python game so the player can play it. Returns the session \
         transcript: everything printed plus each prompt with the player's answer.",
    )
    .with_parameters(serde_json::json!({
        "type": "object",
        "properties": {
            "code": {
                "type": "string",
                "description": "Complete Python source of the game"
            }
        },
        "required": ["code"],
        "additionalProperties": false
    }))
}
