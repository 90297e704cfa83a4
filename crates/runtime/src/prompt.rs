//! Prompt sent to the model for each user request.

use std::fmt::Write;

use crate::parser::{PARAMS_MARKER, TOOL_MARKER};
use crate::registry::ToolRegistry;

/// Render the tool list, the output format contract and the request.
pub fn build_prompt(registry: &ToolRegistry, request: &str) -> String {
    let mut prompt = String::from("Available tools:\n");
    for spec in registry.specs() {
        let _ = writeln!(
            prompt,
            "- {}({}): {}",
            spec.name,
            spec.arguments.join(", "),
            spec.description
        );
    }
    let _ = write!(
        prompt,
        "\nFor any user request, if a tool is needed, ONLY output in this format:\n\n\
         {TOOL_MARKER} tool_name\n\
         {PARAMS_MARKER} {{\"param1\": value1, ...}}\n\n\
         Do NOT output explanations, steps, or code. Only the tool call(s).\n\n\
         User request: {request}\n"
    );
    prompt
}
