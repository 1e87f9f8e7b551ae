//! Running a batch of tool calls and shaping the results for the model.

use std::time::Instant;

use tasksmith_core::tool::{ToolCall, ToolRegistry, ToolResult};
use tracing::{debug, warn};

/// Output cap for one tool result, with the marker appended on truncation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OutputLimit {
    pub chars: usize,
    pub marker: &'static str,
}

/// Cut `output` to `limit.chars` characters and append the marker.
pub(crate) fn truncate_output(mut output: String, limit: OutputLimit) -> String {
    if let Some((cut, _)) = output.char_indices().nth(limit.chars) {
        output.truncate(cut);
        output.push_str(limit.marker);
    }
    output
}

/// Run each call in order. Failures become error results carrying
/// `Error: <reason>`; nothing here aborts the loop.
pub(crate) async fn run_actions(
    tools: &ToolRegistry,
    calls: &[ToolCall],
    limit: OutputLimit,
    mut observe: impl FnMut(&ToolCall, &ToolResult, u64),
) -> Vec<ToolResult> {
    let mut results = Vec::with_capacity(calls.len());

    for call in calls {
        let start = Instant::now();
        let outcome = tools.execute(call).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(output) => ToolResult::ok(&call.id, truncate_output(output, limit)),
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool execution failed");
                ToolResult::error(&call.id, truncate_output(format!("Error: {e}"), limit))
            }
        };

        debug!(
            tool = %call.name,
            duration_ms,
            bytes = result.output.len(),
            is_error = result.is_error,
            "Tool executed"
        );
        observe(call, &result, duration_ms);
        results.push(result);
    }

    results
}
