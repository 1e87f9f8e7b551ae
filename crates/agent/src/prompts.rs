//! Prompt text for the planner and executor.

use tasksmith_core::plan::Task;

pub const PLANNER_SYSTEM_PROMPT: &str = "\
You are an expert software engineer tasked with planning code changes.

Your job is to:
1. Thoroughly analyze the codebase structure
2. Understand the existing patterns and conventions
3. Create a detailed, actionable plan to complete the requested changes

Use the available tools to explore the codebase:
- Use list_files to understand the project structure
- Use read_file to examine key files (README, package.json, go.mod, Cargo.toml, etc.)
- Use search to find relevant code patterns
- Use bash for commands like 'find', 'ls -la', etc.

After exploration, provide your plan in this format:
PLAN:
1. [Specific task description]
2. [Specific task description]
...

Each task should be concrete and actionable. Focus on:
- Understanding before changing
- Following existing patterns
- Making incremental, testable changes
- Ensuring the code remains functional";

pub const EXECUTOR_SYSTEM_PROMPT: &str = "\
You are an expert software engineer implementing specific tasks.

Your approach should be:
1. First understand the existing code by reading relevant files
2. Follow existing patterns and conventions in the codebase
3. Make changes incrementally and test when possible
4. Ensure your changes don't break existing functionality
5. Write clean, maintainable code

Important guidelines:
- Always read before writing to understand context
- Follow the existing code style and patterns
- Test your changes when possible using bash commands
- Create directories before writing files to them
- Handle errors gracefully
- When task is complete, explicitly state \"Task completed\" with a summary

Be thorough but efficient. Focus on correctness over speed.";

/// Sent with tools disabled once the exploration budget is spent.
pub const FINAL_PLAN_REQUEST: &str = "Based on your exploration, please provide a concrete plan in the format:\nPLAN:\n1. [Task description]\n2. [Task description]\n...";

/// Sent when an exploration round ends with neither tool calls nor a plan.
pub const CONTINUE_PLANNING: &str = "Please continue exploring with the available tools, or provide your plan in the format:\nPLAN:\n1. [Task description]\n...";

/// Sent when the first execution round answers without using tools.
pub const PROCEED_WITH_TOOLS: &str =
    "Please proceed with implementing this task using the available tools.";

/// Output recorded for a task whose round budget ran out.
pub const EXHAUSTED_OUTPUT: &str = "Task completed (max iterations reached)";

/// The first user turn of a planning conversation.
pub fn planning_request(request: &str) -> String {
    format!(
        "Please analyze this codebase and create a detailed plan to complete the following request:

REQUEST: {request}

First, explore the codebase structure to understand:
1. The project layout and key files
2. The technology stack and dependencies
3. Existing patterns and conventions
4. Relevant code sections for this task

Then provide a concrete, step-by-step plan to complete the request."
    )
}

/// The first user turn of a task conversation.
pub fn task_request(completed: &[Task], task: &Task, original_request: &str) -> String {
    let mut context = String::new();
    if !completed.is_empty() {
        context.push_str("Previously completed tasks:\n");
        for t in completed {
            context.push_str("- ");
            context.push_str(&t.description);
            context.push('\n');
        }
        context.push('\n');
    }

    format!(
        "{context}Current task to implement:
{description}

Original request context: {original_request}

Please implement this task step by step. Use the available tools to:
1. Read relevant files to understand the code
2. Make necessary changes
3. Test your changes if applicable
4. Verify the implementation

When the task is complete, say \"Task completed\" with a brief summary.",
        description = task.description,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planning_request_embeds_request() {
        let prompt = planning_request("add a health endpoint");
        assert!(prompt.contains("REQUEST: add a health endpoint"));
    }

    #[test]
    fn task_request_without_history_has_no_digest() {
        let task = Task::new(1, "Add the route");
        let prompt = task_request(&[], &task, "add a health endpoint");
        assert!(prompt.starts_with("Current task to implement:\nAdd the route"));
        assert!(prompt.contains("Original request context: add a health endpoint"));
    }

    #[test]
    fn task_request_lists_completed_descriptions() {
        let done = vec![Task::new(1, "Add the route"), Task::new(2, "Write handler")];
        let task = Task::new(3, "Add a test");
        let prompt = task_request(&done, &task, "req");
        assert!(prompt.starts_with(
            "Previously completed tasks:\n- Add the route\n- Write handler\n\nCurrent task to implement:\nAdd a test"
        ));
    }
}
