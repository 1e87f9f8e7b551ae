//! Console rendering of run events.

use tasksmith_core::event::RunEvent;

const HEAVY_RULE: &str = "═══════════════════════════════════════════";
const LIGHT_RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

pub fn banner(title: &str) -> String {
    format!("\n{HEAVY_RULE}\n       {title}\n{HEAVY_RULE}\n")
}

fn phase(title: &str) -> String {
    format!("\n{LIGHT_RULE}\n  {title}\n{LIGHT_RULE}")
}

/// The console text for one event, if it has any.
pub fn render(event: &RunEvent) -> Option<String> {
    let text = match event {
        RunEvent::RunStarted {
            working_dir,
            request,
            ..
        } => format!(
            "{}\n📁 Working Directory: {working_dir}\n📝 Request: {request}",
            banner("🤖 Tasksmith Starting")
        ),
        RunEvent::PlanningStarted { .. } => format!(
            "{}\n\n🔍 Analyzing codebase and generating plan...",
            phase("Phase 1: Planning")
        ),
        RunEvent::ExplorationStep { tool_name, .. } => format!("  📂 Exploring: {tool_name}"),
        RunEvent::PlanCreated { tasks, .. } => {
            let mut out = format!("\n✅ Generated plan with {} tasks\n", tasks.len());
            out.push_str("\n📋 Generated Plan:\n─────────────────\n");
            for (i, task) in tasks.iter().enumerate() {
                out.push_str(&format!("{}. {task}\n", i + 1));
            }
            out.push_str(&format!("\nTotal tasks: {}\n", tasks.len()));
            out.push_str(&phase("Phase 2: Execution"));
            out
        }
        RunEvent::TaskStarted {
            description,
            position,
            total,
            ..
        } => format!("\n[{position}/{total}] 🔧 Executing: {description}"),
        RunEvent::ToolInvoked {
            tool_name,
            summary,
            success,
            ..
        } => {
            let mark = if *success { "" } else { " (failed)" };
            if summary.is_empty() {
                format!("  🔨 {tool_name}{mark}")
            } else {
                format!("  🔨 {tool_name}: {summary}{mark}")
            }
        }
        RunEvent::TaskCompleted { exhausted, .. } => {
            if *exhausted {
                "  ⚠️  Stopped at the round limit, marked complete".to_string()
            } else {
                "  ✅ Task completed".to_string()
            }
        }
        RunEvent::TaskFailed { error, .. } => format!("  ❌ Task failed: {error}"),
        RunEvent::ResponseGenerated { .. } | RunEvent::RunFinished { .. } => return None,
    };
    Some(text)
}
