//! Turning run and workflow events into terminal output.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::agent_loop::{RunEvent, RunEventPayload, RunLifecycle};
use crate::workflow::{OutputKind, RunPhase, WorkflowEvent};

const TOOL_OUTPUT_PREVIEW: usize = 200;

/// One piece of terminal output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// Streamed text that continues the current line.
    Inline(String),
    /// A line of its own.
    Block(String),
}

pub fn render_run_event(payload: &RunEventPayload) -> Option<Rendered> {
    let rendered = match payload {
        RunEventPayload::MessageStarted { agent } => Rendered::Block(format!("\n{agent}:")),
        RunEventPayload::AssistantDelta { text } => Rendered::Inline(text.clone()),
        RunEventPayload::Activity { text } => Rendered::Block(format!("\nACTIVITY:\n{}", text.trim())),
        RunEventPayload::ToolCallStarted { name, .. } => Rendered::Block(format!("Calling tool: {name}")),
        RunEventPayload::ToolResult {
            name,
            output,
            is_error,
            ..
        } => {
            let mark = if *is_error { "❌" } else { "✅" };
            Rendered::Block(format!("  {mark} {name}: {}", preview(&output.to_string())))
        }
        RunEventPayload::Usage { usage } => Rendered::Block(format!(
            "[Tokens Total: {}, Input: {}, Output: {}]",
            usage.total_tokens, usage.input_tokens, usage.output_tokens
        )),
        RunEventPayload::Lifecycle {
            state: RunLifecycle::Retrying { turn, attempt, error },
        } => Rendered::Block(format!(
            "↻ turn {turn} interrupted ({error}); output above is discarded, retrying (attempt {attempt})"
        )),
        RunEventPayload::Lifecycle {
            state: RunLifecycle::Failed { error },
        } => Rendered::Block(format!("❌ {error}")),
        _ => return None,
    };
    Some(rendered)
}

pub fn render_workflow_event(event: &WorkflowEvent) -> Option<String> {
    match event {
        WorkflowEvent::Status {
            phase: RunPhase::Running { .. },
            message: Some(message),
        } => Some(message.clone()),
        WorkflowEvent::Status {
            phase: RunPhase::Completed,
            ..
        } => Some("\nWorkflow State: IDLE".to_string()),
        WorkflowEvent::Output { output } => Some(match output.kind {
            OutputKind::Final => format!("\n🎉 Workflow Output: {}", output.text),
            OutputKind::Diagnostic => format!("\n⚠️ Workflow Output: {}", output.text),
        }),
        WorkflowEvent::Failed { cancelled: true, .. } => Some("\nWorkflow cancelled.".to_string()),
        WorkflowEvent::Failed { error, .. } => Some(format!("\n❌ Workflow failed: {error}")),
        _ => None,
    }
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(TOOL_OUTPUT_PREVIEW) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

/// Writes rendered output to stdout, breaking the line after streamed text
/// before anything else is printed.
#[derive(Debug, Default)]
pub struct Terminal {
    mid_line: AtomicBool,
}

impl Terminal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run_event(&self, event: &RunEvent) {
        if let Some(rendered) = render_run_event(&event.payload) {
            self.write(rendered);
        }
    }

    pub fn line(&self, text: impl Into<String>) {
        self.write(Rendered::Block(text.into()));
    }

    pub fn write(&self, rendered: Rendered) {
        let mut stdout = std::io::stdout().lock();
        let _ = match rendered {
            Rendered::Inline(text) => {
                self.mid_line.store(!text.ends_with('\n'), Ordering::SeqCst);
                write!(stdout, "{text}")
            }
            Rendered::Block(text) => {
                if self.mid_line.swap(false, Ordering::SeqCst) {
                    let _ = writeln!(stdout);
                }
                writeln!(stdout, "{text}")
            }
        };
        let _ = stdout.flush();
    }
}
