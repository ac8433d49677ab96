//! Rule-based chat agent over the task store.
//!
//! Understands a handful of imperative forms (`add <title>`,
//! `complete <title>`, `delete <title>`, `list`) and records a
//! [`ToolCall`] per task operation so clients can render what the
//! agent actually did.

use serde_json::json;

use taskdeck_api::chat::{ToolCall, ToolStatus};

use crate::state::StubState;

/// Result of running one user message through the agent.
pub struct AgentReply {
    /// Natural-language response text.
    pub response: String,
    /// Task operations performed (or attempted) for this message.
    pub tool_calls: Vec<ToolCall>,
}

/// Interprets `message` for `user_id` and applies any task operation it
/// names.
#[must_use]
pub fn respond(state: &StubState, user_id: &str, message: &str) -> AgentReply {
    let trimmed = message.trim();
    let lower = trimmed.to_lowercase();

    if let Some(title) = strip_verb(trimmed, &lower, &["add ", "create "]) {
        return add_task(state, user_id, title);
    }
    if let Some(title) = strip_verb(trimmed, &lower, &["complete ", "finish ", "done "]) {
        return complete_task(state, user_id, title);
    }
    if let Some(title) = strip_verb(trimmed, &lower, &["delete ", "remove "]) {
        return delete_task(state, user_id, title);
    }
    if lower == "list" || lower.contains("list") {
        return list_tasks(state, user_id);
    }

    AgentReply {
        response: "I can manage your tasks. Try `add <title>`, `complete <title>`, \
                   `delete <title>`, or `list`."
            .to_string(),
        tool_calls: Vec::new(),
    }
}

/// If the lowercased message starts with one of `verbs`, returns the
/// remainder of the original message (casing preserved).
fn strip_verb<'a>(original: &'a str, lower: &str, verbs: &[&str]) -> Option<&'a str> {
    for verb in verbs {
        if lower.starts_with(verb) {
            let rest = original[verb.len()..].trim();
            if !rest.is_empty() {
                return Some(rest);
            }
        }
    }
    None
}

fn add_task(state: &StubState, user_id: &str, title: &str) -> AgentReply {
    let task = state.create_task(user_id, title, None);
    AgentReply {
        response: format!("Created task \"{}\".", task.title),
        tool_calls: vec![ToolCall {
            name: "create_task".to_string(),
            input: json!({ "title": title }),
            output: Some(json!({ "id": task.id.as_str() })),
            status: Some(ToolStatus::Completed),
        }],
    }
}

fn complete_task(state: &StubState, user_id: &str, title: &str) -> AgentReply {
    let Some(task) = state.find_task_by_title(user_id, title) else {
        return not_found("complete_task", title);
    };
    let completed = state.toggle_task(user_id, &task.id, true);
    AgentReply {
        response: format!("Marked \"{}\" as done.", task.title),
        tool_calls: vec![ToolCall {
            name: "complete_task".to_string(),
            input: json!({ "title": title }),
            output: completed.map(|t| json!({ "id": t.id.as_str(), "completed": t.completed })),
            status: Some(ToolStatus::Completed),
        }],
    }
}

fn delete_task(state: &StubState, user_id: &str, title: &str) -> AgentReply {
    let Some(task) = state.find_task_by_title(user_id, title) else {
        return not_found("delete_task", title);
    };
    let deleted = state.delete_task(user_id, &task.id);
    AgentReply {
        response: format!("Deleted \"{}\".", task.title),
        tool_calls: vec![ToolCall {
            name: "delete_task".to_string(),
            input: json!({ "title": title }),
            output: Some(json!({ "deleted": deleted })),
            status: Some(ToolStatus::Completed),
        }],
    }
}

fn list_tasks(state: &StubState, user_id: &str) -> AgentReply {
    let (tasks, total) = state.list_tasks(user_id, u32::MAX, 0);
    let response = if tasks.is_empty() {
        "You have no tasks.".to_string()
    } else {
        let lines: Vec<String> = tasks
            .iter()
            .map(|t| {
                let mark = if t.completed { "x" } else { " " };
                format!("[{mark}] {}", t.title)
            })
            .collect();
        format!("You have {total} task(s):\n{}", lines.join("\n"))
    };
    AgentReply {
        response,
        tool_calls: vec![ToolCall {
            name: "list_tasks".to_string(),
            input: json!({}),
            output: Some(json!({ "total": total })),
            status: Some(ToolStatus::Completed),
        }],
    }
}

fn not_found(tool: &str, title: &str) -> AgentReply {
    AgentReply {
        response: format!("I couldn't find a task called \"{title}\"."),
        tool_calls: vec![ToolCall {
            name: tool.to_string(),
            input: json!({ "title": title }),
            output: None,
            status: Some(ToolStatus::Failed),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_creates_a_task() {
        let state = StubState::new();
        let reply = respond(&state, "alice", "add Buy milk");
        assert!(reply.response.contains("Buy milk"));
        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_calls[0].name, "create_task");
        assert!(state.find_task_by_title("alice", "Buy milk").is_some());
    }

    #[test]
    fn complete_matches_title_case_insensitively() {
        let state = StubState::new();
        let task = state.create_task("alice", "Buy milk", None);
        let reply = respond(&state, "alice", "complete buy MILK");
        assert_eq!(reply.tool_calls[0].status, Some(ToolStatus::Completed));
        assert!(state.get_task("alice", &task.id).unwrap().completed);
    }

    #[test]
    fn delete_unknown_title_reports_failure() {
        let state = StubState::new();
        let reply = respond(&state, "alice", "delete Ghost task");
        assert!(reply.response.contains("couldn't find"));
        assert_eq!(reply.tool_calls[0].status, Some(ToolStatus::Failed));
    }

    #[test]
    fn list_enumerates_tasks() {
        let state = StubState::new();
        let _ = state.create_task("alice", "One", None);
        let _ = state.create_task("alice", "Two", None);
        let reply = respond(&state, "alice", "list");
        assert!(reply.response.contains("One"));
        assert!(reply.response.contains("Two"));
    }

    #[test]
    fn unrecognized_message_gets_help_without_tool_calls() {
        let state = StubState::new();
        let reply = respond(&state, "alice", "how is the weather?");
        assert!(reply.tool_calls.is_empty());
        assert!(reply.response.contains("add"));
    }
}
