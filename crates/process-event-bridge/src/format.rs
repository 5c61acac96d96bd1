//! Event to chat text.

use crate::{EventFilter, ProcessEvent};
use serde_json::Value;

/// Opening fence for log payloads.
pub const FENCE_OPEN: &str = "```js";

/// Render an event as chat text.
///
/// Returns `None` when the event is disabled, comes from `self_name`, or
/// carries no text.
pub fn format_event(event: &ProcessEvent, filter: &EventFilter, self_name: &str) -> Option<String> {
    if event.process().is_some_and(|p| p.name == self_name) {
        return None;
    }
    if !filter.allows(event) {
        return None;
    }

    match event {
        ProcessEvent::LogOut { data, .. }
        | ProcessEvent::LogErr { data, .. }
        | ProcessEvent::Exception { data, .. } => fenced(data),
        ProcessEvent::Lifecycle { process, event } => {
            let id = process
                .id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string());
            Some(format!(
                "Event occurred on {} [{}]: {}",
                process.name, id, event
            ))
        }
        ProcessEvent::Kill { msg } => Some(msg.clone()),
    }
}

fn fenced(data: &Value) -> Option<String> {
    let text = match data {
        Value::String(s) => s.clone(),
        Value::Null => return None,
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    };
    let text = text.trim_end_matches(['\n', '\r']);
    if text.is_empty() {
        return None;
    }
    Some(format!("{}\n{}\n```", FENCE_OPEN, text))
}
