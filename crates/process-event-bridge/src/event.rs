//! Process event model.

use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Process-manager identifier, numeric or symbolic.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ProcessId {
    Number(u64),
    Name(String),
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Name(s) => f.write_str(s),
        }
    }
}

/// The process an event came from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProcessInfo {
    pub name: String,
    #[serde(default, alias = "pm_id")]
    pub id: Option<ProcessId>,
}

/// An event emitted by the process manager.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ProcessEvent {
    /// Line written to stdout.
    #[serde(rename = "log:out")]
    LogOut {
        #[serde(default)]
        process: Option<ProcessInfo>,
        data: Value,
    },
    /// Line written to stderr.
    #[serde(rename = "log:err")]
    LogErr {
        #[serde(default)]
        process: Option<ProcessInfo>,
        data: Value,
    },
    /// Uncaught exception.
    #[serde(rename = "process:exception")]
    Exception {
        #[serde(default)]
        process: Option<ProcessInfo>,
        data: Value,
    },
    /// Lifecycle transition such as `restart` or `exit`.
    #[serde(rename = "process:event")]
    Lifecycle { process: ProcessInfo, event: String },
    /// The process manager itself is shutting down.
    #[serde(rename = "pm2:kill")]
    Kill { msg: String },
}

impl ProcessEvent {
    /// Plain stdout line with no known process.
    pub fn plain(line: &str) -> Self {
        Self::LogOut {
            process: None,
            data: Value::String(line.to_string()),
        }
    }

    pub fn process(&self) -> Option<&ProcessInfo> {
        match self {
            Self::LogOut { process, .. }
            | Self::LogErr { process, .. }
            | Self::Exception { process, .. } => process.as_ref(),
            Self::Lifecycle { process, .. } => Some(process),
            Self::Kill { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_log_event() {
        let event: ProcessEvent = serde_json::from_str(
            r#"{"type": "log:out", "process": {"name": "api", "pm_id": 3}, "data": "listening\n"}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            ProcessEvent::LogOut {
                process: Some(ProcessInfo {
                    name: "api".to_string(),
                    id: Some(ProcessId::Number(3)),
                }),
                data: json!("listening\n"),
            }
        );
    }

    #[test]
    fn parses_lifecycle_event() {
        let event: ProcessEvent = serde_json::from_str(
            r#"{"type": "process:event", "process": {"name": "worker", "id": "w1"}, "event": "restart"}"#,
        )
        .unwrap();
        assert_eq!(event.process().map(|p| p.name.as_str()), Some("worker"));
        match event {
            ProcessEvent::Lifecycle { process, event } => {
                assert_eq!(event, "restart");
                assert_eq!(process.id.map(|id| id.to_string()).as_deref(), Some("w1"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_structured_exception() {
        let event: ProcessEvent = serde_json::from_str(
            r#"{"type": "process:exception", "process": {"name": "api"}, "data": {"message": "boom", "stack": "at x"}}"#,
        )
        .unwrap();
        assert!(matches!(event, ProcessEvent::Exception { ref data, .. } if data["message"] == "boom"));
    }

    #[test]
    fn kill_has_no_process() {
        let event: ProcessEvent =
            serde_json::from_str(r#"{"type": "pm2:kill", "msg": "pm2 has been killed"}"#).unwrap();
        assert!(event.process().is_none());
    }

    #[test]
    fn unknown_type_rejected() {
        assert!(serde_json::from_str::<ProcessEvent>(r#"{"type": "nope"}"#).is_err());
    }
}
