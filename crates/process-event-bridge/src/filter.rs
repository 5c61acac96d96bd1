//! Event forwarding filter.

use crate::ProcessEvent;
use relay_config_and_utils::EventToggles;
use std::collections::HashSet;

/// Decides which events are forwarded.
#[derive(Debug, Clone)]
pub struct EventFilter {
    log: bool,
    error: bool,
    exception: bool,
    kill: bool,
    lifecycle: HashSet<String>,
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::from(&EventToggles::default())
    }
}

impl From<&EventToggles> for EventFilter {
    fn from(toggles: &EventToggles) -> Self {
        Self {
            log: toggles.log,
            error: toggles.error,
            exception: toggles.exception,
            kill: toggles.kill,
            lifecycle: toggles.lifecycle.iter().cloned().collect(),
        }
    }
}

impl EventFilter {
    pub fn allows(&self, event: &ProcessEvent) -> bool {
        match event {
            ProcessEvent::LogOut { .. } => self.log,
            ProcessEvent::LogErr { .. } => self.error,
            ProcessEvent::Exception { .. } => self.exception,
            ProcessEvent::Lifecycle { event, .. } => self.lifecycle.contains(event),
            ProcessEvent::Kill { .. } => self.kill,
        }
    }
}
