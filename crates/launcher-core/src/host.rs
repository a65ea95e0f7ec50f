use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::feedback::{Feedback, Item};

/// Lifecycle events delivered by the launcher, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    PreferencesLoaded {
        #[serde(default)]
        preferences: BTreeMap<String, String>,
    },
    PreferencesChanged {
        id: String,
        #[serde(default)]
        new_value: Option<String>,
    },
    Query {
        #[serde(default)]
        argument: Option<String>,
    },
    ItemSelected {
        #[serde(default)]
        data: BTreeMap<String, String>,
    },
}

impl HostEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PreferencesLoaded { .. } => "preferences_loaded",
            Self::PreferencesChanged { .. } => "preferences_changed",
            Self::Query { .. } => "query",
            Self::ItemSelected { .. } => "item_selected",
        }
    }

    pub fn from_json_line(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line.trim())
    }
}

/// Reply written for every event: exactly one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "output", rename_all = "snake_case")]
pub enum HostOutput {
    Render { items: Vec<Item> },
    Ack { event: String },
    Error { message: String },
}

impl HostOutput {
    pub fn render(feedback: Feedback) -> Self {
        Self::Render {
            items: feedback.items,
        }
    }

    pub fn ack(event: &HostEvent) -> Self {
        Self::Ack {
            event: event.name().to_string(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
