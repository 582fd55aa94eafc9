//! Session value: append-only message history plus a growing summary.

use crate::message::Message;
use serde::{Deserialize, Serialize};

/// Per-conversation state keyed by the resolved session key.
///
/// `message_count` counts every message ever added, including ones later
/// folded into `summary`; it never decreases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub key: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub message_count: u64,
}

impl Session {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }
}
