//! Tool authorization: policy entries, grants, and decisions.

use serde::{Deserialize, Serialize};

/// Static authorization level for a tool name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthLevel {
    AlwaysAllowed,
    /// The implicit default when no policy entry matches.
    #[default]
    RequiresGrant,
    AlwaysDenied,
}

/// One row of the ordered policy table. First match wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyEntry {
    pub tool_name: String,
    pub level: AuthLevel,
}

impl PolicyEntry {
    pub fn new(tool_name: impl Into<String>, level: AuthLevel) -> Self {
        Self {
            tool_name: tool_name.into(),
            level,
        }
    }
}

/// A stamped, agent-scoped authorization token for one tool name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub tool_name: String,
    pub agent_id: String,
    pub issued_at: i64,
}

impl Grant {
    pub fn new(tool_name: impl Into<String>, agent_id: impl Into<String>, issued_at: i64) -> Self {
        Self {
            tool_name: tool_name.into(),
            agent_id: agent_id.into(),
            issued_at,
        }
    }

    /// Text encoding carried to the shell as `grant_proof`.
    pub fn proof(&self) -> String {
        format!("{}:{}:{}", self.tool_name, self.agent_id, self.issued_at)
    }
}

/// Outcome of authorizing one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AuthDecision {
    Authorized { grant: Grant },
    Denied { reason: String },
}

impl AuthDecision {
    pub fn is_authorized(&self) -> bool {
        matches!(self, AuthDecision::Authorized { .. })
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        AuthDecision::Denied {
            reason: reason.into(),
        }
    }
}
