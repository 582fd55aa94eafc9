//! Audit journal rows: tagged events and hash-chained entries.

use serde::{Deserialize, Serialize};

/// The event taxonomy recorded by the core. Each variant carries one opaque
/// detail payload; the variant tag participates in the entry hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail", rename_all = "snake_case")]
pub enum AuditEvent {
    RouteResolved(String),
    ToolAuthorized(String),
    ToolDenied(String),
    ToolExecuted(String),
    LlmCallStarted(String),
    LlmCallCompleted(String),
    SessionCreated(String),
    MessageProcessed(String),
    ApertureMetering(String),
    CerbosDecision(String),
}

impl AuditEvent {
    /// Stable snake_case tag, identical to the wire form and the hash input.
    pub fn tag(&self) -> &'static str {
        match self {
            AuditEvent::RouteResolved(_) => "route_resolved",
            AuditEvent::ToolAuthorized(_) => "tool_authorized",
            AuditEvent::ToolDenied(_) => "tool_denied",
            AuditEvent::ToolExecuted(_) => "tool_executed",
            AuditEvent::LlmCallStarted(_) => "llm_call_started",
            AuditEvent::LlmCallCompleted(_) => "llm_call_completed",
            AuditEvent::SessionCreated(_) => "session_created",
            AuditEvent::MessageProcessed(_) => "message_processed",
            AuditEvent::ApertureMetering(_) => "aperture_metering",
            AuditEvent::CerbosDecision(_) => "cerbos_decision",
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            AuditEvent::RouteResolved(d)
            | AuditEvent::ToolAuthorized(d)
            | AuditEvent::ToolDenied(d)
            | AuditEvent::ToolExecuted(d)
            | AuditEvent::LlmCallStarted(d)
            | AuditEvent::LlmCallCompleted(d)
            | AuditEvent::SessionCreated(d)
            | AuditEvent::MessageProcessed(d)
            | AuditEvent::ApertureMetering(d)
            | AuditEvent::CerbosDecision(d) => d,
        }
    }
}

/// One hash-chained journal row.
///
/// `hash` covers every other field; `prev_hash` of entry 0 is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub sequence: u64,
    /// Milliseconds since the UNIX epoch.
    pub timestamp: i64,
    pub event: AuditEvent,
    pub agent_id: String,
    pub session_key: String,
    pub prev_hash: String,
    pub request_id: String,
    pub hash: String,
}
