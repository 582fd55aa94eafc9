//! Append-only hash-chained audit journal.
//!
//! Every decision the core takes lands here. Entries link through
//! `prev_hash`, so insertion or mutation anywhere but the tail is detectable
//! by [`chain_valid`]. Producers never verify chains; only the validator
//! does.

use picoclaw_protocol::{AuditEntry, AuditEvent};
use sha2::{Digest, Sha256};

pub type AuditLog = Vec<AuditEntry>;

/// SHA-256 hex over the canonical `"|"`-joined field encoding.
pub fn entry_hash(
    sequence: u64,
    timestamp: i64,
    event: &AuditEvent,
    agent_id: &str,
    session_key: &str,
    prev_hash: &str,
    request_id: &str,
) -> String {
    let canonical = format!(
        "{sequence}|{timestamp}|{}|{}|{agent_id}|{session_key}|{prev_hash}|{request_id}",
        event.tag(),
        event.detail(),
    );
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

/// Recompute an entry's hash from its stored fields.
pub fn recompute(entry: &AuditEntry) -> String {
    entry_hash(
        entry.sequence,
        entry.timestamp,
        &entry.event,
        &entry.agent_id,
        &entry.session_key,
        &entry.prev_hash,
        &entry.request_id,
    )
}

/// Append one event, linking it to the current tail. Returns the grown log.
pub fn append(
    mut log: AuditLog,
    timestamp: i64,
    event: AuditEvent,
    agent_id: &str,
    session_key: &str,
    request_id: &str,
) -> AuditLog {
    let sequence = log.len() as u64;
    let prev_hash = log.last().map(|entry| entry.hash.clone()).unwrap_or_default();
    let hash = entry_hash(
        sequence,
        timestamp,
        &event,
        agent_id,
        session_key,
        &prev_hash,
        request_id,
    );
    log.push(AuditEntry {
        sequence,
        timestamp,
        event,
        agent_id: agent_id.to_owned(),
        session_key: session_key.to_owned(),
        prev_hash,
        request_id: request_id.to_owned(),
        hash,
    });
    log
}

/// Validate sequence continuity, prev-hash linkage, and every stored hash.
/// Empty logs are valid; a singleton needs sequence 0 and an empty
/// `prev_hash`.
pub fn chain_valid(log: &[AuditEntry]) -> bool {
    for (index, entry) in log.iter().enumerate() {
        if entry.sequence != index as u64 {
            return false;
        }
        let expected_prev = if index == 0 {
            ""
        } else {
            log[index - 1].hash.as_str()
        };
        if entry.prev_hash != expected_prev {
            return false;
        }
        if entry.hash != recompute(entry) {
            return false;
        }
    }
    true
}

pub fn log_route(
    log: AuditLog,
    timestamp: i64,
    detail: impl Into<String>,
    agent_id: &str,
    session_key: &str,
    request_id: &str,
) -> AuditLog {
    append(
        log,
        timestamp,
        AuditEvent::RouteResolved(detail.into()),
        agent_id,
        session_key,
        request_id,
    )
}

pub fn log_tool_auth(
    log: AuditLog,
    timestamp: i64,
    authorized: bool,
    detail: impl Into<String>,
    agent_id: &str,
    session_key: &str,
    request_id: &str,
) -> AuditLog {
    let event = if authorized {
        AuditEvent::ToolAuthorized(detail.into())
    } else {
        AuditEvent::ToolDenied(detail.into())
    };
    append(log, timestamp, event, agent_id, session_key, request_id)
}

pub fn log_tool_exec(
    log: AuditLog,
    timestamp: i64,
    detail: impl Into<String>,
    agent_id: &str,
    session_key: &str,
    request_id: &str,
) -> AuditLog {
    append(
        log,
        timestamp,
        AuditEvent::ToolExecuted(detail.into()),
        agent_id,
        session_key,
        request_id,
    )
}

pub fn log_llm_call(
    log: AuditLog,
    timestamp: i64,
    completed: bool,
    detail: impl Into<String>,
    agent_id: &str,
    session_key: &str,
    request_id: &str,
) -> AuditLog {
    let event = if completed {
        AuditEvent::LlmCallCompleted(detail.into())
    } else {
        AuditEvent::LlmCallStarted(detail.into())
    };
    append(log, timestamp, event, agent_id, session_key, request_id)
}

pub fn log_session_created(
    log: AuditLog,
    timestamp: i64,
    detail: impl Into<String>,
    agent_id: &str,
    session_key: &str,
    request_id: &str,
) -> AuditLog {
    append(
        log,
        timestamp,
        AuditEvent::SessionCreated(detail.into()),
        agent_id,
        session_key,
        request_id,
    )
}

pub fn log_message_processed(
    log: AuditLog,
    timestamp: i64,
    detail: impl Into<String>,
    agent_id: &str,
    session_key: &str,
    request_id: &str,
) -> AuditLog {
    append(
        log,
        timestamp,
        AuditEvent::MessageProcessed(detail.into()),
        agent_id,
        session_key,
        request_id,
    )
}

pub fn log_metering(
    log: AuditLog,
    timestamp: i64,
    detail: impl Into<String>,
    agent_id: &str,
    session_key: &str,
    request_id: &str,
) -> AuditLog {
    append(
        log,
        timestamp,
        AuditEvent::ApertureMetering(detail.into()),
        agent_id,
        session_key,
        request_id,
    )
}

pub fn log_policy_decision(
    log: AuditLog,
    timestamp: i64,
    detail: impl Into<String>,
    agent_id: &str,
    session_key: &str,
    request_id: &str,
) -> AuditLog {
    append(
        log,
        timestamp,
        AuditEvent::CerbosDecision(detail.into()),
        agent_id,
        session_key,
        request_id,
    )
}
