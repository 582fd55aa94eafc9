//! Tool authorization: ordered policy lookup plus dynamic grants.

use picoclaw_protocol::{AuthDecision, AuthLevel, Grant, PolicyEntry};

/// Tools a read-only campaign may never execute, regardless of policy.
pub const READ_ONLY_BLOCKED_TOOLS: [&str; 3] = ["write_file", "exec_command", "delete_file"];

/// True when `read_only` guardrails force a denial for this tool.
pub fn read_only_blocks(tool_name: &str) -> bool {
    READ_ONLY_BLOCKED_TOOLS.contains(&tool_name)
}

/// First-match policy lookup; the implicit default is `RequiresGrant`.
pub fn lookup(policy: &[PolicyEntry], tool_name: &str) -> AuthLevel {
    policy
        .iter()
        .find(|entry| entry.tool_name == tool_name)
        .map(|entry| entry.level)
        .unwrap_or_default()
}

/// Decide one tool invocation for one agent.
///
/// `AlwaysAllowed` mints a fresh grant stamped at `timestamp`;
/// `RequiresGrant` needs a grant matching both tool and agent.
pub fn authorize(
    tool_name: &str,
    agent_id: &str,
    policy: &[PolicyEntry],
    grants: &[Grant],
    timestamp: i64,
) -> AuthDecision {
    match lookup(policy, tool_name) {
        AuthLevel::AlwaysDenied => {
            AuthDecision::denied(format!("tool '{tool_name}' is always denied"))
        }
        AuthLevel::AlwaysAllowed => AuthDecision::Authorized {
            grant: Grant::new(tool_name, agent_id, timestamp),
        },
        AuthLevel::RequiresGrant => match grants
            .iter()
            .find(|grant| grant.tool_name == tool_name && grant.agent_id == agent_id)
        {
            Some(grant) => AuthDecision::Authorized {
                grant: grant.clone(),
            },
            None => AuthDecision::denied(format!(
                "no grant for tool '{tool_name}' agent '{agent_id}'"
            )),
        },
    }
}

/// Length-preserving batch form of [`authorize`].
pub fn authorize_many(
    tool_names: &[String],
    agent_id: &str,
    policy: &[PolicyEntry],
    grants: &[Grant],
    timestamp: i64,
) -> Vec<AuthDecision> {
    tool_names
        .iter()
        .map(|name| authorize(name, agent_id, policy, grants, timestamp))
        .collect()
}
