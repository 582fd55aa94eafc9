//! The fuel-bounded agent loop as an explicit state machine.
//!
//! Each function consumes a [`LoopState`] and returns the successor state,
//! so the runtime can suspend on its model and tool callbacks between
//! transitions while the decision logic stays pure and testable. The
//! iteration counter strictly increases once per applied model response and
//! fuel bounds the number of responses, so every drive of this machine
//! terminates.

use crate::{audit, campaign, session, toolauth};
use crate::audit::AuditLog;
use picoclaw_protocol::{
    AuthDecision, CampaignState, Grant, HaltReason, LLMResponse, Message, PolicyEntry,
    ResolvedRoute, Session, ToolCall, ToolResult,
};

/// Final-response sentinel when the loop runs out of model-call fuel.
pub const FUEL_EXHAUSTED: &str = "fuel exhausted";

/// Everything one `process_message` request threads through its iterations.
#[derive(Debug, Clone)]
pub struct LoopState {
    pub session: Session,
    pub audit_log: AuditLog,
    /// The model window: summary context plus this request's traffic.
    pub messages: Vec<Message>,
    pub iteration: u64,
    pub agent_id: String,
    pub request_id: String,
    pub campaign: CampaignState,
}

/// What a model response means for the loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// No tool calls: the content is the final answer.
    Final(String),
    /// Tool calls to authorize and execute, in array order.
    ToolCalls(Vec<ToolCall>),
}

/// Start a request: append the user message, build the model window, and
/// open the audit log with the resolved route.
pub fn init_loop(
    route: &ResolvedRoute,
    session: Session,
    user_content: &str,
    request_id: &str,
    now: i64,
) -> LoopState {
    let session = session::add_message(session, Message::user(user_content));
    let messages = session::build_context(&session);
    let audit_log = audit::log_route(
        AuditLog::new(),
        now,
        format!(
            "agent '{}' via {} on {}",
            route.agent_id,
            route.matched_by.as_str(),
            route.channel
        ),
        &route.agent_id,
        &route.session_key,
        request_id,
    );

    LoopState {
        session,
        audit_log,
        messages,
        iteration: 0,
        agent_id: route.agent_id.clone(),
        request_id: request_id.to_owned(),
        campaign: CampaignState::default(),
    }
}

/// Model calls left before the fuel bound trips.
pub fn fuel_remaining(state: &LoopState, fuel: u64) -> u64 {
    fuel.saturating_sub(state.iteration)
}

/// Fold a model response into the state and classify the next step.
///
/// The assistant message keeps content and tool calls together, even when
/// the loop will iterate, and lands in both the session and the window.
/// The iteration counter advances exactly once.
pub fn apply_response(
    mut state: LoopState,
    response: &LLMResponse,
    elapsed_minutes: u64,
    now: i64,
) -> (LoopState, Classification) {
    let assistant = response.to_message();
    state.session = session::add_message(state.session, assistant.clone());
    state.messages.push(assistant);

    state.audit_log = audit::log_llm_call(
        state.audit_log,
        now,
        true,
        format!("iteration {}", state.iteration),
        &state.agent_id,
        &state.session.key,
        &state.request_id,
    );
    if let Some(usage) = &response.usage {
        if usage.total > 0 {
            state.audit_log = audit::log_metering(
                state.audit_log,
                now,
                format!(
                    "tokens prompt={} completion={} total={}",
                    usage.prompt, usage.completion, usage.total
                ),
                &state.agent_id,
                &state.session.key,
                &state.request_id,
            );
        }
    }

    state.iteration += 1;
    state.campaign = campaign::record_iteration(state.campaign, elapsed_minutes);

    let classification = if response.tool_calls.is_empty() {
        Classification::Final(response.content.clone())
    } else {
        Classification::ToolCalls(response.tool_calls.clone())
    };
    (state, classification)
}

/// Authorize one requested tool call and record the decision.
///
/// Read-only guardrails pre-empt the policy table for the blocked set; the
/// decision is appended to the audit log either way.
pub fn authorize_call(
    mut state: LoopState,
    call: &ToolCall,
    policy: &[PolicyEntry],
    grants: &[Grant],
    read_only: bool,
    now: i64,
) -> (LoopState, AuthDecision) {
    let tool_name = call.tool_name();
    let decision = if read_only && toolauth::read_only_blocks(tool_name) {
        AuthDecision::denied(format!("tool '{tool_name}' denied: read-only mode"))
    } else {
        toolauth::authorize(tool_name, &state.agent_id, policy, grants, now)
    };

    let detail = match &decision {
        AuthDecision::Authorized { .. } => {
            format!("tool '{tool_name}' for agent '{}'", state.agent_id)
        }
        AuthDecision::Denied { reason } => reason.clone(),
    };
    state.audit_log = audit::log_tool_auth(
        state.audit_log,
        now,
        decision.is_authorized(),
        detail,
        &state.agent_id,
        &state.session.key,
        &state.request_id,
    );
    (state, decision)
}

/// Record an executed tool call: audit entry, tool message in session and
/// window, and campaign accounting including the reported cost.
pub fn record_tool_result(
    mut state: LoopState,
    call: &ToolCall,
    result: &ToolResult,
    now: i64,
) -> LoopState {
    let tool_name = call.tool_name();
    let detail = if result.is_error {
        format!("tool '{tool_name}' failed")
    } else {
        format!("tool '{tool_name}' completed")
    };
    state.audit_log = audit::log_tool_exec(
        state.audit_log,
        now,
        detail,
        &state.agent_id,
        &state.session.key,
        &state.request_id,
    );

    let tool_message = Message::tool(call.id.clone(), result.for_llm.clone());
    state.session = session::add_message(state.session, tool_message.clone());
    state.messages.push(tool_message);

    state.campaign = campaign::record_tool_call(state.campaign, result.cost_cents);
    state
}

/// A denied call skips execution; the model still sees why.
pub fn record_denied_call(mut state: LoopState, call: &ToolCall, reason: &str) -> LoopState {
    let tool_message = Message::tool(call.id.clone(), reason.to_owned());
    state.session = session::add_message(state.session, tool_message.clone());
    state.messages.push(tool_message);
    state
}

/// Recover a callback failure into data: the audit trail records the error
/// and the caller receives the partial final content.
pub fn record_iteration_error(
    mut state: LoopState,
    message: &str,
    now: i64,
) -> (LoopState, String) {
    state.audit_log = audit::log_message_processed(
        state.audit_log,
        now,
        format!("error: {message}"),
        &state.agent_id,
        &state.session.key,
        &state.request_id,
    );
    let content = format!("the agent encountered an error: {message}");
    (state, content)
}

/// Stop for a guardrail reason; returns the sentinel final content.
pub fn halt(mut state: LoopState, reason: HaltReason, now: i64) -> (LoopState, String) {
    state.audit_log = audit::log_message_processed(
        state.audit_log,
        now,
        format!("halted: {}", reason.sentinel()),
        &state.agent_id,
        &state.session.key,
        &state.request_id,
    );
    (state, reason.sentinel().to_owned())
}

/// Close out a normally-completed (or fuel-exhausted) request.
pub fn finalize(mut state: LoopState, detail: impl Into<String>, now: i64) -> LoopState {
    state.audit_log = audit::log_message_processed(
        state.audit_log,
        now,
        detail,
        &state.agent_id,
        &state.session.key,
        &state.request_id,
    );
    state
}
