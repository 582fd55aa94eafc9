//! # picoclaw-protocol — Verified Core Wire Contract
//!
//! Shared types spoken between the PicoClaw decision core and its outer
//! shell: chat messages, routing inputs, authorization policy, audit
//! entries, campaign guardrails, and the JSON-RPC envelopes that frame
//! them on stdio.
//!
//! This crate is intentionally dependency-light (serde + thiserror only)
//! so it can serve as a pure contract crate for both the core and any
//! shell-side tooling.
//!
//! ## Module Overview
//!
//! - [`message`] — Role, Message, ToolCall, LLMResponse, ToolResult
//! - [`routing`] — RouteInput, AgentBinding, DMScope, ResolvedRoute
//! - [`auth`] — AuthLevel, PolicyEntry, Grant, AuthDecision
//! - [`audit`] — AuditEvent, AuditEntry (hash-chained journal rows)
//! - [`campaign`] — Guardrails, CampaignState, HaltReason
//! - [`session`] — Session (append-only history + summary)
//! - [`rpc`] — JSON-RPC 2.0 envelopes and method params/results
//! - [`error`] — CoreError taxonomy

pub mod audit;
pub mod auth;
pub mod campaign;
pub mod error;
pub mod message;
pub mod routing;
pub mod rpc;
pub mod session;

pub use audit::{AuditEntry, AuditEvent};
pub use auth::{AuthDecision, AuthLevel, Grant, PolicyEntry};
pub use campaign::{CampaignState, Guardrails, HaltReason};
pub use error::{CoreError, CoreResult};
pub use message::{
    FunctionCall, LLMResponse, Message, Role, ToolCall, ToolDefinition, ToolResult, UsageInfo,
};
pub use routing::{AgentBinding, BindingMatch, DMScope, MatchReason, ResolvedRoute, RouteInput,
    RoutePeer};
pub use rpc::{
    ExecuteToolParams, LlmCallParams, PingResult, ProcessMessageParams, ProcessMessageResult,
    RpcError, RpcFrame, RpcRequest, RpcResponse, JSONRPC_VERSION,
};
pub use session::Session;
