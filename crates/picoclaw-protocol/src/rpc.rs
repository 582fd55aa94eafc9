//! JSON-RPC 2.0 envelopes and the method params/results spoken on stdio.

use crate::audit::AuditEntry;
use crate::auth::{Grant, PolicyEntry};
use crate::campaign::{Guardrails, HaltReason};
use crate::message::{Message, ToolDefinition};
use crate::routing::{AgentBinding, DMScope, RouteInput};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC error codes used by the core. Decision outcomes (denials, halts)
/// are never transported as errors.
pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<u64>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl RpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id: Some(id),
            method: method.into(),
            params: Some(params),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: METHOD_NOT_FOUND,
            message: format!("method not found: {method}"),
            data: None,
        }
    }

    pub fn internal(message: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            code: INTERNAL_ERROR,
            message: message.into(),
            data: Some(Value::String(cause.into())),
        }
    }

    pub fn parse_error(cause: impl Into<String>) -> Self {
        Self {
            code: PARSE_ERROR,
            message: "parse error".to_owned(),
            data: Some(Value::String(cause.into())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn success(id: Option<u64>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<u64>, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// Either side of the wire: an incoming request or a callback response.
/// Requests carry `method`, so they are tried first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcFrame {
    Request(RpcRequest),
    Response(RpcResponse),
}

/// Parameters of the shell→core `process_message` method.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessMessageParams {
    #[serde(default)]
    pub route_input: RouteInput,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub bindings: Vec<AgentBinding>,
    #[serde(default)]
    pub default_agent: String,
    #[serde(default)]
    pub dm_scope: DMScope,
    #[serde(default)]
    pub tool_definitions: Vec<ToolDefinition>,
    #[serde(default)]
    pub max_iterations: i64,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub policy: Vec<PolicyEntry>,
    #[serde(default)]
    pub grants: Vec<Grant>,
    #[serde(default)]
    pub guardrails: Option<Guardrails>,
}

impl ProcessMessageParams {
    /// The loop's fuel. Non-positive wire values fall back to 10.
    pub fn fuel(&self) -> u64 {
        if self.max_iterations <= 0 {
            10
        } else {
            self.max_iterations as u64
        }
    }
}

/// Result of `process_message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessMessageResult {
    pub content: String,
    pub agent_id: String,
    pub session_key: String,
    pub audit_log: Vec<AuditEntry>,
    #[serde(default)]
    pub halt_reason: Option<HaltReason>,
}

/// Parameters of the core→shell `llm_call` callback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmCallParams {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,
    pub agent_id: String,
    pub request_id: String,
}

/// Parameters of the core→shell `execute_tool` callback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecuteToolParams {
    pub tool_name: String,
    /// Opaque JSON text, forwarded untouched from the model's tool call.
    #[serde(default)]
    pub arguments: String,
    pub agent_id: String,
    pub grant_proof: String,
    pub request_id: String,
}

/// Result of the shell→core `ping` method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingResult {
    pub status: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_decodes_request_and_response() {
        let request: RpcFrame = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
        )
        .unwrap();
        assert!(matches!(request, RpcFrame::Request(r) if r.method == "ping"));

        let response: RpcFrame = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":7,"result":{"content":"hi"}}"#,
        )
        .unwrap();
        match response {
            RpcFrame::Response(r) => {
                assert_eq!(r.id, Some(7));
                assert!(r.result.is_some());
            }
            RpcFrame::Request(_) => panic!("decoded a response as a request"),
        }
    }

    #[test]
    fn error_response_roundtrip() {
        let response = RpcResponse::failure(Some(3), RpcError::method_not_found("frobnicate"));
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("-32601"));
        let back: RpcResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, response);
    }

    #[test]
    fn fuel_defaults_to_ten() {
        let mut params = ProcessMessageParams::default();
        assert_eq!(params.fuel(), 10);
        params.max_iterations = -5;
        assert_eq!(params.fuel(), 10);
        params.max_iterations = 3;
        assert_eq!(params.fuel(), 3);
    }

    #[test]
    fn process_message_params_sparse_decode() {
        let params: ProcessMessageParams = serde_json::from_str(
            r#"{
                "route_input": {"channel": "telegram"},
                "content": "hello",
                "default_agent": "main",
                "request_id": "r1"
            }"#,
        )
        .unwrap();
        assert_eq!(params.default_agent, "main");
        assert!(params.bindings.is_empty());
        assert!(params.policy.is_empty());
        assert!(params.guardrails.is_none());
        assert_eq!(params.dm_scope, DMScope::Main);
    }

    #[test]
    fn result_halt_reason_encodes_null_when_absent() {
        let result = ProcessMessageResult {
            content: "done".to_owned(),
            agent_id: "main".to_owned(),
            session_key: "agent:main:main".to_owned(),
            audit_log: vec![],
            halt_reason: None,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"halt_reason\":null"));
    }
}
