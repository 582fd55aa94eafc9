//! # picoclaw-runtime — Stdio JSON-RPC Runtime
//!
//! The I/O boundary around the pure decision core. A single serial loop
//! reads framed requests from stdin, drives the agent loop to completion,
//! and suspends on exactly two callback sites (`llm_call`, `execute_tool`)
//! by reading frames until the correlated response arrives. One request at
//! a time; one outstanding callback at a time.
//!
//! The session map is the only state that outlives a request. It is owned
//! here, cloned into each request's [`LoopState`], and written back when the
//! loop finishes; the core itself never touches shared state.

pub mod framing;

pub use framing::{FrameReader, FrameWriter};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::Mutex;
use picoclaw_core::agent_loop::{self, Classification, LoopState};
use picoclaw_core::{campaign, routing};
use picoclaw_protocol::{
    AuthDecision, CoreError, CoreResult, ExecuteToolParams, LLMResponse, LlmCallParams,
    PingResult, ProcessMessageParams, ProcessMessageResult, ResolvedRoute, RpcError, RpcFrame,
    RpcRequest, RpcResponse, Session, ToolResult,
};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The callback seam between the core and its shell. The stdio transport
/// implements this by round-tripping framed JSON-RPC requests; tests plug in
/// mocks.
#[async_trait]
pub trait ShellPort: Send {
    async fn llm_call(&mut self, params: LlmCallParams) -> CoreResult<LLMResponse>;
    async fn execute_tool(&mut self, params: ExecuteToolParams) -> CoreResult<ToolResult>;
}

/// The verified core's runtime: session cache plus request dispatcher.
#[derive(Default)]
pub struct Runtime {
    sessions: Mutex<IndexMap<String, Session>>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot a session by key (primarily for the shell's diagnostics and
    /// for tests; the protocol itself never exposes sessions).
    pub fn session_snapshot(&self, session_key: &str) -> Option<Session> {
        self.sessions.lock().get(session_key).cloned()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Serve framed JSON-RPC on the given streams until clean EOF.
    ///
    /// Strictly serial: each request is dispatched to completion before the
    /// next frame is read. Returns `Err` only for fatal transport failures.
    pub async fn serve<R, W>(&self, input: R, output: W) -> CoreResult<()>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        let mut reader = FrameReader::new(input);
        let mut writer = FrameWriter::new(output);
        let mut next_callback_id: u64 = 0;

        while let Some(payload) = reader.read_frame().await? {
            let response = match serde_json::from_slice::<RpcFrame>(&payload) {
                Err(err) => {
                    warn!(error = %err, "unparseable frame");
                    RpcResponse::failure(None, RpcError::parse_error(err.to_string()))
                }
                Ok(RpcFrame::Response(response)) => {
                    warn!(id = ?response.id, "dropping response with no pending callback");
                    continue;
                }
                Ok(RpcFrame::Request(request)) => {
                    self.dispatch(request, &mut reader, &mut writer, &mut next_callback_id)
                        .await?
                }
            };
            let bytes = serde_json::to_vec(&response)
                .map_err(|err| CoreError::Transport(format!("response encode failed: {err}")))?;
            writer.write_frame(&bytes).await?;
        }

        info!("stdin closed, shutting down");
        Ok(())
    }

    async fn dispatch<R, W>(
        &self,
        request: RpcRequest,
        reader: &mut FrameReader<R>,
        writer: &mut FrameWriter<W>,
        next_callback_id: &mut u64,
    ) -> CoreResult<RpcResponse>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        match request.method.as_str() {
            "ping" => {
                let result = PingResult {
                    status: "ok".to_owned(),
                    version: CORE_VERSION.to_owned(),
                };
                Ok(RpcResponse::success(
                    request.id,
                    serde_json::to_value(result).unwrap_or(Value::Null),
                ))
            }
            "process_message" => {
                let params: ProcessMessageParams =
                    match serde_json::from_value(request.params.unwrap_or(Value::Null)) {
                        Ok(params) => params,
                        Err(err) => {
                            return Ok(RpcResponse::failure(
                                request.id,
                                RpcError::internal("invalid process_message params", err.to_string()),
                            ));
                        }
                    };
                let mut shell = StdioShell {
                    reader,
                    writer,
                    next_id: next_callback_id,
                };
                let result = self.process_message(&mut shell, params).await?;
                let value = serde_json::to_value(result).map_err(|err| {
                    CoreError::Transport(format!("result encode failed: {err}"))
                })?;
                Ok(RpcResponse::success(request.id, value))
            }
            other => Ok(RpcResponse::failure(
                request.id,
                RpcError::method_not_found(other),
            )),
        }
    }

    /// Process one inbound message end to end.
    ///
    /// Decision outcomes (denials, halts, recovered callback errors) are
    /// data in the result; `Err` is reserved for fatal transport failures.
    #[instrument(
        skip(self, shell, params),
        fields(channel = %params.route_input.channel, request_id = %params.request_id)
    )]
    pub async fn process_message(
        &self,
        shell: &mut dyn ShellPort,
        params: ProcessMessageParams,
    ) -> CoreResult<ProcessMessageResult> {
        let request_id = if params.request_id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            params.request_id.clone()
        };

        let route = routing::resolve_route(
            &params.bindings,
            &params.default_agent,
            params.dm_scope,
            &params.route_input,
        );
        info!(
            agent_id = %route.agent_id,
            session_key = %route.session_key,
            matched_by = route.matched_by.as_str(),
            "route resolved"
        );

        let session = self
            .sessions
            .lock()
            .get(&route.session_key)
            .cloned()
            .unwrap_or_else(|| Session::new(&route.session_key));

        let (state, content, halt_reason) = self
            .drive_loop(shell, &params, &route, session, &request_id)
            .await?;

        self.sessions
            .lock()
            .insert(route.session_key.clone(), state.session.clone());
        info!(
            iterations = state.iteration,
            audit_entries = state.audit_log.len(),
            halt_reason = ?halt_reason,
            "message processed"
        );

        Ok(ProcessMessageResult {
            content,
            agent_id: route.agent_id,
            session_key: route.session_key,
            audit_log: state.audit_log,
            halt_reason,
        })
    }

    /// Drive the fuel-bounded loop, suspending on shell callbacks.
    async fn drive_loop(
        &self,
        shell: &mut dyn ShellPort,
        params: &ProcessMessageParams,
        route: &ResolvedRoute,
        session: Session,
        request_id: &str,
    ) -> CoreResult<(LoopState, String, Option<picoclaw_protocol::HaltReason>)> {
        let guardrails = params.guardrails.unwrap_or_default();
        let fuel = params.fuel();
        let started = Utc::now();
        let mut state =
            agent_loop::init_loop(route, session, &params.content, request_id, now_ms());

        'drive: loop {
            if let Some(reason) = campaign::should_halt(&state.campaign, &guardrails) {
                info!(reason = ?reason, "guardrail halt");
                let (state, content) = agent_loop::halt(state, reason, now_ms());
                break 'drive Ok((state, content, Some(reason)));
            }
            if agent_loop::fuel_remaining(&state, fuel) == 0 {
                debug!(fuel, "fuel exhausted");
                let state = agent_loop::finalize(
                    state,
                    format!("halted: {}", agent_loop::FUEL_EXHAUSTED),
                    now_ms(),
                );
                break 'drive Ok((state, agent_loop::FUEL_EXHAUSTED.to_owned(), None));
            }

            debug!(iteration = state.iteration, "issuing llm_call");
            let llm_params = LlmCallParams {
                messages: state.messages.clone(),
                tools: params.tool_definitions.clone(),
                agent_id: state.agent_id.clone(),
                request_id: request_id.to_owned(),
            };
            let response = match shell.llm_call(llm_params).await {
                Ok(response) => response,
                Err(CoreError::Callback(message)) => {
                    warn!(error = %message, "llm_call callback failed");
                    let (state, content) =
                        agent_loop::record_iteration_error(state, &message, now_ms());
                    break 'drive Ok((state, content, None));
                }
                Err(fatal) => return Err(fatal),
            };

            let elapsed_delta =
                elapsed_minutes(started).saturating_sub(state.campaign.elapsed_minutes);
            let (next, classification) =
                agent_loop::apply_response(state, &response, elapsed_delta, now_ms());
            state = next;

            let calls = match classification {
                Classification::Final(content) => {
                    let state = agent_loop::finalize(state, "response sent", now_ms());
                    break 'drive Ok((state, content, None));
                }
                Classification::ToolCalls(calls) => calls,
            };

            for call in &calls {
                let (next, decision) = agent_loop::authorize_call(
                    state,
                    call,
                    &params.policy,
                    &params.grants,
                    guardrails.read_only,
                    now_ms(),
                );
                state = next;
                match decision {
                    AuthDecision::Authorized { grant } => {
                        let exec_params = ExecuteToolParams {
                            tool_name: call.tool_name().to_owned(),
                            arguments: call.arguments().to_owned(),
                            agent_id: state.agent_id.clone(),
                            grant_proof: grant.proof(),
                            request_id: request_id.to_owned(),
                        };
                        match shell.execute_tool(exec_params).await {
                            Ok(result) => {
                                state =
                                    agent_loop::record_tool_result(state, call, &result, now_ms());
                            }
                            Err(CoreError::Callback(message)) => {
                                warn!(error = %message, "execute_tool callback failed");
                                let (state, content) =
                                    agent_loop::record_iteration_error(state, &message, now_ms());
                                break 'drive Ok((state, content, None));
                            }
                            Err(fatal) => return Err(fatal),
                        }
                    }
                    AuthDecision::Denied { reason } => {
                        debug!(tool = call.tool_name(), %reason, "tool call denied");
                        state = agent_loop::record_denied_call(state, call, &reason);
                    }
                }
            }
        }
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn elapsed_minutes(started: DateTime<Utc>) -> u64 {
    (Utc::now() - started).num_minutes().max(0) as u64
}

/// [`ShellPort`] over the live stdio streams: writes a callback request with
/// a fresh monotonic id, then keeps reading frames until the matching
/// response arrives. Interleaved requests are refused with a busy error;
/// mismatched response ids are dropped with a diagnostic.
struct StdioShell<'a, R, W> {
    reader: &'a mut FrameReader<R>,
    writer: &'a mut FrameWriter<W>,
    next_id: &'a mut u64,
}

impl<R, W> StdioShell<'_, R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn call(&mut self, method: &str, params: Value) -> CoreResult<Value> {
        *self.next_id += 1;
        let id = *self.next_id;
        let request = RpcRequest::new(id, method, params);
        let bytes = serde_json::to_vec(&request)
            .map_err(|err| CoreError::Transport(format!("callback encode failed: {err}")))?;
        self.writer.write_frame(&bytes).await?;

        loop {
            let payload = self.reader.read_frame().await?.ok_or_else(|| {
                CoreError::Transport(
                    "stdin closed while awaiting a callback response".to_owned(),
                )
            })?;
            match serde_json::from_slice::<RpcFrame>(&payload) {
                Ok(RpcFrame::Response(response)) if response.id == Some(id) => {
                    if let Some(error) = response.error {
                        return Err(CoreError::Callback(format!(
                            "{} (code {})",
                            error.message, error.code
                        )));
                    }
                    return Ok(response.result.unwrap_or(Value::Null));
                }
                Ok(RpcFrame::Response(response)) => {
                    warn!(got = ?response.id, expected = id, "dropping mismatched callback response");
                }
                Ok(RpcFrame::Request(interleaved)) => {
                    warn!(method = %interleaved.method, "request received while a callback is pending");
                    let busy = RpcResponse::failure(
                        interleaved.id,
                        RpcError::internal("core busy", "a callback response is pending"),
                    );
                    let bytes = serde_json::to_vec(&busy).map_err(|err| {
                        CoreError::Transport(format!("busy response encode failed: {err}"))
                    })?;
                    self.writer.write_frame(&bytes).await?;
                }
                Err(err) => {
                    warn!(error = %err, "unparseable frame while awaiting callback response");
                    let parse_failure =
                        RpcResponse::failure(None, RpcError::parse_error(err.to_string()));
                    let bytes = serde_json::to_vec(&parse_failure).map_err(|err| {
                        CoreError::Transport(format!("error response encode failed: {err}"))
                    })?;
                    self.writer.write_frame(&bytes).await?;
                }
            }
        }
    }
}

#[async_trait]
impl<R, W> ShellPort for StdioShell<'_, R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn llm_call(&mut self, params: LlmCallParams) -> CoreResult<LLMResponse> {
        let params = serde_json::to_value(params)
            .map_err(|err| CoreError::Transport(format!("llm_call encode failed: {err}")))?;
        let result = self.call("llm_call", params).await?;
        serde_json::from_value(result)
            .map_err(|err| CoreError::Callback(format!("invalid llm_call response: {err}")))
    }

    async fn execute_tool(&mut self, params: ExecuteToolParams) -> CoreResult<ToolResult> {
        let params = serde_json::to_value(params)
            .map_err(|err| CoreError::Transport(format!("execute_tool encode failed: {err}")))?;
        let result = self.call("execute_tool", params).await?;
        serde_json::from_value(result)
            .map_err(|err| CoreError::Callback(format!("invalid execute_tool response: {err}")))
    }
}
