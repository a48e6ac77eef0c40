//! MCP server implementation for DealX ad search.
//!
//! The server reads one frame at a time, answers it completely (including
//! any upstream HTTP call), and only then reads the next. There is no
//! handshake gate: `initialize` is answered when sent, but tools are usable
//! without it.

use std::future::Future;

use serde::Serialize;
use serde_json::json;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::mcp::protocol::{
    methods, parse_message, IncomingMessage, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, RequestId, ToolCallParams, MCP_PROTOCOL_VERSION, SERVER_NAME,
};
use crate::mcp::transport::{StdioTransport, Transport};
use crate::tools::ToolRegistry;

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    pub tools: ToolCapabilities,
}

/// Tool-specific capabilities.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolCapabilities {
    /// Whether the tool list can change during the session.
    #[serde(rename = "listChanged", skip_serializing_if = "is_false")]
    pub list_changed: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires a predicate fn(&T) -> bool
const fn is_false(b: &bool) -> bool {
    !*b
}

/// Server information for initialisation response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// The MCP server for DealX ad search.
pub struct McpServer {
    /// Tools exposed to the client.
    registry: ToolRegistry,
}

impl McpServer {
    /// Creates a new MCP server serving the given tools.
    #[must_use]
    pub const fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    /// Runs the server on stdio until EOF or a shutdown signal.
    ///
    /// # Errors
    ///
    /// Returns an error if signal registration or transport I/O fails.
    pub async fn run(&self) -> std::io::Result<()> {
        let mut transport = StdioTransport::stdio();
        self.run_until(&mut transport, shutdown_signal()?).await
    }

    /// Serves frames until EOF or until `shutdown` completes.
    ///
    /// `shutdown` is raced against both reading and handling, so a request
    /// stuck on a slow upstream does not delay shutdown. The interrupted
    /// request gets no reply.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn run_until<R, W, S>(
        &self,
        transport: &mut Transport<R, W>,
        shutdown: S,
    ) -> std::io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => return Ok(()),

                frame = transport.read_frame() => {
                    let Some(frame) = frame? else {
                        tracing::info!("Input closed");
                        return Ok(());
                    };

                    tokio::select! {
                        () = &mut shutdown => {
                            tracing::info!("Abandoning in-flight request");
                            return Ok(());
                        }
                        handled = self.handle_frame(transport, &frame) => handled?,
                    }
                }
            }
        }
    }

    /// Serves frames from `transport` until its input is closed.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn serve<R, W>(&self, transport: &mut Transport<R, W>) -> std::io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        self.run_until(transport, std::future::pending()).await
    }

    /// Handles a single frame of input.
    ///
    /// Frames that cannot be decoded are logged and otherwise ignored.
    async fn handle_frame<R, W>(
        &self,
        transport: &mut Transport<R, W>,
        frame: &[u8],
    ) -> std::io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let Ok(line) = std::str::from_utf8(frame) else {
            tracing::warn!(bytes = frame.len(), "Ignoring message that is not valid UTF-8");
            return Ok(());
        };

        if line.trim().is_empty() {
            return Ok(());
        }

        match parse_message(line) {
            Ok(IncomingMessage::Request(req)) => match self.handle_request(req).await {
                Ok(resp) => transport.write_response(&resp).await,
                Err(error) => transport.write_error(&error).await,
            },
            Ok(IncomingMessage::Notification(notif)) => {
                tracing::debug!(method = %notif.method, "Received notification");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring undecodable message");
                match e.reply() {
                    Some(error) => transport.write_error(error).await,
                    None => Ok(()),
                }
            }
        }
    }

    /// Handles a decoded request.
    ///
    /// # Errors
    ///
    /// Returns the JSON-RPC error to send back for unknown methods, malformed
    /// parameters, and tool-level protocol errors.
    pub async fn handle_request(
        &self,
        req: JsonRpcRequest,
    ) -> Result<JsonRpcResponse, JsonRpcError> {
        tracing::debug!(method = %req.method, id = %req.id, "Handling request");

        match req.method.as_str() {
            methods::INITIALIZE => Ok(Self::handle_initialize(&req)),
            methods::PING => Ok(JsonRpcResponse::success(req.id, json!({}))),
            methods::TOOLS_LIST | methods::LIST_TOOLS => Ok(self.handle_tools_list(req.id)),
            methods::TOOLS_CALL | methods::CALL_TOOL => self.handle_tools_call(req).await,
            _ => Err(JsonRpcError::method_not_found(req.id, &req.method)),
        }
    }

    /// Handles the initialize request.
    fn handle_initialize(req: &JsonRpcRequest) -> JsonRpcResponse {
        let result = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": ServerCapabilities::default(),
            "serverInfo": ServerInfo::default(),
        });

        JsonRpcResponse::success(req.id.clone(), result)
    }

    /// Handles the tools/list request.
    fn handle_tools_list(&self, id: RequestId) -> JsonRpcResponse {
        JsonRpcResponse::success(id, json!({ "tools": self.registry.definitions() }))
    }

    /// Handles the tools/call request.
    async fn handle_tools_call(
        &self,
        req: JsonRpcRequest,
    ) -> Result<JsonRpcResponse, JsonRpcError> {
        let params: ToolCallParams = req
            .params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| {
                JsonRpcError::invalid_params(req.id.clone(), format!("Invalid tool call params: {e}"))
            })?
            .ok_or_else(|| JsonRpcError::invalid_params(req.id.clone(), "Missing tool call params"))?;

        let result = self
            .registry
            .dispatch(&params.name, params.arguments)
            .await
            .map_err(|e| {
                tracing::debug!(tool = %params.name, error = %e, "Tool call rejected");
                JsonRpcError::with_message(req.id.clone(), e.code(), e.to_string())
            })?;

        let result_value = serde_json::to_value(&result).map_err(|e| {
            tracing::error!(error = %e, "Failed to serialise tool call result");
            JsonRpcError::internal_error(req.id.clone(), "Internal error: failed to serialise result")
        })?;

        Ok(JsonRpcResponse::success(req.id, result_value))
    }
}

/// Completes on SIGINT or SIGTERM.
#[cfg(unix)]
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    Ok(async move {
        tokio::select! {
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT, initiating graceful shutdown");
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, initiating graceful shutdown");
            }
        }
    })
}

/// Completes on Ctrl+C.
#[cfg(windows)]
#[allow(clippy::unnecessary_wraps)] // Same signature as the unix variant
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    Ok(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        } else {
            std::future::pending::<()>().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dealx::DealxClient;
    use crate::mcp::protocol::ErrorCode;
    use serde_json::Value;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn server() -> McpServer {
        // Port 9 (discard) is closed; tests here never reach the network.
        let client = DealxClient::new("http://127.0.0.1:9");
        McpServer::new(ToolRegistry::with_defaults(client))
    }

    fn request(id: &str, method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: RequestId::String(id.to_string()),
            method: method.to_string(),
            params: Some(params),
        }
    }

    async fn serve(input: &'static [u8]) -> Vec<Value> {
        let reader = tokio_test::io::Builder::new().read(input).build();
        let mut transport = Transport::new(reader, Vec::new());
        server().serve(&mut transport).await.unwrap();
        String::from_utf8(transport.into_writer())
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn list_tools_returns_search_ads() {
        let resp = server()
            .handle_request(request("1", "listTools", json!({})))
            .await
            .unwrap();
        let tools = resp.result["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "search_ads");
        assert_eq!(tools[0]["inputSchema"]["required"], json!([]));
    }

    #[tokio::test]
    async fn list_tools_is_idempotent() {
        let server = server();
        let first = server
            .handle_request(request("1", "tools/list", json!({})))
            .await
            .unwrap();
        let second = server
            .handle_request(request("2", "listTools", json!({})))
            .await
            .unwrap();
        assert_eq!(first.result, second.result);
    }

    #[tokio::test]
    async fn unknown_tool_is_protocol_error() {
        let err = server()
            .handle_request(request("2", "callTool", json!({"name": "delete_ad"})))
            .await
            .unwrap_err();
        assert_eq!(err.error.code, ErrorCode::MethodNotFound.code());
        assert_eq!(err.error.message, "Unknown tool: delete_ad");
        assert_eq!(err.id, Some(RequestId::String("2".to_string())));
    }

    #[tokio::test]
    async fn invalid_offset_is_protocol_error() {
        let err = server()
            .handle_request(request(
                "3",
                "tools/call",
                json!({"name": "search_ads", "arguments": {"offset": 0}}),
            ))
            .await
            .unwrap_err();
        assert_eq!(err.error.code, ErrorCode::InvalidParams.code());
        assert_eq!(err.error.message, "Offset must be at least 1");
    }

    #[tokio::test]
    async fn missing_call_params_are_invalid() {
        let mut req = request("4", "callTool", Value::Null);
        req.params = None;
        let err = server().handle_request(req).await.unwrap_err();
        assert_eq!(err.error.code, ErrorCode::InvalidParams.code());

        let err = server()
            .handle_request(request("5", "callTool", json!({"arguments": {}})))
            .await
            .unwrap_err();
        assert!(err.error.message.starts_with("Invalid tool call params"));
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let err = server()
            .handle_request(request("6", "resources/list", json!({})))
            .await
            .unwrap_err();
        assert_eq!(err.error.code, ErrorCode::MethodNotFound.code());
        assert_eq!(err.error.message, "Method not found: resources/list");
    }

    #[tokio::test]
    async fn initialize_reports_server_info() {
        let resp = server()
            .handle_request(request("0", "initialize", json!({})))
            .await
            .unwrap();
        assert_eq!(resp.result["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert_eq!(resp.result["serverInfo"]["name"], SERVER_NAME);
        assert_eq!(resp.result["capabilities"], json!({"tools": {}}));
    }

    #[tokio::test]
    async fn two_messages_in_one_chunk_get_two_replies_in_order() {
        let replies = serve(
            b"{\"jsonrpc\":\"2.0\",\"id\":\"1\",\"method\":\"listTools\",\"params\":{}}\n\
              {\"jsonrpc\":\"2.0\",\"id\":\"2\",\"method\":\"ping\"}\n",
        )
        .await;
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["id"], "1");
        assert!(replies[0]["result"]["tools"].is_array());
        assert_eq!(replies[1]["id"], "2");
        assert_eq!(replies[1]["result"], json!({}));
    }

    #[tokio::test]
    async fn non_json_line_gets_no_reply() {
        let replies = serve(
            b"this is not json\n\
              {\"jsonrpc\":\"2.0\",\"id\":\"7\",\"method\":\"listTools\",\"params\":{}}\n",
        )
        .await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0]["id"], "7");
    }

    #[tokio::test]
    async fn notifications_and_blank_lines_get_no_reply() {
        let replies = serve(
            b"\n{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n\r\n",
        )
        .await;
        assert!(replies.is_empty());
    }

    #[tokio::test]
    async fn shutdown_stops_an_idle_server() {
        // The client half stays open, so the read never completes on its own
        let (_client, server_io) = tokio::io::duplex(1024);
        let (reader, writer) = tokio::io::split(server_io);
        let mut transport = Transport::new(reader, writer);

        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            server().run_until(&mut transport, async {}),
        )
        .await;
        assert!(matches!(outcome, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn shutdown_interrupts_a_hung_upstream_call() {
        let upstream = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", upstream.local_addr().unwrap());
        let server = McpServer::new(ToolRegistry::with_defaults(DealxClient::new(base)));

        let (mut client, server_io) = tokio::io::duplex(4096);
        let (reader, writer) = tokio::io::split(server_io);
        client
            .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":\"1\",\"method\":\"callTool\",\"params\":{\"name\":\"search_ads\",\"arguments\":{}}}\n")
            .await
            .unwrap();

        // Fires once the search has connected; the socket is held open and never answered
        let held = Mutex::new(Vec::new());
        let shutdown = async {
            let (socket, _) = upstream.accept().await.unwrap();
            held.lock().unwrap().push(socket);
        };

        let mut transport = Transport::new(reader, writer);
        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            server.run_until(&mut transport, shutdown),
        )
        .await;
        assert!(matches!(outcome, Ok(Ok(()))));
        assert_eq!(held.lock().unwrap().len(), 1);

        drop(transport);
        let mut replies = Vec::new();
        client.read_to_end(&mut replies).await.unwrap();
        assert!(replies.is_empty(), "interrupted request must not be answered");
    }

    #[tokio::test]
    async fn protocol_errors_are_written_as_error_envelopes() {
        let replies = serve(
            b"{\"jsonrpc\":\"2.0\",\"id\":\"9\",\"method\":\"callTool\",\"params\":{\"name\":\"search_ads\",\"arguments\":{\"limit\":101}}}\n",
        )
        .await;
        assert_eq!(replies.len(), 1);
        assert_eq!(
            replies[0],
            json!({
                "jsonrpc": "2.0",
                "id": "9",
                "error": {"code": -32602, "message": "Limit must be between 1 and 100"}
            })
        );
    }
}
