//! Integration tests for MCP protocol handling.
//!
//! These tests drive the server through its public API: message decoding,
//! the stdio-style serve loop over in-memory streams, and the request
//! dispatcher.

use dealx_mcp::dealx::DealxClient;
use dealx_mcp::mcp::protocol::{parse_message, DecodeError, IncomingMessage, RequestId};
use dealx_mcp::mcp::{McpServer, Transport};
use dealx_mcp::tools::ToolRegistry;
use serde_json::{json, Value};

/// A server whose upstream is unreachable; protocol tests never hit it.
fn offline_server() -> McpServer {
    McpServer::new(ToolRegistry::with_defaults(DealxClient::new(
        "http://127.0.0.1:9",
    )))
}

/// Feeds `chunks` to the server as separate reads and returns every reply.
async fn exchange(chunks: &[&[u8]]) -> Vec<Value> {
    let mut builder = tokio_test::io::Builder::new();
    for chunk in chunks {
        builder.read(chunk);
    }
    let mut transport = Transport::new(builder.build(), Vec::new());
    offline_server().serve(&mut transport).await.unwrap();

    String::from_utf8(transport.into_writer())
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

// =============================================================================
// Protocol Parsing Tests
// =============================================================================

#[test]
fn test_parse_initialize_request() {
    let json = r#"{
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {"name": "test-client", "version": "1.0.0"}
        }
    }"#;

    match parse_message(json).unwrap() {
        IncomingMessage::Request(req) => {
            assert_eq!(req.method, "initialize");
            assert_eq!(req.id, RequestId::Number(1));
        }
        IncomingMessage::Notification(_) => panic!("Expected Request"),
    }
}

#[test]
fn test_parse_call_tool_with_string_id() {
    let json = r#"{"jsonrpc":"2.0","id":"2","method":"callTool","params":{"name":"search_ads","arguments":{"query":"laptop"}}}"#;

    match parse_message(json).unwrap() {
        IncomingMessage::Request(req) => {
            assert_eq!(req.method, "callTool");
            assert_eq!(req.id, RequestId::String("2".to_string()));
            assert_eq!(req.params.unwrap()["arguments"]["query"], "laptop");
        }
        IncomingMessage::Notification(_) => panic!("Expected Request"),
    }
}

#[test]
fn test_parse_notification() {
    let json = r#"{"jsonrpc": "2.0", "method": "notifications/initialized"}"#;

    let msg = parse_message(json).unwrap();
    assert!(matches!(msg, IncomingMessage::Notification(_)));
    assert_eq!(msg.method(), "notifications/initialized");
}

#[test]
fn test_parse_invalid_json_has_no_reply() {
    let err = parse_message("not valid json").unwrap_err();
    assert!(matches!(err, DecodeError::NotJson(_)));
    assert!(err.reply().is_none());
}

#[test]
fn test_parse_missing_jsonrpc_version_replies_with_id() {
    let err = parse_message(r#"{"id": 1, "method": "test"}"#).unwrap_err();
    let reply = err.reply().expect("id is recoverable");
    assert_eq!(reply.id, Some(RequestId::Number(1)));
    assert_eq!(reply.error.code, -32600);
}

// =============================================================================
// Serve Loop Tests
// =============================================================================

#[tokio::test]
async fn test_list_tools_over_stream() {
    let replies =
        exchange(&[b"{\"jsonrpc\":\"2.0\",\"id\":\"1\",\"method\":\"listTools\",\"params\":{}}\n"])
            .await;

    assert_eq!(replies.len(), 1);
    let tools = &replies[0]["result"]["tools"];
    assert_eq!(tools.as_array().unwrap().len(), 1);
    assert_eq!(tools[0]["name"], "search_ads");
    assert_eq!(
        tools[0]["description"],
        "Search for ads on the DealX platform"
    );

    let props = &tools[0]["inputSchema"]["properties"];
    assert_eq!(props["offset"]["minimum"], 1);
    assert_eq!(props["limit"]["minimum"], 1);
    assert_eq!(props["limit"]["maximum"], 100);
    assert_eq!(props["query"]["type"], "string");
    assert_eq!(props["sort"]["type"], "string");
}

#[tokio::test]
async fn test_message_split_across_reads() {
    let replies = exchange(&[
        b"{\"jsonrpc\":\"2.0\",\"id\":\"a\",",
        b"\"method\":\"ping\"}\n{\"jsonrpc\":\"2.0\",",
        b"\"id\":\"b\",\"method\":\"ping\"}\n",
    ])
    .await;

    let ids: Vec<_> = replies.iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!("a"), json!("b")]);
}

#[tokio::test]
async fn test_garbage_is_skipped_and_stream_continues() {
    let replies = exchange(&[
        b"}}}{{{\n[1,2,3]\n\"just a string\"\n",
        b"{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"ping\"}\n",
    ])
    .await;

    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["id"], 3);
}

#[tokio::test]
async fn test_unknown_tool_error_envelope() {
    let replies = exchange(&[
        b"{\"jsonrpc\":\"2.0\",\"id\":\"2\",\"method\":\"callTool\",\"params\":{\"name\":\"nope\",\"arguments\":{}}}\n",
    ])
    .await;

    assert_eq!(
        replies[0],
        json!({
            "jsonrpc": "2.0",
            "id": "2",
            "error": {"code": -32601, "message": "Unknown tool: nope"}
        })
    );
}

#[tokio::test]
async fn test_offset_zero_error_envelope() {
    let replies = exchange(&[
        b"{\"jsonrpc\":\"2.0\",\"id\":\"3\",\"method\":\"tools/call\",\"params\":{\"name\":\"search_ads\",\"arguments\":{\"offset\":0}}}\n",
    ])
    .await;

    assert_eq!(
        replies[0],
        json!({
            "jsonrpc": "2.0",
            "id": "3",
            "error": {"code": -32602, "message": "Offset must be at least 1"}
        })
    );
}

#[tokio::test]
async fn test_unknown_method_error_envelope() {
    let replies =
        exchange(&[b"{\"jsonrpc\":\"2.0\",\"id\":4,\"method\":\"prompts/list\"}\n"]).await;

    assert_eq!(replies[0]["error"]["code"], -32601);
    assert_eq!(replies[0]["error"]["message"], "Method not found: prompts/list");
}

#[tokio::test]
async fn test_request_without_version_gets_invalid_request() {
    let replies = exchange(&[b"{\"id\":5,\"method\":\"ping\"}\n"]).await;

    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["id"], 5);
    assert_eq!(replies[0]["error"]["code"], -32600);
}

#[tokio::test]
async fn test_unterminated_trailing_message_is_dropped() {
    let replies = exchange(&[
        b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n",
        b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}",
    ])
    .await;

    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["id"], 1);
}

#[tokio::test]
async fn test_empty_input_ends_cleanly() {
    assert!(exchange(&[]).await.is_empty());
}
