//! Model Context Protocol (MCP) server implementation.
//!
//! This module exposes the DealX tools to AI assistants over the stdio
//! transport using JSON-RPC 2.0 messages.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                            MCP Server                            │
//! │                                                                  │
//! │  ┌──────────┐   ┌───────────┐   ┌──────────┐   ┌─────────────┐   │
//! │  │ Framing  │──▶│ Transport │──▶│  Server  │──▶│ ToolRegistry│   │
//! │  │ (lines)  │   │  (stdio)  │   │ (routing)│   │ (dispatch)  │   │
//! │  └──────────┘   └───────────┘   └──────────┘   └──────┬──────┘   │
//! │                                                       ▼          │
//! │                                              ┌─────────────────┐ │
//! │                                              │  DealX API (GET)│ │
//! │                                              └─────────────────┘ │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod framing;
pub mod protocol;
pub mod server;
pub mod transport;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use server::McpServer;
pub use transport::{StdioTransport, Transport};
