//! dealx-mcp: MCP server for searching ads on the DealX marketplace
//!
//! This library exposes the DealX ad search API as an MCP tool, so AI
//! assistants can look up listings over a standard stdio JSON-RPC channel.
//!
//! # Architecture
//!
//! The server is a thin adapter:
//!
//! - **Transport**: newline-delimited JSON-RPC 2.0 over stdin/stdout
//! - **Tools**: a registry of named handlers; today only `search_ads`
//! - **Upstream**: one HTTP GET per call to `{base_url}/api/ads/search`
//!
//! Upstream JSON is passed through unchanged. Bad arguments are JSON-RPC
//! errors; upstream failures are tool results with `isError: true`.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading and validation
//! - [`dealx`]: DealX search API client and payload types
//! - [`error`]: Error types
//! - [`mcp`]: MCP protocol implementation
//! - [`tools`]: Tool registry and the `search_ads` tool

pub mod config;
pub mod dealx;
pub mod error;
pub mod mcp;
pub mod tools;
