//! The `search_ads` tool.
//!
//! Fills in defaults, validates paging bounds, runs one search against the
//! DealX API, and renders the outcome as a tool result. Paging errors are
//! protocol errors; everything that goes wrong past validation is reported
//! in-band with `isError: true`.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::{ToolCallResult, ToolError, ToolHandler};
use crate::dealx::{DealxClient, SearchError, SearchParams};

/// Registered tool name.
pub const TOOL_NAME: &str = "search_ads";

pub const DEFAULT_OFFSET: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 30;
pub const MIN_OFFSET: i64 = 1;
pub const MIN_LIMIT: i64 = 1;
pub const MAX_LIMIT: i64 = 100;

const ERROR_PREFIX: &str = "Error searching ads";

/// Searches ads on the DealX platform.
#[derive(Debug, Clone)]
pub struct SearchAdsTool {
    client: DealxClient,
}

impl SearchAdsTool {
    #[must_use]
    pub const fn new(client: DealxClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for SearchAdsTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Search for ads on the DealX platform"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query string"
                },
                "sort": {
                    "type": "string",
                    "description": "Sort order (e.g., \"-created\" for newest first)"
                },
                "offset": {
                    "type": "number",
                    "description": "Pagination offset (starts at 1)",
                    "minimum": MIN_OFFSET
                },
                "limit": {
                    "type": "number",
                    "description": "Number of results per page (max 100)",
                    "minimum": MIN_LIMIT,
                    "maximum": MAX_LIMIT
                }
            },
            "required": []
        })
    }

    async fn call(&self, arguments: Value) -> Result<ToolCallResult, ToolError> {
        let params = parse_params(&arguments)?;
        tracing::info!(
            query = %params.query,
            sort = %params.sort,
            offset = params.offset,
            limit = params.limit,
            "Searching ads"
        );

        Ok(match self.client.search(&params).await {
            Ok(body) => render_body(&body),
            Err(e) => render_error(&e),
        })
    }
}

/// Applies defaults to raw tool arguments and validates them.
///
/// Defaults: empty `query`, empty `sort`, `offset` 1, `limit` 30. `null`
/// counts as absent. Paging values must be integral JSON numbers.
///
/// # Errors
///
/// Returns [`ToolError::InvalidParams`] for wrongly typed values, an offset
/// below 1, or a limit outside 1..=100.
pub fn parse_params(arguments: &Value) -> Result<SearchParams, ToolError> {
    let empty = Map::new();
    let args = match arguments {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => {
            return Err(ToolError::InvalidParams(
                "Tool arguments must be an object".to_string(),
            ))
        }
    };

    let query = string_arg(args, "query")?;
    let sort = string_arg(args, "sort")?;
    let offset = integer_arg(args, "offset", "Offset", DEFAULT_OFFSET)?;
    let limit = integer_arg(args, "limit", "Limit", DEFAULT_LIMIT)?;

    if offset < MIN_OFFSET {
        return Err(ToolError::InvalidParams(
            "Offset must be at least 1".to_string(),
        ));
    }

    if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
        return Err(ToolError::InvalidParams(
            "Limit must be between 1 and 100".to_string(),
        ));
    }

    Ok(SearchParams {
        query,
        sort,
        offset,
        limit,
    })
}

fn string_arg(args: &Map<String, Value>, key: &str) -> Result<String, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ToolError::InvalidParams(format!("{key} must be a string"))),
    }
}

#[allow(clippy::cast_possible_truncation)] // fract() == 0 checked; `as` saturates out-of-range values
fn integer_arg(
    args: &Map<String, Value>,
    key: &str,
    label: &str,
    default: i64,
) -> Result<i64, ToolError> {
    let not_integer = || ToolError::InvalidParams(format!("{label} must be an integer"));

    match args.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else if n.is_u64() {
                Ok(i64::MAX)
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f.fract() == 0.0 => Ok(f as i64),
                    _ => Err(not_integer()),
                }
            }
        }
        Some(_) => Err(not_integer()),
    }
}

fn render_body(body: &Value) -> ToolCallResult {
    match serde_json::to_string_pretty(body) {
        Ok(text) => ToolCallResult::text(text),
        Err(e) => ToolCallResult::error(format!("{ERROR_PREFIX}: {e}")),
    }
}

fn render_error(error: &SearchError) -> ToolCallResult {
    let mut message = error.to_string();
    if message.is_empty() {
        message = "Unknown error".to_string();
    }

    match error.http_status() {
        Some(status) => ToolCallResult::error(format!("{ERROR_PREFIX}: {message} ({status})")),
        None => ToolCallResult::error(format!("{ERROR_PREFIX}: {message}")),
    }
}
