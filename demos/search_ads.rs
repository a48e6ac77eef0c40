//! Drives a `dealx-mcp` server over stdio the way an assistant would.
//!
//! Lists the available tools, then searches for laptops and prints the
//! listing. Build the server first:
//!
//! ```text
//! cargo build
//! cargo run --example search_ads
//! ```
//!
//! Set `DEALX_MCP_BIN` to use a server binary other than
//! `target/debug/dealx-mcp`. `DEALX_API_URL` is passed through to the server.

use std::path::PathBuf;
use std::process::{ExitCode, Stdio};

use dealx_mcp::dealx::model::SearchResult;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{ChildStdin, ChildStdout, Command};

type DemoResult<T> = Result<T, Box<dyn std::error::Error>>;

fn server_binary() -> PathBuf {
    std::env::var_os("DEALX_MCP_BIN").map_or_else(
        || {
            PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                .join("target")
                .join("debug")
                .join(format!("dealx-mcp{}", std::env::consts::EXE_SUFFIX))
        },
        PathBuf::from,
    )
}

async fn send(stdin: &mut ChildStdin, message: &Value) -> DemoResult<()> {
    let mut line = serde_json::to_vec(message)?;
    line.push(b'\n');
    stdin.write_all(&line).await?;
    stdin.flush().await?;
    Ok(())
}

async fn receive(lines: &mut Lines<BufReader<ChildStdout>>) -> DemoResult<Value> {
    let line = lines
        .next_line()
        .await?
        .ok_or("server closed its output")?;
    Ok(serde_json::from_str(&line)?)
}

fn print_listing(text: &str) {
    let Ok(page) = serde_json::from_str::<SearchResult>(text) else {
        println!("{text}");
        return;
    };

    println!("Found {} ads:", page.total_items);
    for (i, ad) in page.items.iter().enumerate() {
        let description: String = ad.description.chars().take(100).collect();
        println!("\n--- Ad {} ---", i + 1);
        println!("Title: {}", ad.title);
        println!("Description: {description}...");
        println!("Price: {}", ad.price);
        println!("Created: {}", ad.created);
        if let Some(author) = ad.author_name() {
            println!("Author: {author}");
        }
        if let Some(tags) = ad.tag_names() {
            println!("Tags: {tags}");
        }
    }
}

async fn run() -> DemoResult<()> {
    let binary = server_binary();
    if !binary.exists() {
        return Err(format!(
            "server executable not found at {}; build it with `cargo build`",
            binary.display()
        )
        .into());
    }

    let mut child = Command::new(&binary)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()?;

    let mut stdin = child.stdin.take().ok_or("server stdin unavailable")?;
    let stdout = child.stdout.take().ok_or("server stdout unavailable")?;
    let mut lines = BufReader::new(stdout).lines();

    send(
        &mut stdin,
        &json!({"jsonrpc": "2.0", "id": "1", "method": "listTools", "params": {}}),
    )
    .await?;
    let tools = receive(&mut lines).await?;

    println!("Available tools:");
    for tool in tools["result"]["tools"].as_array().into_iter().flatten() {
        println!(
            "- {}: {}",
            tool["name"].as_str().unwrap_or_default(),
            tool["description"].as_str().unwrap_or_default()
        );
    }

    println!("\nSearching for ads with query \"laptop\"...\n");
    send(
        &mut stdin,
        &json!({
            "jsonrpc": "2.0",
            "id": "2",
            "method": "callTool",
            "params": {
                "name": "search_ads",
                "arguments": {"query": "laptop", "sort": "-created", "offset": 1, "limit": 5}
            }
        }),
    )
    .await?;
    let reply = receive(&mut lines).await?;

    if let Some(error) = reply.get("error") {
        eprintln!("Error: {}", error["message"].as_str().unwrap_or_default());
    } else if let Some(text) = reply["result"]["content"][0]["text"].as_str() {
        if reply["result"]["isError"] == true {
            eprintln!("{text}");
        } else {
            print_listing(text);
        }
    }

    // Closing stdin ends the server's read loop
    drop(stdin);
    child.wait().await?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
