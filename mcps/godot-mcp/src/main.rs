//! Godot MCP server
//!
//! Usage:
//!   godot-mcp                      # HTTP/SSE on 127.0.0.1:5050
//!   godot-mcp --port 6000 --godot-url ws://localhost:9080
//!   godot-mcp --stdio              # one session over stdin/stdout

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use mcp_common::session::{McpSessions, SseMultiplexer};

use godot_mcp::{CommandBridge, Config, GodotMcpServer};

#[derive(Parser)]
#[command(name = "godot-mcp")]
#[command(about = "MCP server bridging tool-calling agents to a running Godot editor")]
struct Cli {
    /// Config file (default: search standard locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serve a single session over stdin/stdout instead of HTTP
    #[arg(long)]
    stdio: bool,

    /// Address to listen on
    #[arg(long)]
    host: Option<IpAddr>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// WebSocket URL of the Godot editor plugin
    #[arg(long, env = "GODOT_URL")]
    godot_url: Option<String>,

    /// Per-command timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(url) = &self.godot_url {
            config.bridge.url = url.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.bridge.command_timeout_ms = timeout_ms;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    mcp_common::init_tracing("godot_mcp")?;

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    let bridge = CommandBridge::websocket(config.bridge_config());
    if let Err(e) = bridge.connect().await {
        tracing::warn!("{}", e);
        tracing::warn!("Will retry connection when commands are executed");
    }

    let server = GodotMcpServer::new(bridge.clone());
    let result = if cli.stdio {
        tokio::select! {
            result = mcp_common::serve_stdio(server) => result,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                Ok(())
            }
        }
    } else {
        serve_http(server, &config).await
    };

    bridge.disconnect().await;
    result
}

async fn serve_http(server: GodotMcpServer, config: &Config) -> Result<()> {
    let mux = Arc::new(SseMultiplexer::new(
        McpSessions::new(server),
        config.sse_config(),
    ));
    let bind = mux.config().bind;
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;

    tracing::info!("Godot MCP server waiting for connections on {}", bind);
    mux.serve(listener, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await
}
