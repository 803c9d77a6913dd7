//! Server initialization utilities
//!
//! Provides standardized tracing setup and the stdio entry point shared by
//! every MCP server binary.

use rmcp::{ServerHandler, ServiceExt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging for MCP servers
///
/// Logs always go to stderr: in stdio mode stdout carries the MCP protocol,
/// and the HTTP mode keeps the same behaviour so both modes log identically.
///
/// - `RUST_LOG` is honoured; `<crate_name>=info` and `mcp_common=info` are
///   added as defaults.
/// - `LOG_FORMAT=json` switches to JSON lines for log aggregation.
///
/// # Example
///
/// ```rust,ignore
/// mcp_common::init_tracing("godot_mcp")?;
/// ```
pub fn init_tracing(crate_name: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("{}=info", crate_name).parse()?)
        .add_directive("mcp_common=info".parse()?);

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    }

    Ok(())
}

/// Serve a single MCP session over stdin/stdout until the client goes away
///
/// This is the single-session, line-oriented mode: no HTTP listener and no
/// session registry are involved.
pub async fn serve_stdio<S>(server: S) -> anyhow::Result<()>
where
    S: ServerHandler,
{
    let service = server.serve(rmcp::transport::stdio()).await?;

    tracing::info!("Serving MCP over stdio, waiting for requests...");

    let reason = service.waiting().await?;

    tracing::info!("Stdio session ended: {:?}", reason);
    Ok(())
}
