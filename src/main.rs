use clap::Parser;
use sphinx_index_mcp::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the MCP protocol and command output
    sphinx_index_mcp::tracing::init();
    Cli::parse().run().await
}
