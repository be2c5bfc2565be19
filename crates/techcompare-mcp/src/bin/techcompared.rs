use std::io;

use techcompare_mcp::McpServer;
use tracing_subscriber::EnvFilter;

fn main() -> io::Result<()> {
    // stdout carries protocol frames, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("TECHCOMPARE_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let mode = std::env::var("TECHCOMPARE_TRANSPORT").unwrap_or_else(|_| "stdio".to_string());
    if mode != "stdio" {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "TECHCOMPARE_TRANSPORT must be stdio",
        ));
    }

    let server = McpServer::from_env().map_err(io::Error::other)?;
    server.serve_stdio()
}
