//! Runs the tic-tac-toe room server.
//!
//! ```text
//! PORT=4000 RUST_LOG=debug tictac-server --host 0.0.0.0
//! ```

use clap::Parser;
use tictac::prelude::*;
use tracing_subscriber::EnvFilter;

/// Authoritative multiplayer tic-tac-toe over WebSockets
#[derive(Parser, Debug)]
#[command(name = "tictac-server")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 4000)]
    port: u16,

    /// Longest chat line accepted, in characters
    #[arg(long, default_value_t = 200)]
    max_chat_chars: usize,
}

impl Cli {
    fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn room_config(&self) -> RoomConfig {
        RoomConfig {
            max_chat_chars: self.max_chat_chars,
            ..RoomConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let addr = cli.bind_addr();
    tracing::info!(%addr, max_chat_chars = cli.max_chat_chars, "starting server");

    let server = TictacServerBuilder::new()
        .bind(&addr)
        .room_config(cli.room_config())
        .build()
        .await?;

    server.run().await?;
    Ok(())
}
