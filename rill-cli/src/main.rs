//! rill: a terminal chat client for a local Ollama server.
//!
//! Replies stream in token by token. With `--debug` (or `/debug`) every raw
//! chunk, parsed record, token, and error of the last reply is printed as
//! an observation log.

mod args;
mod render;
mod repl;

use clap::Parser;
use rill_session::{Chat, OllamaTransport};
use tracing_subscriber::EnvFilter;

use crate::args::Args;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let mut transport = OllamaTransport::new();
    if let Some(timeout) = args.connect_timeout() {
        transport = transport.with_connect_timeout(timeout)?;
    }
    if let Some(timeout) = args.timeout() {
        transport = transport.with_timeout(timeout)?;
    }

    let chat = Chat::new(args.config());
    tracing::debug!(url = %chat.config().chat_url(), model = %chat.config().model, "starting");
    repl::run(chat, transport, args.debug).await;
    Ok(())
}

/// Logs go to stderr so they never interleave with the transcript on stdout.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
