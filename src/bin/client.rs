use anyhow::Result;
use clap::Parser;
use tokio::io::{stdin, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use synctune::client::{LocalCommand, SyncClient};
use synctune::player::LocalPlayer;

/// Command-line peer for the synctune server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// name announced to the server
    username: String,

    /// server base address
    #[arg(short, long, default_value = "ws://localhost:8000")]
    endpoint: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let (player, transitions) = LocalPlayer::new();
    let mut client = SyncClient::new(args.endpoint, player);
    client.connect(&args.username).await?;

    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim();
            let command = if let Some(url) = line.strip_prefix("play ") {
                LocalCommand::Play(url.trim().to_owned())
            } else if line == "pause" {
                LocalCommand::Pause
            } else if line == "resume" {
                LocalCommand::Resume
            } else {
                eprintln!("commands: play <url> | pause | resume");
                continue;
            };
            if commands_tx.send(command).is_err() {
                break;
            }
        }
    });

    info!("type `play <url>`, `pause` or `resume`");
    client.run(transitions, commands_rx).await?;
    Ok(())
}
