use clap::Parser;

/// Synctune server
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// address the websocket endpoint listens on
    #[arg(short, long, default_value = "0.0.0.0:8000")]
    pub listen_addr: String,
}
