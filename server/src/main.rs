// server/src/main.rs

use anyhow::Result;
use medscript_server::cli::start_cli;

#[tokio::main]
async fn main() -> Result<()> {
    start_cli().await
}
