use anyhow::Result;
use clap::Parser;
use subfuse::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    subfuse::app::run(cli).await?;
    Ok(())
}
