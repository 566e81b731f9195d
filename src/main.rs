use anyhow::Result;
use clap::Parser;
use teller::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    teller::observability::init(cli.verbose);
    cli.run().await
}
