use anyhow::Result;
use clap::Parser;
use tokio::io::BufReader;

use nexus_server::cli::Cli;
use nexus_server::{build_host, init_logging, resolve_config, transport};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = resolve_config(&cli)?;
    init_logging(&config, cli.verbosity_filter());

    let mut host = build_host(&config).await?;

    let reader = BufReader::new(tokio::io::stdin());
    let mut writer = tokio::io::stdout();
    transport::serve(&mut host, reader, &mut writer).await
}
