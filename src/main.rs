use clap::Parser;
use morpho::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    morpho::logging::init("info")?;
    cli::run(args).await
}
