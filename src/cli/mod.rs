pub mod args;
pub mod commands;

pub use args::{AddArgs, ApplyArgs, ChainArgs, DeleteArgs, ListArgs, SearchArgs, ShowArgs};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "morpho")]
#[command(version = crate::VERSION)]
#[command(about = "Model transformation catalog and execution service")]
#[command(
    after_long_help = "Typical flow: list the catalog, apply a transformation to a document, then chain several together."
)]
pub struct Args {
    /// Path to custom config file (default: ./morpho.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(
        about = "List cataloged transformations",
        after_help = "Example:\n    morpho list"
    )]
    List(ListArgs),
    #[command(
        about = "Show one transformation by id or name",
        after_help = "Example:\n    morpho show Class2Relational"
    )]
    Show(ShowArgs),
    #[command(
        about = "Add a transformation to the user root",
        long_about = "Add validates the request, copies the program and schema files into a new directory under the user root, and indexes the entry.",
        after_help = "Example:\n    morpho add Class2Relational --program c2r.tfm --input Class.mms --output Relational.mms"
    )]
    Add(AddArgs),
    #[command(
        about = "Delete a transformation and its backing directory",
        after_help = "Example:\n    morpho delete Class2Relational"
    )]
    Delete(DeleteArgs),
    #[command(
        about = "Apply one transformation to a model document",
        after_help = "Example:\n    morpho apply Class2Relational person.mdl"
    )]
    Apply(ApplyArgs),
    #[command(
        about = "Apply an ordered chain of transformations",
        long_about = "Chain resolves every name before executing, threads each step's output into the next step's input, and prints the final document.",
        after_help = "Example:\n    morpho chain -t Class2Relational -t Relational2Names person.mdl"
    )]
    Chain(ChainArgs),
    #[command(
        about = "Search program sources for a substring",
        after_help = "Example:\n    morpho search Table"
    )]
    Search(SearchArgs),
}

pub async fn run(args: Args) -> anyhow::Result<()> {
    let config = crate::core::config::MorphoConfig::load(args.config.as_deref())?;
    let service = crate::core::service::MorphoService::open(&config)?;
    match args.command {
        Command::List(list_args) => commands::list(&service, list_args).await,
        Command::Show(show_args) => commands::show(&service, show_args).await,
        Command::Add(add_args) => commands::add(&service, add_args).await,
        Command::Delete(delete_args) => commands::delete(&service, delete_args).await,
        Command::Apply(apply_args) => commands::apply(&service, apply_args).await,
        Command::Chain(chain_args) => commands::chain(&service, chain_args).await,
        Command::Search(search_args) => commands::search(&service, search_args).await,
    }
}
