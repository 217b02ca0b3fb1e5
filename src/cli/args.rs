use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct ListArgs {
    /// Emit the catalog as a JSON array instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Transformation id or name (names match case-insensitively)
    #[arg(value_name = "ID_OR_NAME")]
    pub selector: String,
}

#[derive(Args)]
pub struct AddArgs {
    /// Name of the new transformation (unique across the catalog)
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Transformation program source file
    #[arg(long, value_name = "FILE")]
    pub program: PathBuf,

    /// Input schema description file (repeatable, at least one)
    #[arg(long = "input", value_name = "FILE", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output schema description file (repeatable, at least one)
    #[arg(long = "output", value_name = "FILE", required = true)]
    pub outputs: Vec<PathBuf>,

    /// Free-text description stored alongside the artifacts
    #[arg(long, value_name = "TEXT")]
    pub description: Option<String>,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Transformation id or name
    #[arg(value_name = "ID_OR_NAME")]
    pub selector: String,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Transformation id or name
    #[arg(value_name = "ID_OR_NAME")]
    pub selector: String,

    /// Input model document
    #[arg(value_name = "DOCUMENT")]
    pub input: PathBuf,

    /// Write the output document here instead of stdout
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct ChainArgs {
    /// Transformation names in execution order (repeatable)
    #[arg(short = 't', long = "transformation", value_name = "NAME", required = true)]
    pub names: Vec<String>,

    /// Input model document for the first step
    #[arg(value_name = "DOCUMENT")]
    pub input: PathBuf,

    /// Write the final document here instead of stdout
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Substring to look for in program sources (case-insensitive)
    #[arg(value_name = "QUERY")]
    pub query: String,
}
