pub mod cli;
pub mod core;
pub mod logging;
pub mod utils;

/// Current crate version string exposed for CLI and tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use crate::core::error::{CoreError, ErrorKind};

/// Crate-wide result alias; library code never returns `anyhow::Error`.
pub type Result<T> = std::result::Result<T, CoreError>;
