pub mod config;
pub mod recipe;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::Cli;

pub use config::{ConfigOverrides, LogFormat, ServerConfig};
pub use recipe::{check, BuildOutcome, ContainerRecipe, RecipeReport, Requirements};
pub use server::{router, Server, BANNER};
pub use utils::error::{AlertError, Result};
