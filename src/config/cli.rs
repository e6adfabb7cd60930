use crate::config::{ConfigOverrides, LogFormat};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "radar-alert-sender")]
#[command(about = "Radar alert sender HTTP service and container recipe checker")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    #[arg(long, global = true, help = "Path to a TOML config file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, help = "Log output format")]
    pub log_format: Option<LogFormat>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the HTTP service (default)
    Serve(ServeArgs),
    /// Check Dockerfiles against the container contract
    CheckRecipe(CheckRecipeArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct ServeArgs {
    #[arg(long, help = "Address to bind, defaults to 0.0.0.0")]
    pub host: Option<String>,

    #[arg(long, help = "Port to listen on, overrides PORT")]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Args)]
pub struct CheckRecipeArgs {
    #[arg(required = true, help = "Dockerfiles to check")]
    pub files: Vec<PathBuf>,

    #[arg(long, value_delimiter = ',', help = "Packages the image must install")]
    pub require: Option<Vec<String>>,

    #[arg(long, help = "Print reports as JSON")]
    pub json: bool,
}

impl Cli {
    pub fn resolved_command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Serve(ServeArgs::default()))
    }

    pub fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides {
            config_path: self.global.config.clone(),
            log_format: self.global.log_format,
            verbose: self.global.verbose,
            ..Default::default()
        };

        match &self.command {
            Some(Command::Serve(args)) => {
                overrides.host = args.host.clone();
                overrides.port = args.port;
            }
            Some(Command::CheckRecipe(args)) => {
                overrides.required_packages = args.require.clone().map(|packages| {
                    packages.into_iter().filter(|p| !p.trim().is_empty()).collect()
                });
            }
            None => {}
        }

        overrides
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_serves() {
        let cli = Cli::parse_from(["radar-alert-sender"]);
        assert!(matches!(cli.resolved_command(), Command::Serve(_)));
        assert!(cli.overrides().port.is_none());
    }

    #[test]
    fn test_serve_flags_become_overrides() {
        let cli = Cli::parse_from([
            "radar-alert-sender",
            "--log-format",
            "json",
            "serve",
            "--port",
            "9001",
            "--host",
            "127.0.0.1",
        ]);
        let overrides = cli.overrides();

        assert_eq!(overrides.port, Some(9001));
        assert_eq!(overrides.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(overrides.log_format, Some(LogFormat::Json));
    }

    #[test]
    fn test_check_recipe_require_list() {
        let cli = Cli::parse_from([
            "radar-alert-sender",
            "check-recipe",
            "Dockerfile",
            "--require",
            "flask,twilio",
        ]);

        match cli.resolved_command() {
            Command::CheckRecipe(args) => assert_eq!(args.files, vec![PathBuf::from("Dockerfile")]),
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(
            cli.overrides().required_packages,
            Some(vec!["flask".to_string(), "twilio".to_string()])
        );
    }

    #[test]
    fn test_empty_require_means_no_packages() {
        let cli = Cli::parse_from(["radar-alert-sender", "check-recipe", "Dockerfile", "--require", ""]);
        assert_eq!(cli.overrides().required_packages, Some(vec![]));
    }

    #[test]
    fn test_invalid_port_rejected_by_parser() {
        let result = Cli::try_parse_from(["radar-alert-sender", "serve", "--port", "70000"]);
        assert!(result.is_err());
    }
}
