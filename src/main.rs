use anyhow::Context;
use clap::Parser;
use radar_alert_sender::config::cli::{CheckRecipeArgs, Command};
use radar_alert_sender::utils::logger;
use radar_alert_sender::{
    check, AlertError, BuildOutcome, Cli, ContainerRecipe, LogFormat, Requirements, Server,
    ServerConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match ServerConfig::load(&cli.overrides()) {
        Ok(config) => config,
        Err(e) => {
            // 設定無法載入時仍以 CLI 旗標初始化日誌
            logger::init_logger(
                cli.global.verbose,
                cli.global.log_format.unwrap_or(LogFormat::Compact),
            );
            exit_with(&e);
        }
    };

    logger::init_logger(config.verbose, config.log_format);
    tracing::debug!("Resolved config: {:?}", config);

    match cli.resolved_command() {
        Command::Serve(_) => serve(&config).await,
        Command::CheckRecipe(args) => check_recipes(&config, &args),
    }
}

async fn serve(config: &ServerConfig) -> anyhow::Result<()> {
    tracing::info!("Starting radar-alert-sender");

    let server = match Server::bind(config).await {
        Ok(server) => server,
        Err(e) => exit_with(&e),
    };

    if let Err(e) = server.run().await {
        exit_with(&e);
    }

    Ok(())
}

fn check_recipes(config: &ServerConfig, args: &CheckRecipeArgs) -> anyhow::Result<()> {
    let requirements = Requirements::from(config);
    let mut failed = 0usize;

    for path in &args.files {
        let recipe = match ContainerRecipe::from_file(path) {
            Ok(recipe) => recipe,
            Err(e) => {
                tracing::error!("❌ {}: {}", path.display(), e);
                eprintln!("❌ {}: {}", path.display(), e.user_friendly_message());
                failed += 1;
                continue;
            }
        };

        let report = check(&recipe, &requirements);
        let outcome = report.outcome();
        if matches!(outcome, BuildOutcome::Fails { .. }) {
            failed += 1;
        }

        if args.json {
            let document = serde_json::json!({
                "file": path.display().to_string(),
                "outcome": outcome,
                "findings": report.findings,
                "contract": report.contract,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&document)
                    .with_context(|| format!("serializing report for {}", path.display()))?
            );
            continue;
        }

        match &outcome {
            BuildOutcome::Succeeds { packages } => {
                println!("✅ {}: builds (packages: {})", path.display(), packages.join(", "))
            }
            BuildOutcome::Fails { .. } => println!("❌ {}: build fails", path.display()),
        }
        for finding in &report.findings {
            println!("   {}", finding);
        }
    }

    tracing::info!(
        "Checked {} recipe(s), {} failing",
        args.files.len(),
        failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn exit_with(e: &AlertError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    std::process::exit(e.exit_code().max(1));
}
