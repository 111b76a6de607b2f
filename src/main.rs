use anyhow::Result;
use clap::Parser;
use flowbase::cli::{handle_score_command, Cli, Command};
use flowbase::{logging, start_web_server, AppConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging comes first so configuration warnings are not lost
    let environment = AppConfig::environment_from_env();
    let _log_guards = logging::init(environment == "production")?;

    let config = AppConfig::load()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Score { file } => handle_score_command(&file).await,
        Command::Serve => {
            config.validate()?;

            info!("Environment: {}", config.environment);
            start_web_server(config).await
        }
    }
}
