use anyhow::Result;
use dotenvy::dotenv;
use std::path::PathBuf;

use mediaferry::cli::{Cli, Commands};
use mediaferry::core::{config, init_logger, install_panic_hook, log_configuration, Config, TransportMode};
use mediaferry::telegram::{shutdown_signal, TransportRunner};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to the appropriate subcommand.
///
/// # Errors
/// Returns an error (non-zero exit) on configuration errors and on transport
/// startup failures.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // .env first so LOG_FILE_PATH / LOG_LEVEL from it apply to the logger
    let _ = dotenv();

    install_panic_hook();
    init_logger(config::LOG_FILE_PATH.as_deref())?;

    match cli.command {
        Some(Commands::Run { webhook, cookies }) => {
            log::info!("Running bot (webhook: {})", webhook);
            run_bot(webhook.then_some(TransportMode::Push), cookies).await
        }
        Some(Commands::CheckConfig) => check_config(),
        None => {
            log::info!("No command specified, running bot in default mode");
            run_bot(None, None).await
        }
    }
}

fn load_config(mode: Option<TransportMode>) -> Result<Config> {
    Config::from_env(mode).map_err(|e| {
        log::error!("{}", e);
        e.into()
    })
}

/// Print the effective configuration with the token masked.
fn check_config() -> Result<()> {
    let config = load_config(None)?;
    for (key, value) in config.summary() {
        println!("{:<22} {}", key, value);
    }
    Ok(())
}

async fn run_bot(mode: Option<TransportMode>, cookies: Option<String>) -> Result<()> {
    let mut config = load_config(mode)?;
    if let Some(path) = cookies {
        config.ytdl_cookies_file = Some(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }
    log_configuration(&config);

    let runner = TransportRunner::new(config)?;
    if let Err(e) = runner.initialize().await {
        if e.is_fatal() {
            log::error!("Startup failed, fix the configuration and restart: {}", e);
        } else {
            log::error!("Startup failed: {}", e);
        }
        return Err(e.into());
    }

    runner.run(shutdown_signal()).await?;
    log::info!("Bye");
    Ok(())
}
