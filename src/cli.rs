use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mediaferry")]
#[command(author, version, about = "Telegram bot that downloads YouTube and Instagram videos", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (long polling unless --webhook or TRANSPORT_MODE=push)
    Run {
        /// Use webhook mode instead of long polling
        #[arg(long)]
        webhook: bool,

        /// Path to a cookies file for yt-dlp (overrides YTDL_COOKIES_FILE)
        #[arg(short, long)]
        cookies: Option<String>,
    },

    /// Print the effective configuration and exit
    CheckConfig,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand() {
        let cli = Cli::try_parse_from(["mediaferry"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_run_webhook() {
        let cli = Cli::try_parse_from(["mediaferry", "run", "--webhook"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Run {
                webhook: true,
                cookies: None
            })
        );
    }

    #[test]
    fn test_check_config() {
        let cli = Cli::try_parse_from(["mediaferry", "check-config"]).unwrap();
        assert_eq!(cli.command, Some(Commands::CheckConfig));
    }
}
