//! KISS Controller bot binary.
//!
//! Start the bot with:
//! ```bash
//! KISS_BOT_TOKEN=xxx KISS_PASSWORD=yyy cargo run -p kiss-telegram
//! ```

use clap::Parser;
use kiss_telegram::{config, BotConfig, KissBot};
use tracing_subscriber::EnvFilter;

/// KISS Controller - control this machine from Telegram
#[derive(Parser, Debug)]
#[command(name = "kiss-telegram")]
#[command(about = "Telegram bot for remote control of this host")]
struct Args {
    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load environment variables from config directory first
    let env_path = config::env_file();
    if env_path.exists() {
        let _ = dotenvy::from_path(&env_path);
    }
    let _ = dotenvy::dotenv();

    let filter = match args.verbose {
        0 => "kiss_telegram=info,kiss_host=info,teloxide=warn",
        1 => "kiss_telegram=debug,kiss_host=debug,teloxide=info",
        2 => "kiss_telegram=trace,kiss_host=trace,teloxide=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(filter))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    tracing::debug!(config = ?config, "Configuration loaded");

    let bot = KissBot::new(&config);

    match bot.get_me().await {
        Ok(username) => {
            tracing::info!(username = %username, "Bot initialized successfully");
            println!("\nKISS Controller");
            println!("   Bot: @{}", username);
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to get bot info");
            return Err(e.into());
        }
    }

    println!("\nOpen Telegram and send /login <password> to begin");
    println!("   Press Ctrl+C to stop\n");

    bot.start_polling().await?;

    Ok(())
}
