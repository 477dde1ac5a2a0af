use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod app;
mod commands;
mod dispatcher;

#[derive(Parser)]
#[command(name = "quoterback", version, about = "Quoterback quote notifications")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the quote catalog
    Quote {
        #[command(subcommand)]
        action: commands::quote::QuoteAction,
    },
    /// Notification preferences
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Quote usage counters
    Usage {
        #[command(subcommand)]
        action: commands::usage::UsageAction,
    },
    /// Favorite quotes
    Favorites {
        #[command(subcommand)]
        action: commands::favorites::FavoritesAction,
    },
    /// Schedule, send and simulate notifications
    Notify {
        #[command(subcommand)]
        action: commands::notify::NotifyAction,
    },
    /// Engine configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("QUOTERBACK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Config { action } => commands::config::run(action),
        command => app::App::open().and_then(|mut app| {
            let result = match command {
                Commands::Quote { action } => commands::quote::run(&mut app, action),
                Commands::Settings { action } => commands::settings::run(&mut app, action),
                Commands::Usage { action } => commands::usage::run(&mut app, action),
                Commands::Favorites { action } => commands::favorites::run(&mut app, action),
                Commands::Notify { action } => commands::notify::run(&mut app, action),
                Commands::Config { action } => commands::config::run(action),
            };
            app.close();
            result
        }),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
