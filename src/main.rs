//! # SubsTrack CLI
//!
//! Subscription expiry tracker: auto-renews lapsed subscriptions and sends
//! expiry reminders over Telegram, email, webhooks and Bark.
//!
//! Usage:
//!   substrack tick                          # One evaluation pass now
//!   substrack tick --at 2024-06-10T09:00Z   # Evaluate as of a given instant
//!   substrack run --interval-secs 3600      # Tick on a schedule until Ctrl+C
//!   substrack notify -t "Hi" -c "Test"      # Send a test notification
//!   substrack channels                      # Show channel configuration

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use substrack_channels::ChannelRegistry;
use substrack_core::traits::ConfigProvider;
use substrack_core::types::NotificationOptions;
use substrack_scheduler::{CalendarZone, JsonFileStore, NotifyRouter, ReminderEngine, TickRunner};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "substrack",
    version,
    about = "📅 SubsTrack — subscription renewals and expiry reminders"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding subscriptions.json and config.json
    #[arg(short, long, global = true, default_value = "data")]
    data_dir: PathBuf,

    /// Per-channel send timeout in seconds
    #[arg(long, global = true, default_value_t = 10)]
    channel_timeout_secs: u64,

    /// UTC offset whose calendar days drive reminder windows (e.g. +08:00)
    #[arg(long, global = true, default_value = "UTC")]
    zone: String,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single tick and print its statistics
    Tick {
        /// Evaluate as of this instant instead of now
        #[arg(long)]
        at: Option<String>,
    },

    /// Tick repeatedly until interrupted
    Run {
        #[arg(long, default_value_t = 3600)]
        interval_secs: u64,
    },

    /// Send a notification to every enabled channel
    Notify {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        content: String,
    },

    /// Show enabled channels and missing credentials
    Channels,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "substrack=debug,substrack_core=debug,substrack_channels=debug,substrack_scheduler=debug"
    } else {
        "substrack=info,substrack_channels=info,substrack_scheduler=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let client = reqwest::Client::builder()
        .user_agent(concat!("substrack/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building HTTP client")?;
    let registry = Arc::new(ChannelRegistry::with_defaults(client));
    let router = Arc::new(
        NotifyRouter::new(registry.clone()).with_timeout(Duration::from_secs(cli.channel_timeout_secs)),
    );
    let store = Arc::new(JsonFileStore::new(cli.data_dir.clone()));

    match cli.command {
        Commands::Tick { at } => {
            let now = match at {
                Some(raw) => substrack_core::time::parse_instant(&raw)?,
                None => Utc::now(),
            };
            let runner = tick_runner(router, store, &cli.zone)?;
            let stats = runner.run_tick(now).await;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }

        Commands::Run { interval_secs } => {
            anyhow::ensure!(interval_secs > 0, "--interval-secs must be positive");
            let runner = tick_runner(router, store, &cli.zone)?;
            println!("📅 SubsTrack v{} — ticking every {interval_secs}s", env!("CARGO_PKG_VERSION"));
            println!("   Data: {}", cli.data_dir.display());
            println!("   Press Ctrl+C to stop.\n");

            tokio::select! {
                _ = runner.run_every(Duration::from_secs(interval_secs)) => {}
                signal = tokio::signal::ctrl_c() => {
                    signal?;
                    println!("\n👋 Stopped.");
                }
            }
        }

        Commands::Notify { title, content } => {
            let config = store.get_config().await?;
            let outcome = router.dispatch(&NotificationOptions::new(title, content), &config).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if outcome.is_total_failure() {
                anyhow::bail!("no channel delivered the notification");
            }
        }

        Commands::Channels => {
            let config = store.get_config().await?;
            println!("Registered channels: {}", registry.channel_names().join(", "));
            println!("Reminder mode: {:?}", config.reminder_mode);
            if config.notification_hours.is_empty() {
                println!("Notification hours: all");
            } else {
                let hours: Vec<String> = config.notification_hours.iter().map(|h| h.to_string()).collect();
                println!("Notification hours: {} (UTC)", hours.join(", "));
            }

            let report = registry.validate_enabled(&config);
            if report.is_empty() {
                println!("\nNo channels enabled.");
            } else {
                println!("\nEnabled channels:");
            }
            for (name, validation) in report {
                if validation.is_valid {
                    println!("  ✅ {name}");
                } else if registry.get(&name).is_none() {
                    println!("  ❌ {name} — no such channel");
                } else {
                    println!("  ⬜ {name} — missing {}", validation.missing_fields.join(", "));
                }
            }
        }
    }

    Ok(())
}

fn tick_runner(router: Arc<NotifyRouter>, store: Arc<JsonFileStore>, zone: &str) -> Result<TickRunner> {
    let zone = CalendarZone::parse(zone)?;
    let engine = Arc::new(ReminderEngine::new(router).with_zone(zone));
    Ok(TickRunner::new(engine, store.clone(), store))
}
