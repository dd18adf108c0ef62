//! Watchpost CLI
//!
//! Watches the remote monitor log and manages monitor targets.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use watchpost::model::{NewMonitorTarget, RecordId};
use watchpost::targets::TargetRegistry;
use watchpost::toggle::MonitoringToggle;
use watchpost::{load_config, Config, WatchpostBuilder};

#[derive(Parser)]
#[command(name = "watchpost")]
#[command(about = "Monitor-log watcher and notification client")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Remote API base URL (overrides config file)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Poll interval in milliseconds (overrides config file)
    #[arg(long, global = true)]
    poll_interval_ms: Option<u64>,

    /// Dashboard port (overrides config file)
    #[arg(long, global = true)]
    dashboard_port: Option<u16>,

    /// Log level
    #[arg(short, long, default_value = "info", global = true)]
    log_level: Level,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch the monitor log and notify on new entries (default)
    Watch,
    /// Manage monitor targets
    Targets {
        #[command(subcommand)]
        action: TargetsCommand,
    },
    /// Show whether remote monitoring is active
    Status,
    /// Flip remote monitoring on or off
    Toggle,
}

#[derive(Subcommand, Debug)]
enum TargetsCommand {
    /// List monitor targets
    List {
        /// Only show targets whose name, channel id, type or ideology contain this
        #[arg(long)]
        filter: Option<String>,
    },
    /// Start monitoring a channel
    Add {
        #[arg(long)]
        channel_id: String,
        #[arg(long)]
        comment_text: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        channel_type: Option<String>,
        #[arg(long)]
        ideology: Option<String>,
    },
    /// Stop monitoring a target
    Remove { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, base_url={:?}, poll_interval_ms={:?}, dashboard_port={:?}, log_level={:?}, command={:?}",
        args.config,
        args.base_url,
        args.poll_interval_ms,
        args.dashboard_port,
        args.log_level,
        args.command
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    config.resolve_secrets()?;

    if let Some(base_url) = args.base_url {
        config.api.base_url = base_url;
    }
    if let Some(poll_interval_ms) = args.poll_interval_ms {
        config.polling.poll_interval_ms = poll_interval_ms;
    }
    if let Some(dashboard_port) = args.dashboard_port {
        config.dashboard.port = dashboard_port;
    }

    let watchpost = WatchpostBuilder::new(config).build()?;

    match args.command.unwrap_or(Command::Watch) {
        Command::Watch => {
            tracing::info!("Starting watchpost");
            watchpost.start().await?;
        }
        Command::Targets { action } => {
            let mut registry = TargetRegistry::new(watchpost.api());
            match action {
                TargetsCommand::List { filter } => {
                    registry.refresh().await?;
                    for target in registry.filter(filter.as_deref().unwrap_or("")) {
                        println!(
                            "{}\t{}\t{}\t{}",
                            target.id, target.channel_id, target.name, target.comment_text
                        );
                    }
                }
                TargetsCommand::Add {
                    channel_id,
                    comment_text,
                    name,
                    channel_type,
                    ideology,
                } => {
                    let created = registry
                        .add(NewMonitorTarget {
                            channel_id,
                            name: name.unwrap_or_default(),
                            channel_type,
                            ideology,
                            comment_text,
                        })
                        .await?;
                    println!("Added target {} for {}", created.id, created.channel_id);
                }
                TargetsCommand::Remove { id } => {
                    registry.remove(&RecordId::from(id.as_str())).await?;
                    println!("Removed target {}", id);
                }
            }
        }
        Command::Status => {
            let mut toggle = MonitoringToggle::new(watchpost.api());
            println!("Monitoring is {}", toggle.refresh().await?);
        }
        Command::Toggle => {
            let mut toggle = MonitoringToggle::new(watchpost.api());
            println!("Monitoring is now {}", toggle.toggle().await?);
        }
    }

    Ok(())
}
