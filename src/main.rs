//! likerank CLI: like counting and ranking engine.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use likerank::config::{EngineConfig, FastBackend, Locations};
use likerank::engine::Engine;
use likerank::ids::{ItemId, UserId};
use likerank::rank::parse_top;

#[derive(Parser)]
#[command(name = "likerank", version, about = "Like counting and ranking engine")]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/likerank/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory for persistent storage (overrides the config file).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config and create the data directory.
    Init {
        /// Keep counters in memory instead of redb.
        #[arg(long)]
        memory_fast_store: bool,
    },

    /// Like an item.
    Like {
        /// Item id.
        item: String,

        /// User id; missing or invalid values make the like anonymous.
        #[arg(long)]
        user: Option<String>,
    },

    /// Show the like count of an item.
    Likes {
        /// Item id.
        item: String,
    },

    /// Show the most-liked items.
    Top {
        /// Number of entries (invalid or non-positive values use the default).
        #[arg(long)]
        n: Option<String>,
    },

    /// Manage item titles used to enrich rankings.
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },

    /// Inspect the audit log.
    Audit {
        #[command(subcommand)]
        action: AuditAction,
    },

    /// Show engine info and statistics.
    Info,
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Set the title of an item.
    Set {
        /// Item id.
        item: String,
        /// Display title.
        title: String,
    },
    /// Show the title of an item.
    Get {
        /// Item id.
        item: String,
    },
}

#[derive(Subcommand)]
enum AuditAction {
    /// Export every recorded like as JSON.
    Export,
}

/// Config file and data directory chosen from flags and environment.
struct Target {
    locations: Locations,
    data_dir: Option<PathBuf>,
}

impl Target {
    /// Open the engine, with `--data-dir` overriding the config file.
    fn open(&self) -> Result<Engine> {
        let mut config = self.locations.load_config().into_diagnostic()?;
        if let Some(dir) = &self.data_dir {
            config.data_dir = Some(dir.clone());
        }
        Engine::new(config).into_diagnostic()
    }
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut locations = Locations::from_env();
    if let Some(path) = cli.config {
        locations.config_file = path;
    }
    let target = Target {
        locations,
        data_dir: cli.data_dir,
    };

    match cli.command {
        Commands::Init { memory_fast_store } => {
            let data_dir = target
                .data_dir
                .clone()
                .unwrap_or_else(|| target.locations.data_dir.clone());
            let config = EngineConfig {
                fast_store: if memory_fast_store {
                    FastBackend::Memory
                } else {
                    FastBackend::Redb
                },
                ..EngineConfig::persistent(&data_dir)
            };
            config.save(&target.locations.config_file).into_diagnostic()?;
            let engine = Engine::new(config).into_diagnostic()?;
            println!("Initialized likerank at {}", data_dir.display());
            println!("Config written to {}", target.locations.config_file.display());
            println!("{}", engine.info().into_diagnostic()?);
        }

        Commands::Like { item, user } => {
            let engine = target.open()?;
            let item: ItemId = item.parse().into_diagnostic()?;
            let user = UserId::resolve(user.as_deref());
            let receipt = engine.submit_like(item, user).into_diagnostic()?;
            let json = serde_json::to_string_pretty(&receipt).into_diagnostic()?;
            println!("{json}");
        }

        Commands::Likes { item } => {
            let engine = target.open()?;
            let item: ItemId = item.parse().into_diagnostic()?;
            let likes = engine.export_likes(item).into_diagnostic()?;
            let json = serde_json::to_string_pretty(&likes).into_diagnostic()?;
            println!("{json}");
        }

        Commands::Top { n } => {
            let engine = target.open()?;
            let n = parse_top(n.as_deref(), engine.config().default_top_n);
            let list = engine.top_n(n).into_diagnostic()?;
            let json = serde_json::to_string_pretty(&serde_json::json!({ "list": list }))
                .into_diagnostic()?;
            println!("{json}");
        }

        Commands::Catalog { action } => {
            let engine = target.open()?;
            match action {
                CatalogAction::Set { item, title } => {
                    let item: ItemId = item.parse().into_diagnostic()?;
                    engine.catalog().set_title(item, &title).into_diagnostic()?;
                    println!("Set title of {item}: \"{title}\"");
                }
                CatalogAction::Get { item } => {
                    let item: ItemId = item.parse().into_diagnostic()?;
                    let title = engine.catalog().lookup_title(item).into_diagnostic()?;
                    println!("{title}");
                }
            }
        }

        Commands::Audit { action } => match action {
            AuditAction::Export => {
                let engine = target.open()?;
                let exports = engine.export_audit().into_diagnostic()?;
                let json = serde_json::to_string_pretty(&exports).into_diagnostic()?;
                println!("{json}");
            }
        },

        Commands::Info => {
            let engine = target.open()?;
            println!("{}", engine.info().into_diagnostic()?);
        }
    }

    Ok(())
}
