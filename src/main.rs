//! emitter-cache CLI - inspect and maintain an emitter location database

use clap::{Parser, Subcommand, ValueEnum};
use emitter_cache::config::{self, CacheConfig};
use emitter_cache::storage::StoreOptions;
use emitter_cache::{ui, BoundingBox, EmitterInfo, EmitterStore, EmitterType, RfIdentification};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "emitter-cache")]
#[command(version)]
#[command(about = "Inspect and maintain a radio-emitter location cache")]
#[command(long_about = r#"
Opens an emitter database (upgrading its schema if needed) and lets you look
inside it.

Example usage:
  emitter-cache migrate --database rf.db
  emitter-cache show --type wlan --id 00:11:22:33:44:55
  emitter-cache near --type lte --south 47.5 --west -122.5 --north 47.7 --east -122.2
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ./emitter-cache.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the database and bring its schema up to date
    Migrate {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Show per-type emitter counts
    Stats {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show everything stored for one emitter
    Show {
        /// Emitter type (wlan, gsm, lte, bt, ...)
        #[arg(short = 't', long = "type")]
        rf_type: EmitterType,

        /// Emitter id (MAC address, cell id, ...)
        #[arg(short, long)]
        id: String,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List emitters of one type inside a lat/lon box
    Near {
        /// Emitter type (wlan, gsm, lte, bt, ...)
        #[arg(short = 't', long = "type")]
        rf_type: EmitterType,

        #[arg(long, allow_negative_numbers = true)]
        south: f64,

        #[arg(long, allow_negative_numbers = true)]
        west: f64,

        #[arg(long, allow_negative_numbers = true)]
        north: f64,

        #[arg(long, allow_negative_numbers = true)]
        east: f64,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Remove one emitter
    Drop {
        /// Emitter type (wlan, gsm, lte, bt, ...)
        #[arg(short = 't', long = "type")]
        rf_type: EmitterType,

        /// Emitter id
        #[arg(short, long)]
        id: String,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct EmitterRecord<'a> {
    ident: &'a RfIdentification,
    #[serde(flatten)]
    info: &'a EmitterInfo,
}

fn open_store(
    database: Option<PathBuf>,
    config: &CacheConfig,
    options: &StoreOptions,
) -> anyhow::Result<EmitterStore> {
    let path = match database {
        Some(path) => path,
        None => config.database_path_in(&std::env::current_dir()?),
    };
    config::ensure_db_dir(&path)?;

    tracing::debug!("Using emitter database {}", path.display());
    Ok(EmitterStore::open_with(&path, options)?)
}

fn print_records(records: &[(RfIdentification, EmitterInfo)], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let json: Vec<EmitterRecord> = records
                .iter()
                .map(|(ident, info)| EmitterRecord { ident, info })
                .collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => println!("{}", ui::emitter_table(records)),
    }
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = config::load_config(cli.config.as_deref())?.unwrap_or_default();
    let options = config.store_options();

    match cli.command {
        Commands::Migrate { database } => {
            let store = open_store(database, &config, &options)?;
            ui::success(&format!("Emitter schema at v{}", store.schema_version()?));
        }

        Commands::Stats { database, format } => {
            let store = open_store(database, &config, &options)?;
            let stats = store.stats()?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
                OutputFormat::Text => {
                    ui::header("📊 Emitter Cache Statistics");
                    ui::field("Schema version", &stats.schema_version.to_string());
                    ui::field("Emitters", &stats.emitters.to_string());
                    let table = ui::stats_table(&stats);
                    if !table.is_empty() {
                        println!("{}", table);
                    }
                }
            }
        }

        Commands::Show { rf_type, id, database, format } => {
            let store = open_store(database, &config, &options)?;
            let ident = RfIdentification::new(id, rf_type);

            match store.get_emitter(&ident)? {
                Some(info) => print_records(&[(ident, info)], format)?,
                None => anyhow::bail!("{} is not in the cache", ident),
            }
        }

        Commands::Near { rf_type, south, west, north, east, database, format } => {
            let store = open_store(database, &config, &options)?;
            let bb = BoundingBox::new(south, west, north, east);
            if bb.is_empty() {
                tracing::warn!(
                    "Box south={} west={} north={} east={} is inverted and matches nothing",
                    south, west, north, east
                );
            }

            let mut idents: Vec<RfIdentification> = store.get_emitters(rf_type, &bb)?.into_iter().collect();
            idents.sort();

            let mut records = Vec::with_capacity(idents.len());
            for ident in idents {
                if let Some(info) = store.get_emitter(&ident)? {
                    records.push((ident, info));
                }
            }

            if let OutputFormat::Text = format {
                ui::header(&format!("🔍 {} {} emitter(s) in box", records.len(), rf_type));
            }
            print_records(&records, format)?;
        }

        Commands::Drop { rf_type, id, database } => {
            let mut store = open_store(database, &config, &options)?;
            let ident = RfIdentification::new(id, rf_type);

            let mut tx = store.begin_transaction()?;
            let removed = tx.drop_emitter(&ident)?;
            tx.end()?;

            if removed {
                ui::success(&format!("Dropped {}", ui::ident(&ident.to_string())));
            } else {
                ui::field("Not stored", &ident.to_string());
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(e) = run(cli) {
        ui::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
