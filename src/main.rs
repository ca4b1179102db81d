//! Tern: batch ingestion of ecological survey files into MongoDB

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use tern::config::Config;
use tern::ingest::ChunkedProcessor;
use tern::records::{RecordKind, NODE_COLLECTION};
use tern::store::{indexes, DocumentStore, MongoStore};

/// File extensions accepted for ingestion
const ALLOWED_EXTENSIONS: [&str; 2] = ["csv", "tsv"];

#[derive(Parser)]
#[command(name = "tern")]
#[command(about = "Batch ingestion of ecological survey files into MongoDB")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "tern.toml")]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a survey file into its collection
    Ingest {
        /// Record type of the file
        #[arg(short = 't', long = "type", value_enum)]
        record_type: CliRecordKind,

        /// The file to be ingested
        file: PathBuf,

        /// Rows per batch write
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Fail records whose headers are outside the schema
        #[arg(long)]
        strict_fields: bool,

        #[command(flatten)]
        mongo: MongoArgs,
    },

    /// Create the query indexes on the survey collections
    EnsureIndexes {
        #[command(flatten)]
        mongo: MongoArgs,
    },

    /// Drop all indexes on the survey collections
    DropIndexes {
        #[command(flatten)]
        mongo: MongoArgs,
    },

    /// Write a default configuration file
    Init {
        /// Output directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

/// MongoDB connection overrides shared by the database-touching commands
#[derive(Args)]
struct MongoArgs {
    /// MongoDB hostname
    #[arg(short = 'm', long)]
    mongo_host: Option<String>,

    /// MongoDB database
    #[arg(short, long)]
    database: Option<String>,

    /// MongoDB username
    #[arg(short, long)]
    username: Option<String>,

    /// MongoDB password
    #[arg(short, long)]
    password: Option<String>,
}

impl MongoArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(ref host) = self.mongo_host {
            config.store.host = host.clone();
        }
        if let Some(ref database) = self.database {
            config.store.database = database.clone();
        }
        if let Some(ref username) = self.username {
            config.store.username = Some(username.clone());
        }
        if let Some(ref password) = self.password {
            config.store.password = Some(password.clone());
        }
    }
}

/// CLI record-type tag (mirrors RecordKind with clap support)
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum CliRecordKind {
    /// Species taxonomy
    Taxonomy,
    /// Migration checklist with observation counts
    Checklist,
    /// Migration core environmental attributes
    Core,
}

impl From<CliRecordKind> for RecordKind {
    fn from(kind: CliRecordKind) -> Self {
        match kind {
            CliRecordKind::Taxonomy => RecordKind::Taxonomy,
            CliRecordKind::Checklist => RecordKind::Checklist,
            CliRecordKind::Core => RecordKind::Core,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load or create config; env overrides apply either way
    let mut config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        let mut config = Config::default();
        config.store.apply_env_overrides();
        config
    };

    // Setup logging: -v flags raise the configured level
    let log_level = match cli.verbose {
        0 => config.logging.level.as_level(),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Ingest {
            record_type,
            file,
            chunk_size,
            strict_fields,
            mongo,
        } => {
            mongo.apply(&mut config);
            if let Some(chunk_size) = chunk_size {
                config.ingest.chunk_size = chunk_size;
            }
            if strict_fields {
                config.ingest.strict_fields = true;
            }
            config.validate()?;
            ingest_file(config, record_type.into(), file).await
        }
        Commands::EnsureIndexes { mongo } => {
            mongo.apply(&mut config);
            ensure_indexes(config).await
        }
        Commands::DropIndexes { mongo } => {
            mongo.apply(&mut config);
            drop_indexes(config).await
        }
        Commands::Init { path } => init_config(path).await,
    }
}

async fn ingest_file(config: Config, kind: RecordKind, path: PathBuf) -> Result<()> {
    if !has_allowed_extension(&path) {
        anyhow::bail!(
            "{}: not a valid file extension, expected one of {:?}",
            path.display(),
            ALLOWED_EXTENSIONS
        );
    }
    if !path.is_file() {
        anyhow::bail!("Survey file not found: {}", path.display());
    }

    let store = MongoStore::connect(&config.store).await?;

    // The taxonomy must land before checklists can reference it
    if kind == RecordKind::Checklist && !store.contains_documents(NODE_COLLECTION).await? {
        anyhow::bail!("No taxonomy documents found; ingest the Taxonomy type before Checklist");
    }

    if config.store.drop_indexes {
        indexes::drop_indexes(store.database()).await?;
    }

    info!("Ingesting {} as {}", path.display(), kind);
    let mut file = File::open(&path)?;
    let processor = ChunkedProcessor::new(kind, &config.ingest, &store);
    let stats = processor.process(&mut file).await?;

    println!("\nIngest Complete!");
    println!("================");
    println!("Rows read:        {}", stats.rows_read);
    println!("Valid records:    {}", stats.records_valid);
    println!("Invalid records:  {}", stats.records_invalid);
    println!("Rows skipped:     {}", stats.rows_skipped);
    println!("Chunks flushed:   {}", stats.chunks_flushed);
    println!("Flush errors:     {}", stats.flush_errors);
    println!("Upserted:         {}", stats.writes.upserted);
    println!("Matched:          {}", stats.writes.matched);
    println!("Modified:         {}", stats.writes.modified);
    println!("Processing rate:  {:.1} rows/sec", stats.rows_per_second);
    println!("Elapsed time:     {:.1}s", stats.elapsed_seconds);

    Ok(())
}

async fn ensure_indexes(config: Config) -> Result<()> {
    let store = MongoStore::connect(&config.store).await?;
    indexes::ensure_indexes(store.database()).await?;
    println!("Indexes have been applied.");
    Ok(())
}

async fn drop_indexes(config: Config) -> Result<()> {
    let store = MongoStore::connect(&config.store).await?;
    indexes::drop_indexes(store.database()).await?;
    println!("Indexes have been dropped.");
    Ok(())
}

async fn init_config(path: PathBuf) -> Result<()> {
    let config_path = path.join("tern.toml");
    if config_path.exists() {
        anyhow::bail!("Config file already exists: {}", config_path.display());
    }

    let rendered = toml::to_string_pretty(&Config::default())?;
    std::fs::write(&config_path, rendered)?;
    println!("Created configuration file: {}", config_path.display());

    Ok(())
}

fn has_allowed_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
