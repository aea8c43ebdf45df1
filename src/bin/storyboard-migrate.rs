//! Generate and apply storyboard-store migrations
//!
//! Reads `DATABASE_URL` (or the `DB_*` settings) from the environment or `.env`.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use storyboard_store::migration::{self, ordering_timestamp};
use storyboard_store::{MigrationRunner, MySqlDatabase, StoreConfig, StoreError, entities};

#[derive(Parser)]
#[command(name = "storyboard-migrate")]
#[command(author, version, about = "Storyboard schema migrations")]
struct Cli {
    /// Migrations directory (overrides MIGRATIONS_DIR)
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write CREATE TABLE migrations from the entity schemas
    Generate {
        /// Only this entity or table (e.g. `User` or `users`)
        #[arg(short, long)]
        entity: Option<String>,

        /// Migration name used instead of `create_<table>_table`
        #[arg(short, long, requires = "entity")]
        name: Option<String>,
    },

    /// Apply pending migrations
    Run,

    /// Show executed and pending migrations
    Status,

    /// Write an empty migration template
    Create {
        /// Migration name
        #[arg(required = true)]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("storyboard_store=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = StoreConfig::from_env();
    if let Some(dir) = cli.dir {
        config.migrations_dir = dir;
    }

    match cli.command {
        Commands::Generate { entity, name } => {
            let now = Utc::now();
            let artifacts = match entity {
                Some(entity) => {
                    let schema = entities::schema_for(&entity).ok_or_else(|| {
                        StoreError::invalid_schema(format!("Unknown entity: {}", entity))
                    })?;
                    vec![migration::generate_artifact(
                        &schema,
                        name.as_deref(),
                        &ordering_timestamp(now, 0),
                        now,
                    )?]
                }
                None => migration::generate_all(now)?,
            };
            for artifact in &artifacts {
                let path = migration::write_artifact(&config.migrations_dir, artifact).await?;
                println!("Generated {}", path.display());
            }
        }
        Commands::Create { name } => {
            let path = migration::create_template(&config.migrations_dir, &name, Utc::now()).await?;
            println!("Created {}", path.display());
        }
        Commands::Run => {
            let runner = connect(&config).await?;
            let applied = runner.run().await?;
            println!("Applied {} migration(s)", applied.len());
        }
        Commands::Status => {
            let status = connect(&config).await?.status().await?;
            println!("Executed ({}):", status.executed.len());
            for name in &status.executed {
                println!("  {}", name);
            }
            println!("Pending ({}):", status.pending.len());
            for name in &status.pending {
                println!("  {}", name);
            }
        }
    }

    Ok(())
}

async fn connect(config: &StoreConfig) -> Result<MigrationRunner, StoreError> {
    let db = MySqlDatabase::connect(config).await?;
    Ok(MigrationRunner::from_config(Arc::new(db), config))
}
