//! slate CLI
//!
//! Synchronizes declared schemas and inspects live tables.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use slate_db::prelude::*;
use slate_sql_core::schema::IndexKind;

/// Declarative schema sync for MySQL and SQLite.
#[derive(Parser)]
#[command(name = "slate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database engine.
    #[arg(short, long, value_enum, default_value_t = Engine::Mysql)]
    backend: Engine,

    /// Server host, optionally `host:/path/to/socket`.
    #[arg(long, env = "DB_HOST")]
    host: Option<String>,

    /// User name.
    #[arg(long, env = "DB_USER")]
    user: Option<String>,

    /// Password.
    #[arg(long, env = "DB_PASS", hide_env_values = true)]
    password: Option<String>,

    /// Database name (file path or `:memory:` for SQLite).
    #[arg(short, long, env = "DB_NAME")]
    database: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Engine {
    Mysql,
    Sqlite,
}

#[derive(Subcommand)]
enum Commands {
    /// Bring live tables to the declared schema.
    Sync {
        /// JSON schema description.
        #[arg(short, long)]
        schema: PathBuf,

        /// Apply destructive changes (drops, redefinitions).
        #[arg(short, long)]
        force: bool,

        /// Show changes without executing them.
        #[arg(long)]
        dry_run: bool,

        /// Print the SQL of every change.
        #[arg(long)]
        show_sql: bool,
    },

    /// List tables.
    Tables,

    /// Show the live columns of a table.
    Describe {
        /// Table name.
        table: String,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.backend {
        Engine::Mysql => {
            let config = DbConfig::from_parts(cli.host, cli.user, cli.password, cli.database)?;
            run(Database::<MySqlBackend>::with_config(config), cli.command).await
        }
        Engine::Sqlite => {
            let path = cli.database.ok_or(DbError::MissingEnv("DB_NAME"))?;
            let config = DbConfig::sqlite(path)?;
            run(Database::<SqliteBackend>::with_config(config), cli.command).await
        }
    }
}

async fn run<B: Backend>(mut db: Database<B>, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Sync {
            schema,
            force,
            dry_run,
            show_sql,
        } => {
            let schema = load_schema(&schema)?;
            let options = SyncOptions::new().force(force).dry_run(dry_run);
            if dry_run {
                info!("Dry run mode - SQL will be shown but not executed.");
            }

            let changes = db.update_schema(&schema, options).await?;
            for change in &changes {
                println!("{change}");
                if show_sql {
                    for sql in &change.sql {
                        println!("    {sql};");
                    }
                }
            }
            let skipped = changes.iter().filter(|c| c.is_skipped()).count();
            if changes.iter().any(|c| c.is_applied()) {
                println!("schema updated");
            } else if dry_run && changes.len() > skipped {
                println!("{} change(s) planned", changes.len() - skipped);
            } else if changes.is_empty() {
                println!("schema is up to date");
            }
            if skipped > 0 {
                println!("{skipped} change(s) skipped, rerun with --force to apply");
            }
        }

        Commands::Tables => {
            for table in db.tables().await? {
                println!("{table}");
            }
        }

        Commands::Describe { table, json } => {
            let columns = db.describe(&table).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&columns)?);
            } else {
                println!(
                    "{:<24} {:<20} {:<5} {:<10} {}",
                    "column", "type", "null", "index", "default"
                );
                println!("{:-<72}", "");
                for column in &columns {
                    let spec = &column.spec;
                    println!(
                        "{:<24} {:<20} {:<5} {:<10} {}",
                        spec.name,
                        spec.engine_type,
                        if spec.nullable { "yes" } else { "no" },
                        match spec.index {
                            IndexKind::None => "",
                            IndexKind::NonUnique => "index",
                            IndexKind::Unique => "unique",
                        },
                        spec.default
                            .as_ref()
                            .map_or_else(|| String::from("-"), ToString::to_string)
                    );
                }
            }
        }
    }

    Ok(())
}
