mod report;
mod run;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "showpipe-cli")]
#[command(about = "Catalog ingest pipeline command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Run the full pipeline in the foreground
    Run {
        /// Lookback window in years for the top-shows filter
        #[arg(long, allow_negative_numbers = true)]
        years: Option<i64>,
    },
    /// Show the status of a run recorded in the Postgres status store
    Status {
        run_id: uuid::Uuid,
    },
    /// Print the current top shows
    Top {
        /// Maximum number of shows to print
        #[arg(long, default_value = "10")]
        limit: i64,
    },
    /// Print persons playing more than one character among the top shows
    Actors,
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("showpipe-cli ready; run with --help for commands");
        return Ok(());
    };

    let config = showpipe_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = showpipe_db::PoolConfig::from_app_config(&config);
    let pool = showpipe_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            showpipe_db::ping(&pool).await?;
            println!("database ok");
        }
        Commands::Db {
            command: DbCommands::Migrate,
        } => {
            let applied = showpipe_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Run { years } => run::run_pipeline(pool, &config, years).await?,
        Commands::Status { run_id } => run::print_run_status(pool, run_id).await?,
        Commands::Top { limit } => report::print_top_shows(&pool, limit).await?,
        Commands::Actors => report::print_multi_character_actors(&pool).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests;
