mod commands;
mod ticks;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ccdb-cli")]
#[command(about = "Harvests Ohio child care records from the ODJFS search site")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Insert the counties from the counties file; existing rows are kept
    SeedCounties,
    /// Refresh county listings, discovering new stubs
    County {
        #[command(flatten)]
        target: CountyTarget,
    },
    /// Refresh child care detail pages
    Childcare {
        #[command(flatten)]
        target: ChildCareTarget,
    },
    /// Geocode records whose address is new or changed
    Geocode {
        /// Maximum records to geocode (defaults to CCDB_GEOCODE_BATCH_SIZE)
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct CountyTarget {
    /// Refresh a single county by name (e.g., FRANKLIN)
    #[arg(long)]
    name: Option<String>,
    /// Refresh the N least recently processed counties
    #[arg(long, value_name = "N")]
    next: Option<u32>,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct ChildCareTarget {
    /// Refresh a single record by its external URL id
    #[arg(long)]
    url_id: Option<String>,
    /// Refresh the N oldest records, one per tick
    #[arg(long, value_name = "N")]
    next: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = ccdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(?config, "configuration loaded");

    let pool_config = ccdb_db::PoolConfig::from_app_config(&config);
    let pool = ccdb_db::connect_pool(&config.database_url, pool_config).await?;
    ccdb_db::ping(&pool).await?;

    match cli.command {
        Commands::Migrate => commands::run_migrate(&pool).await,
        Commands::SeedCounties => commands::run_seed_counties(&pool, &config).await,
        Commands::County { target } => match (target.name, target.next) {
            (Some(name), _) => commands::run_county_one(pool, &config, &name).await,
            (None, Some(n)) => commands::run_county_next(pool, &config, n).await,
            (None, None) => anyhow::bail!("either --name or --next is required"),
        },
        Commands::Childcare { target } => match (target.url_id, target.next) {
            (Some(id), _) => commands::run_child_care_one(pool, &config, &id).await,
            (None, Some(n)) => commands::run_child_care_next(pool, &config, n).await,
            (None, None) => anyhow::bail!("either --url-id or --next is required"),
        },
        Commands::Geocode { limit } => {
            let limit = limit.unwrap_or(config.geocode_batch_size);
            commands::run_geocode(pool, &config, limit).await
        }
    }
}
