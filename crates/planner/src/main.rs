//! jsonapi-plan
//!
//! Builds the query plan for a JSON-API request against a TOML schema and
//! prints the resulting SQL.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use jsonapi_plan::schema::{Dialect, PlanQueryBuilder, SchemaRegistry};
use jsonapi_plan::{PlannerConfig, Request};

#[derive(Debug, Parser)]
#[command(name = "jsonapi-plan", version, about = "Render the SQL plan for a JSON-API request")]
struct Cli {
    /// Schema file declaring resources and relationships.
    #[arg(long, env = "JSONAPI_SCHEMA")]
    schema: PathBuf,

    /// Resource type the request targets.
    #[arg(long = "type")]
    resource_type: String,

    /// Request parameters as JSON; read from stdin when neither this nor
    /// `--request-file` is given.
    #[arg(long, conflicts_with = "request_file")]
    request: Option<String>,

    /// File containing the request parameters as JSON.
    #[arg(long)]
    request_file: Option<PathBuf>,

    /// SQL dialect, overriding JSONAPI_SQL_DIALECT.
    #[arg(long)]
    dialect: Option<Dialect>,

    /// Print the plan as JSON instead of SQL.
    #[arg(long)]
    explain: bool,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();

    let mut config = PlannerConfig::from_env().context("failed to load configuration")?;
    if let Some(dialect) = cli.dialect {
        config.dialect = dialect;
    }
    info!(
        dialect = %config.dialect,
        max_include_depth = config.max_include_depth,
        "Configuration loaded"
    );

    let registry = SchemaRegistry::load(&cli.schema)?.with_config(config.clone());
    info!(resources = registry.resource_types().len(), "Schema loaded");

    let resource = registry
        .resource(&cli.resource_type)
        .with_context(|| format!("unknown resource type '{}'", cli.resource_type))?;

    let raw = read_request(cli.request, cli.request_file)?;
    let request: Request = raw.parse().context("invalid request parameters")?;

    let plan = resource
        .pipeline()
        .build(&request)
        .context("failed to build query plan")?;

    if cli.explain {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let rendered = PlanQueryBuilder::new(&plan).render(config.dialect);
    println!("{};", rendered.sql);
    for preload in &rendered.preloads {
        println!(
            "-- preload {} ({} = {})",
            preload.path, preload.owner_key, preload.related_key
        );
        println!("{};", preload.sql);
    }

    Ok(())
}

fn read_request(inline: Option<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(raw) = inline {
        return Ok(raw);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read request file {}", path.display()));
    }
    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .context("failed to read request from stdin")?;
    Ok(raw)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
