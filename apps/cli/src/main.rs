//! # veritax CLI Entry Point
//!
//! Assembles subcommands and dispatches to the engine and storage layers.
//!
//! ## Exit Codes
//! - `0` - verification passed
//! - `1` - verification failed, or the command errored

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{error, info};

use veritax_core::money::DEFAULT_TOLERANCE;
use veritax_core::verify::{verify_order, VerifyOptions};
use veritax_db::{Database, DbConfig, PartnerConfig, PartnerKey};

mod config;
mod render;

use config::AppConfig;
use render::TaxView;

/// Veritax: discount-pattern classification and tax back-out audit.
///
/// Imports order snapshots into a local SQLite store and verifies their
/// stored tax amounts against a full recomputation under tax-inclusive
/// pricing.
#[derive(Parser, Debug)]
#[command(name = "veritax", version, about)]
struct Cli {
    /// Snapshot database path (overrides VERITAX_DB_PATH).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify the stored taxes of one imported order.
    VerifyOrder(VerifyOrderArgs),
    /// Import an order snapshot document (JSON file).
    Import(ImportArgs),
    /// Import a partner configuration document (JSON file).
    ImportPartnerConfig(ImportArgs),
}

#[derive(clap::Args, Debug)]
struct VerifyOrderArgs {
    /// Internal order id of an imported snapshot.
    order_id: String,

    /// Display precision in decimal places.
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(2..=8))]
    precision: u32,

    /// Maximum absolute difference still counted as a match.
    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    tolerance: Decimal,

    /// How much of the tax comparison to show.
    #[arg(long, value_enum, default_value = "basic")]
    tax_view: TaxView,

    /// Also display the partner configuration for this order.
    #[arg(long)]
    show_partner_config: bool,
}

#[derive(clap::Args, Debug)]
struct ImportArgs {
    /// Path to the JSON document.
    file: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let app_config = AppConfig::load();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&app_config.log_filter)),
        )
        .init();

    let cli = Cli::parse();
    let app_config = app_config.with_db_override(cli.db.clone());

    match run(cli, app_config).await {
        Ok(passed) => {
            if passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Dispatches one command. Returns whether the outcome counts as a pass.
async fn run(cli: Cli, app_config: AppConfig) -> anyhow::Result<bool> {
    let db = Database::new(DbConfig::new(&app_config.database_path))
        .await
        .with_context(|| {
            format!(
                "opening snapshot database at {}",
                app_config.database_path.display()
            )
        })?;

    match cli.command {
        Commands::VerifyOrder(args) => verify_command(&db, args).await,
        Commands::Import(args) => {
            let document = std::fs::read_to_string(&args.file)
                .with_context(|| format!("reading {}", args.file.display()))?;
            let id = db.snapshots().import_raw(&document).await?;
            info!(order_id = %id, "Snapshot imported");
            println!("Imported order snapshot {id}");
            Ok(true)
        }
        Commands::ImportPartnerConfig(args) => {
            let document = std::fs::read_to_string(&args.file)
                .with_context(|| format!("reading {}", args.file.display()))?;
            let config: PartnerConfig =
                serde_json::from_str(&document).context("parsing partner config document")?;
            db.partner_configs().upsert(&config).await?;
            println!(
                "Imported partner config for location {}",
                config.location_id
            );
            Ok(true)
        }
    }
}

async fn verify_command(db: &Database, args: VerifyOrderArgs) -> anyhow::Result<bool> {
    let order = db.snapshots().get(&args.order_id).await?;

    let options = VerifyOptions {
        tolerance: args.tolerance,
        precision: args.precision,
    };
    let result = verify_order(&order, &options)
        .with_context(|| format!("verifying order {}", args.order_id))?;

    print!("{}", render::render_report(&result, args.tax_view));

    if args.show_partner_config {
        show_partner_config(db, &args.order_id).await?;
    }

    Ok(result.passed())
}

/// Looks up and prints the partner configuration for an order.
///
/// The partner id tuple lives in the snapshot envelope, outside the
/// engine's model, so it is read from the raw document.
async fn show_partner_config(db: &Database, order_id: &str) -> anyhow::Result<()> {
    let raw = db.snapshots().get_raw(order_id).await?;

    let field = |name: &str| {
        raw.get(name)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };
    let (Some(partner_id), Some(application_id), Some(brand_id), Some(location_id)) = (
        field("partner_id"),
        field("application_id"),
        field("brand_id"),
        field("location_id"),
    ) else {
        println!("Partner configuration unavailable: snapshot carries no partner id tuple");
        return Ok(());
    };

    let key = PartnerKey {
        partner_id,
        application_id,
        brand_id,
        location_id,
    };
    let config = db.partner_configs().find(&key).await?;
    print!("{}", render::render_partner_config(&key, config.as_ref()));
    Ok(())
}
