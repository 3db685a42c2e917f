mod commands;
mod config;
mod http;
mod openfoodfacts;
mod server;
mod usda;

use std::process;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{PredictArgs, cmd_predict, cmd_scan};
use crate::config::Config;
use crate::openfoodfacts::OpenFoodFactsClient;
use crate::usda::UsdaClient;
use diabeat_core::models::GlucoseUnit;

#[derive(Parser)]
#[command(
    name = "diabeat",
    version,
    about = "Barcode nutrition lookup and blood glucose estimates"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a barcode in USDA FoodData Central and `OpenFoodFacts`
    Scan {
        /// Barcode number (EAN-13, UPC-A, ...)
        barcode: String,
        /// Serving size in grams (e.g. "30" or "30g"; default: product serving size)
        #[arg(short, long)]
        serving: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Estimate current blood glucose from today's intake
    Predict {
        /// Carbohydrates eaten today, in grams
        #[arg(long, default_value = "0")]
        carbs: f64,
        /// Calories burned exercising today
        #[arg(long)]
        exercise: Option<f64>,
        /// Water drunk today, in ml
        #[arg(long)]
        water: Option<f64>,
        /// Time of the last meal (RFC 3339, e.g. 2025-03-14T12:30:00+01:00)
        #[arg(long)]
        last_meal: Option<String>,
        /// Display unit: mmol or mgdl
        #[arg(short, long, default_value = "mmol")]
        unit: GlucoseUnit,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Disable API key authentication (for development/testing)
        #[arg(long)]
        no_auth: bool,
    },
}

fn init_logging() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "diabeat=info,diabeat_core=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v == "json");

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    if json_logs {
        builder.with_target(false).json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Scan {
            barcode,
            serving,
            json,
        } => {
            let config = Config::load()?;
            let client = http::build_client()?;
            let usda = UsdaClient::new(client.clone(), config.usda_api_key()?);
            let off = OpenFoodFactsClient::new(client);
            cmd_scan(&usda, &off, &barcode, serving.as_deref(), json).await
        }
        Commands::Predict {
            carbs,
            exercise,
            water,
            last_meal,
            unit,
            json,
        } => cmd_predict(&PredictArgs {
            carbs,
            exercise,
            water,
            last_meal,
            unit,
            json,
        }),
        Commands::Serve {
            port,
            bind,
            no_auth,
        } => {
            let config = Config::load()?;
            let api_key = if no_auth {
                None
            } else {
                Some(config.load_or_create_api_key()?)
            };
            let client = http::build_client()?;
            let usda = Arc::new(UsdaClient::new(client.clone(), config.usda_api_key()?));
            let off = Arc::new(OpenFoodFactsClient::new(client));
            server::start_server(usda, off, port, &bind, api_key).await
        }
    }
}
