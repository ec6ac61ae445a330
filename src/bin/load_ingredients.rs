//! Ingredient catalogue loader.
//!
//! Usage:
//! ```bash
//! # Load from a JSON file (uses DATABASE_URL / MYSQL_* from the environment)
//! cargo run --bin load-ingredients -- data/ingredients.json
//!
//! # Override database URL
//! cargo run --bin load-ingredients -- data/ingredients.json --database-url sqlite:./foodgram.db?mode=rwc
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use foodgram_service::config::Config;
use foodgram_service::db::create_pool;
use foodgram_service::services::ingredients::{load_catalogue, IngredientRecord};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "load-ingredients",
    about = "Load the ingredient catalogue from a JSON file",
    long_about = "Reads a JSON array of {name, measurement_unit} objects and inserts every ingredient whose name is not stored yet"
)]
struct LoadArgs {
    /// JSON file with the catalogue
    json_file: PathBuf,

    /// Database URL override
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let args = LoadArgs::parse();

    let mut config = Config::from_env()?;
    if let Some(url) = args.database_url {
        config.database.url = Some(url);
    }

    let raw = tokio::fs::read_to_string(&args.json_file)
        .await
        .with_context(|| format!("failed to read {}", args.json_file.display()))?;
    let records: Vec<IngredientRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of ingredients", args.json_file.display()))?;
    log::info!(
        "Read {} ingredients from {}",
        records.len(),
        args.json_file.display()
    );

    let pool = create_pool(&config).await?;
    let created = load_catalogue(&pool, records).await?;

    log::info!("Loaded {} new ingredients", created);
    println!("Loaded {} new ingredients.", created);
    Ok(())
}
