//! Location seeder - populates the location catalog from a JSON file.
//!
//! Usage:
//! ```bash
//! seeder locations.json
//! ```
//!
//! The file is a JSON array of `{lat, lon, region, country}` records.
//! Seeding is idempotent: a record whose coordinates already exist is
//! skipped.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use mistduel_db::locations;

#[derive(Debug, Deserialize)]
struct SeedLocation {
    lat: f64,
    lon: f64,
    region: String,
    country: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let path: PathBuf = std::env::args()
        .nth(1)
        .context("Usage: seeder <locations.json>")?
        .into();

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let seeds: Vec<SeedLocation> =
        serde_json::from_str(&raw).context("Invalid locations file")?;

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    let pool = mistduel_db::create_pool(&database_url).await?;

    let mut inserted = 0usize;
    let mut skipped = 0usize;

    for seed in &seeds {
        if !(-90.0..=90.0).contains(&seed.lat) || !(-180.0..=180.0).contains(&seed.lon) {
            tracing::warn!(lat = seed.lat, lon = seed.lon, "Skipping out-of-bounds location");
            skipped += 1;
            continue;
        }

        if locations::insert(&pool, seed.lat, seed.lon, &seed.region, &seed.country).await? {
            inserted += 1;
        } else {
            skipped += 1;
        }
    }

    tracing::info!(total = seeds.len(), inserted, skipped, "Seeding complete");
    Ok(())
}
