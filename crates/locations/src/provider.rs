//! Catalog-backed location provider

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use tokio::sync::Mutex;

use mistduel_core::duel::RoundLocation;
use mistduel_db::{DbPool, LocationRow, locations};

#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Location catalog is empty")]
    EmptyCatalog,
}

/// Street-view display URL for a coordinate pair.
pub fn street_view_url(lat: f64, lon: f64) -> String {
    format!("https://www.google.com/maps/@{lat},{lon},17z")
}

/// Uniform random selection over the location catalog.
pub struct LocationProvider {
    pool: DbPool,
    /// Thread-safe RNG for random selection.
    rng: Mutex<StdRng>,
}

impl LocationProvider {
    pub fn new(pool: DbPool) -> Self {
        Self { pool, rng: Mutex::new(StdRng::from_os_rng()) }
    }

    /// `n` distinct locations drawn uniformly at random. Returns the whole
    /// catalog when `n` exceeds it.
    pub async fn random_locations(&self, n: usize) -> Result<Vec<RoundLocation>, LocationError> {
        let ids = locations::list_ids(&self.pool).await?;
        if ids.is_empty() {
            return Err(LocationError::EmptyCatalog);
        }

        let picked: Vec<i64> = {
            let mut rng = self.rng.lock().await;
            pick_distinct(&mut rng, &ids, n)
        };

        let rows = locations::get_by_ids(&self.pool, &picked).await?;
        Ok(rows.into_iter().map(into_round_location).collect())
    }

    /// One random location (solo practice endpoint).
    pub async fn random_one(&self) -> Result<RoundLocation, LocationError> {
        self.random_locations(1)
            .await?
            .into_iter()
            .next()
            .ok_or(LocationError::EmptyCatalog)
    }
}

/// Sample up to `n` distinct ids uniformly.
fn pick_distinct(rng: &mut StdRng, ids: &[i64], n: usize) -> Vec<i64> {
    let amount = n.min(ids.len());
    sample(rng, ids.len(), amount).into_iter().map(|i| ids[i]).collect()
}

fn into_round_location(row: LocationRow) -> RoundLocation {
    let url = street_view_url(row.lat, row.lon);
    RoundLocation { lat: row.lat, lon: row.lon, region: row.region, country: row.country, url }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_street_view_url_format() {
        assert_eq!(
            street_view_url(48.8566, 2.3522),
            "https://www.google.com/maps/@48.8566,2.3522,17z"
        );
    }

    #[test]
    fn test_pick_distinct_returns_unique_ids() {
        let mut rng = StdRng::seed_from_u64(7);
        let ids: Vec<i64> = (100..150).collect();

        let picked = pick_distinct(&mut rng, &ids, 13);
        assert_eq!(picked.len(), 13);

        let mut deduped = picked.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), 13);
        assert!(picked.iter().all(|id| ids.contains(id)));
    }

    #[test]
    fn test_pick_distinct_caps_at_catalog_size() {
        let mut rng = StdRng::seed_from_u64(7);
        let ids: Vec<i64> = (0..5).collect();
        assert_eq!(pick_distinct(&mut rng, &ids, 13).len(), 5);
    }
}
