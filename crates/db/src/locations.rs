//! Location catalog queries

use sqlx::FromRow;

use crate::DbPool;

#[derive(Debug, Clone, FromRow)]
pub struct LocationRow {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
    pub region: String,
    pub country: String,
}

/// All catalog ids, for uniform sampling by the location provider.
pub async fn list_ids(pool: &DbPool) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM locations ORDER BY id")
        .fetch_all(pool)
        .await
}

pub async fn get_by_ids(pool: &DbPool, ids: &[i64]) -> Result<Vec<LocationRow>, sqlx::Error> {
    sqlx::query_as::<_, LocationRow>(
        "SELECT id, lat, lon, region, country FROM locations WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(pool)
    .await
}

/// Insert a catalog entry; duplicate coordinates are skipped.
pub async fn insert(
    pool: &DbPool,
    lat: f64,
    lon: f64,
    region: &str,
    country: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO locations (lat, lon, region, country)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (lat, lon) DO NOTHING
        "#,
    )
    .bind(lat)
    .bind(lon)
    .bind(region)
    .bind(country)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
