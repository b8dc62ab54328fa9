//! Database operations for the raw `all_shows` catalog.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use showpipe_core::NewShow;
use sqlx::PgPool;

use crate::DbError;

/// Rows per `UNNEST` statement. Keeps bind arrays well below protocol limits.
const UPSERT_CHUNK_SIZE: usize = 1_000;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `all_shows` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShowRow {
    pub id: i64,
    pub name: String,
    pub show_type: Option<String>,
    pub language: Option<String>,
    /// Comma-joined genre tags.
    pub genres: String,
    pub status: Option<String>,
    pub premiered: Option<NaiveDate>,
    pub ended: Option<NaiveDate>,
    pub rating_average: Option<f64>,
    pub summary: Option<String>,
    pub source_updated: Option<i64>,
    pub processed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Keeps the last occurrence of every id, preserving first-seen order.
///
/// A single `INSERT ... ON CONFLICT DO UPDATE` cannot touch the same row
/// twice, so duplicates are collapsed here with last-write-wins semantics.
fn dedupe_last_wins(shows: &[NewShow]) -> Vec<&NewShow> {
    let mut index: HashMap<i64, usize> = HashMap::with_capacity(shows.len());
    let mut out: Vec<&NewShow> = Vec::with_capacity(shows.len());

    for show in shows {
        if let Some(&pos) = index.get(&show.id) {
            out[pos] = show;
        } else {
            index.insert(show.id, out.len());
            out.push(show);
        }
    }

    out
}

/// Inserts or replaces shows keyed by `id`.
///
/// Every row written by one call shares a single `processed_at` stamp. All
/// chunks run inside one transaction, so a call is committed as a unit.
/// Returns the number of distinct ids written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; nothing from the call
/// is committed in that case.
pub async fn upsert_shows(pool: &PgPool, shows: &[NewShow]) -> Result<usize, DbError> {
    let unique = dedupe_last_wins(shows);
    if unique.is_empty() {
        return Ok(0);
    }

    let processed_at = Utc::now();
    let mut tx = pool.begin().await?;

    for chunk in unique.chunks(UPSERT_CHUNK_SIZE) {
        let ids: Vec<i64> = chunk.iter().map(|s| s.id).collect();
        let names: Vec<&str> = chunk.iter().map(|s| s.name.as_str()).collect();
        let show_types: Vec<Option<&str>> = chunk.iter().map(|s| s.show_type.as_deref()).collect();
        let languages: Vec<Option<&str>> = chunk.iter().map(|s| s.language.as_deref()).collect();
        let genres: Vec<String> = chunk.iter().map(|s| s.genres_joined()).collect();
        let statuses: Vec<Option<&str>> = chunk.iter().map(|s| s.status.as_deref()).collect();
        let premiered: Vec<Option<NaiveDate>> = chunk.iter().map(|s| s.premiered).collect();
        let ended: Vec<Option<NaiveDate>> = chunk.iter().map(|s| s.ended).collect();
        let ratings: Vec<Option<f64>> = chunk.iter().map(|s| s.rating_average).collect();
        let summaries: Vec<Option<&str>> = chunk.iter().map(|s| s.summary.as_deref()).collect();
        let updated: Vec<Option<i64>> = chunk.iter().map(|s| s.source_updated).collect();

        sqlx::query(
            "INSERT INTO all_shows \
                 (id, name, show_type, language, genres, status, premiered, ended, \
                  rating_average, summary, source_updated, processed_at) \
             SELECT u.id, u.name, u.show_type, u.language, u.genres, u.status, \
                    u.premiered, u.ended, u.rating_average, u.summary, u.source_updated, $12 \
             FROM UNNEST($1::bigint[], $2::text[], $3::text[], $4::text[], $5::text[], \
                         $6::text[], $7::date[], $8::date[], $9::float8[], $10::text[], \
                         $11::bigint[]) \
                  AS u(id, name, show_type, language, genres, status, premiered, ended, \
                       rating_average, summary, source_updated) \
             ON CONFLICT (id) DO UPDATE SET \
                 name           = EXCLUDED.name, \
                 show_type      = EXCLUDED.show_type, \
                 language       = EXCLUDED.language, \
                 genres         = EXCLUDED.genres, \
                 status         = EXCLUDED.status, \
                 premiered      = EXCLUDED.premiered, \
                 ended          = EXCLUDED.ended, \
                 rating_average = EXCLUDED.rating_average, \
                 summary        = EXCLUDED.summary, \
                 source_updated = EXCLUDED.source_updated, \
                 processed_at   = EXCLUDED.processed_at",
        )
        .bind(&ids)
        .bind(&names)
        .bind(&show_types)
        .bind(&languages)
        .bind(&genres)
        .bind(&statuses)
        .bind(&premiered)
        .bind(&ended)
        .bind(&ratings)
        .bind(&summaries)
        .bind(&updated)
        .bind(processed_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(unique.len())
}

/// Fetches a single show by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has that id, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_show(pool: &PgPool, id: i64) -> Result<ShowRow, DbError> {
    sqlx::query_as::<_, ShowRow>(
        "SELECT id, name, show_type, language, genres, status, premiered, ended, \
                rating_average, summary, source_updated, processed_at \
         FROM all_shows \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Returns the number of rows in `all_shows`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_shows(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM all_shows")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
