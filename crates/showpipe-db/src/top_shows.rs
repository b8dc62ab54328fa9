//! Database operations for the derived `top_shows` set.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use showpipe_core::TopShowCriteria;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `top_shows` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TopShowRow {
    pub id: i64,
    pub name: String,
    pub language: Option<String>,
    pub genres: String,
    pub premiered: Option<NaiveDate>,
    pub rating_average: Option<f64>,
    pub processed_at: DateTime<Utc>,
}

/// Replaces `top_shows` with the result of evaluating `criteria` against the
/// current `all_shows` snapshot.
///
/// The delete and the insert share one transaction, so readers see either the
/// previous generation or the new one, never a merge. `top_show_cast` is
/// cleared in the same transaction: cast rows belong to one generation and
/// are written again by [`crate::replace_show_cast`]. Ranking is rating
/// descending with unrated shows last; ties break on id so that repeated
/// recomputation over unchanged data yields the same set.
///
/// Returns the number of rows in the new set.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails.
pub async fn recompute_top_shows(
    pool: &PgPool,
    criteria: &TopShowCriteria,
) -> Result<u64, DbError> {
    let min_year = criteria.earliest_premiere_year(Utc::now().year());
    let processed_at = Utc::now();

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM top_show_cast")
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM top_shows")
        .execute(&mut *tx)
        .await?;

    let inserted = sqlx::query(
        "INSERT INTO top_shows \
             (id, name, language, genres, premiered, rating_average, processed_at) \
         SELECT id, name, language, genres, premiered, rating_average, $5 \
         FROM all_shows \
         WHERE language = $1 \
           AND $2 = ANY(string_to_array(genres, ',')) \
           AND premiered IS NOT NULL \
           AND EXTRACT(YEAR FROM premiered)::int >= $3 \
         ORDER BY rating_average DESC NULLS LAST, id ASC \
         LIMIT $4",
    )
    .bind(criteria.language)
    .bind(criteria.genre)
    .bind(min_year)
    .bind(criteria.limit)
    .bind(processed_at)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await?;
    Ok(inserted)
}

/// Returns up to `limit` top shows, best rated first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_top_shows(pool: &PgPool, limit: i64) -> Result<Vec<TopShowRow>, DbError> {
    let rows = sqlx::query_as::<_, TopShowRow>(
        "SELECT id, name, language, genres, premiered, rating_average, processed_at \
         FROM top_shows \
         ORDER BY rating_average DESC NULLS LAST, id ASC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns `(id, name)` for every row of the current top set, in rank order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_top_show_refs(pool: &PgPool) -> Result<Vec<(i64, String)>, DbError> {
    let rows = sqlx::query_as::<_, (i64, String)>(
        "SELECT id, name FROM top_shows ORDER BY rating_average DESC NULLS LAST, id ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
