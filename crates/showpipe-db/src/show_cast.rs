//! Database operations for `top_show_cast`.

use chrono::{DateTime, NaiveDate, Utc};
use showpipe_core::NewCastEntry;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `top_show_cast` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CastEntryRow {
    pub id: i64,
    pub show_id: i64,
    pub show_name: String,
    pub person_id: Option<i64>,
    pub person_name: Option<String>,
    pub person_birthday: Option<NaiveDate>,
    pub person_deathday: Option<NaiveDate>,
    pub person_gender: Option<String>,
    pub person_country_name: Option<String>,
    pub character_id: Option<i64>,
    pub character_name: Option<String>,
    pub image: Option<String>,
    pub processed_at: DateTime<Utc>,
}

/// A person credited with more than one distinct character in the cast set.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct MultiCharacterActorRow {
    pub person_id: i64,
    pub person_name: Option<String>,
    pub character_count: i64,
}

/// Clears `top_show_cast` and writes `entries` in its place.
///
/// Runs as one transaction: a failure mid-insert rolls back to the previous
/// generation instead of leaving a half-written set. Passing an empty slice
/// simply clears the table.
///
/// Returns the number of rows inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails.
pub async fn replace_show_cast(pool: &PgPool, entries: &[NewCastEntry]) -> Result<u64, DbError> {
    let processed_at = Utc::now();
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM top_show_cast")
        .execute(&mut *tx)
        .await?;

    let mut inserted = 0u64;
    for entry in entries {
        inserted += sqlx::query(
            "INSERT INTO top_show_cast \
                 (show_id, show_name, person_id, person_name, person_birthday, \
                  person_deathday, person_gender, person_country_name, character_id, \
                  character_name, image, processed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(entry.show_id)
        .bind(&entry.show_name)
        .bind(entry.person_id)
        .bind(&entry.person_name)
        .bind(entry.person_birthday)
        .bind(entry.person_deathday)
        .bind(&entry.person_gender)
        .bind(&entry.person_country_name)
        .bind(entry.character_id)
        .bind(&entry.character_name)
        .bind(&entry.image)
        .bind(processed_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

/// Returns all cast rows for one show, ordered by insertion.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_show_cast(pool: &PgPool, show_id: i64) -> Result<Vec<CastEntryRow>, DbError> {
    let rows = sqlx::query_as::<_, CastEntryRow>(
        "SELECT id, show_id, show_name, person_id, person_name, person_birthday, \
                person_deathday, person_gender, person_country_name, character_id, \
                character_name, image, processed_at \
         FROM top_show_cast \
         WHERE show_id = $1 \
         ORDER BY id",
    )
    .bind(show_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns persons with more than one distinct character across the cast set,
/// most characters first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_multi_character_actors(
    pool: &PgPool,
) -> Result<Vec<MultiCharacterActorRow>, DbError> {
    let rows = sqlx::query_as::<_, MultiCharacterActorRow>(
        "SELECT person_id, \
                MAX(person_name) AS person_name, \
                COUNT(DISTINCT character_id) AS character_count \
         FROM top_show_cast \
         WHERE person_id IS NOT NULL \
         GROUP BY person_id \
         HAVING COUNT(DISTINCT character_id) > 1 \
         ORDER BY character_count DESC, person_id ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
