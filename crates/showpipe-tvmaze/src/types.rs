//! Response types for the TVMaze catalog endpoints.
//!
//! ## Observed shape
//!
//! ### `GET /shows?page=N`
//! A JSON array of up to 250 shows. Pages past the end of the catalog return
//! HTTP 404 rather than an empty array; there is no total-count header.
//!
//! ### Dates
//! `premiered`, `ended`, `birthday`, and `deathday` are `"YYYY-MM-DD"` strings
//! or `null`. They are kept as strings here and parsed leniently during
//! normalization so one malformed date cannot fail a whole page.
//!
//! ### Missing values
//! Any field may be `null` or absent on older records, including `name`.
//! Pages are decoded one show at a time; a record that still fails to
//! decode is skipped with a warning and the rest of the page is kept.
//!
//! ### `rating`
//! Always an object, but `average` is frequently `null` for unrated shows.
//!
//! ### `GET /shows/{id}/cast`
//! A JSON array of `{person, character, self, voice}`. `person.country` and
//! both `image` objects may be `null`.

use serde::{Deserialize, Deserializer};

/// Treats an explicit `null` like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single show from `GET /shows?page=N`.
#[derive(Debug, Clone, Deserialize)]
pub struct TvMazeShow {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "type", default)]
    pub show_type: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub premiered: Option<String>,
    #[serde(default)]
    pub ended: Option<String>,
    #[serde(default)]
    pub rating: Option<TvMazeRating>,
    #[serde(default)]
    pub summary: Option<String>,
    /// Epoch seconds of the source's last edit.
    #[serde(default)]
    pub updated: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TvMazeRating {
    #[serde(default)]
    pub average: Option<f64>,
}

/// One credit from `GET /shows/{id}/cast`.
#[derive(Debug, Clone, Deserialize)]
pub struct TvMazeCastMember {
    pub person: TvMazePerson,
    pub character: TvMazeCharacter,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TvMazePerson {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country: Option<TvMazeCountry>,
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(default)]
    pub deathday: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TvMazeCountry {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TvMazeCharacter {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<TvMazeImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TvMazeImage {
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default)]
    pub original: Option<String>,
}
