//! Catalog types shared by the fetcher, the database layer, and the pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Maximum number of rows kept in the derived top-shows set.
pub const TOP_SHOWS_LIMIT: i64 = 10;

/// Largest lookback window representable in the stored criteria.
pub const MAX_LOOKBACK_YEARS: u16 = u16::MAX;

/// A catalog show normalized for storage in `all_shows`.
///
/// `processed_at` is not part of this type; the writer stamps it at upsert time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewShow {
    /// Catalog identifier, stable across fetches. Upserts key on it.
    pub id: i64,
    pub name: String,
    pub show_type: Option<String>,
    pub language: Option<String>,
    /// Genre tags. Persisted as a comma-joined string, matched as a set.
    pub genres: Vec<String>,
    pub status: Option<String>,
    pub premiered: Option<NaiveDate>,
    pub ended: Option<NaiveDate>,
    pub rating_average: Option<f64>,
    pub summary: Option<String>,
    /// Source-supplied last-updated epoch seconds.
    pub source_updated: Option<i64>,
}

impl NewShow {
    /// Genres in their stored, comma-joined form.
    #[must_use]
    pub fn genres_joined(&self) -> String {
        self.genres.join(",")
    }

    #[must_use]
    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g == genre)
    }
}

/// One `(show, person, character)` row destined for `top_show_cast`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCastEntry {
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
}

/// Fixed filter used when recomputing `top_shows`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopShowCriteria {
    pub language: &'static str,
    pub genre: &'static str,
    pub lookback_years: u16,
    pub limit: i64,
}

impl TopShowCriteria {
    /// English-language `Action` shows premiered within `lookback_years`.
    #[must_use]
    pub fn english_action(lookback_years: u16) -> Self {
        Self {
            language: "English",
            genre: "Action",
            lookback_years,
            limit: TOP_SHOWS_LIMIT,
        }
    }

    /// Earliest premiere year that still falls inside the window, relative to
    /// `current_year`. Comparison is by calendar year, not exact date.
    #[must_use]
    pub fn earliest_premiere_year(&self, current_year: i32) -> i32 {
        current_year - i32::from(self.lookback_years)
    }
}

/// Validates a caller-supplied lookback window.
///
/// # Errors
///
/// Returns [`CoreError::InvalidLookbackYears`] when `years` is negative or
/// does not fit in a `u16`.
pub fn validate_lookback_years(years: i64) -> Result<u16, CoreError> {
    u16::try_from(years)
        .map_err(|_| CoreError::InvalidLookbackYears {
            value: years,
            max: MAX_LOOKBACK_YEARS,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show_with_genres(genres: &[&str]) -> NewShow {
        NewShow {
            id: 1,
            name: "Test".to_string(),
            show_type: None,
            language: Some("English".to_string()),
            genres: genres.iter().map(|g| (*g).to_string()).collect(),
            status: None,
            premiered: None,
            ended: None,
            rating_average: None,
            summary: None,
            source_updated: None,
        }
    }

    #[test]
    fn genres_joined_uses_comma() {
        let show = show_with_genres(&["Action", "Crime"]);
        assert_eq!(show.genres_joined(), "Action,Crime");
        assert_eq!(show_with_genres(&[]).genres_joined(), "");
    }

    #[test]
    fn has_genre_matches_whole_tags_only() {
        let show = show_with_genres(&["Action-Adventure"]);
        assert!(!show.has_genre("Action"));
        assert!(show.has_genre("Action-Adventure"));
    }

    #[test]
    fn lookback_validation_rejects_negative() {
        assert_eq!(
            validate_lookback_years(-1),
            Err(CoreError::InvalidLookbackYears {
                value: -1,
                max: MAX_LOOKBACK_YEARS
            })
        );
    }

    #[test]
    fn lookback_validation_accepts_zero_and_max() {
        assert_eq!(validate_lookback_years(0), Ok(0));
        assert_eq!(
            validate_lookback_years(i64::from(MAX_LOOKBACK_YEARS)),
            Ok(MAX_LOOKBACK_YEARS)
        );
        assert!(validate_lookback_years(i64::from(MAX_LOOKBACK_YEARS) + 1).is_err());
    }

    #[test]
    fn lookback_validation_accepts_long_windows() {
        assert_eq!(validate_lookback_years(500), Ok(500));
        assert_eq!(
            TopShowCriteria::english_action(500).earliest_premiere_year(2026),
            1526
        );
    }

    #[test]
    fn earliest_premiere_year_subtracts_window() {
        let criteria = TopShowCriteria::english_action(5);
        assert_eq!(criteria.earliest_premiere_year(2026), 2021);
        assert_eq!(criteria.limit, TOP_SHOWS_LIMIT);
    }
}
