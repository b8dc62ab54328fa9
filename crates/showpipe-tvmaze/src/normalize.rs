//! Normalization from raw TVMaze types to [`showpipe_core`] row types.

use chrono::NaiveDate;
use showpipe_core::{NewCastEntry, NewShow};

use crate::types::{TvMazeCastMember, TvMazeShow};

/// Parses a `"YYYY-MM-DD"` date, treating blanks and malformed values as absent.
fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            tracing::debug!(raw, error = %e, "unparseable date from catalog; storing NULL");
            None
        }
    }
}

/// Normalizes a raw [`TvMazeShow`] into a [`NewShow`].
#[must_use]
pub fn normalize_show(show: TvMazeShow) -> NewShow {
    NewShow {
        id: show.id,
        premiered: parse_date(show.premiered.as_deref()),
        ended: parse_date(show.ended.as_deref()),
        rating_average: show.rating.and_then(|r| r.average),
        name: show.name,
        show_type: show.show_type.filter(|s| !s.is_empty()),
        language: show.language.filter(|s| !s.is_empty()),
        genres: show
            .genres
            .into_iter()
            .map(|g| g.trim().to_owned())
            .filter(|g| !g.is_empty())
            .collect(),
        status: show.status,
        summary: show.summary,
        source_updated: show.updated,
    }
}

/// Flattens a show's cast list into one [`NewCastEntry`] per credit,
/// denormalized with the show's id and name.
#[must_use]
pub fn normalize_cast(
    show_id: i64,
    show_name: &str,
    cast: Vec<TvMazeCastMember>,
) -> Vec<NewCastEntry> {
    cast.into_iter()
        .map(|member| {
            let person = member.person;
            let character = member.character;
            NewCastEntry {
                show_id,
                show_name: show_name.to_owned(),
                person_id: person.id,
                person_name: person.name,
                person_birthday: parse_date(person.birthday.as_deref()),
                person_deathday: parse_date(person.deathday.as_deref()),
                person_gender: person.gender,
                person_country_name: person.country.and_then(|c| c.name),
                character_id: character.id,
                character_name: character.name,
                image: character.image.and_then(|i| i.original),
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
