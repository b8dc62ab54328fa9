//! Read-only reports over the derived tables.

use chrono::NaiveDate;

/// Format an optional date for display, returning `"-"` when `None`.
fn fmt_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string())
}

fn fmt_rating(rating: Option<f64>) -> String {
    rating.map_or_else(|| "-".to_string(), |r| format!("{r:.1}"))
}

/// Truncates `text` to `max` characters, marking the cut with `...`.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_owned()
    }
}

/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn print_top_shows(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let limit = limit.clamp(1, showpipe_core::TOP_SHOWS_LIMIT);
    let shows = showpipe_db::list_top_shows(pool, limit).await?;

    if shows.is_empty() {
        println!("no top shows recorded; run `showpipe-cli run` first");
        return Ok(());
    }

    let header = format!("{:<10}{:<8}{:<13}NAME", "ID", "RATING", "PREMIERED");
    println!("{header}");
    for show in &shows {
        println!(
            "{:<10}{:<8}{:<13}{}",
            show.id,
            fmt_rating(show.rating_average),
            fmt_date(show.premiered),
            truncate(&show.name, 50)
        );
    }

    Ok(())
}

/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn print_multi_character_actors(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let actors = showpipe_db::list_multi_character_actors(pool).await?;

    if actors.is_empty() {
        println!("no person plays more than one character among the top shows");
        return Ok(());
    }

    let header = format!("{:<12}{:<12}NAME", "PERSON", "CHARACTERS");
    println!("{header}");
    for actor in &actors {
        println!(
            "{:<12}{:<12}{}",
            actor.person_id,
            actor.character_count,
            actor.person_name.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}
