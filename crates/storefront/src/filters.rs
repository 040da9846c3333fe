//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use crate::views::MAX_STARS;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Renders a star rating as filled and empty stars.
///
/// Usage in templates: `{{ review.rating|stars }}`
#[askama::filter_fn]
pub fn stars(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(star_string(&value.to_string()))
}

fn star_string(raw: &str) -> String {
    let filled = raw.trim().parse::<u64>().unwrap_or(0).min(MAX_STARS);
    (0..MAX_STARS)
        .map(|i| if i < filled { '\u{2605}' } else { '\u{2606}' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_string() {
        assert_eq!(star_string("3"), "★★★☆☆");
        assert_eq!(star_string("0"), "☆☆☆☆☆");
        // Out-of-range ratings from the backend are clamped for display
        assert_eq!(star_string("9"), "★★★★★");
        assert_eq!(star_string("n/a"), "☆☆☆☆☆");
    }
}
