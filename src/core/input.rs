use chrono::NaiveTime;

use crate::error::{ScanError, ScanResult};

pub const MIN_DURATION_HOURS: f64 = 0.5;

/// Favourite numbers parsed from free text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoriteNumbers {
    /// Accepted two-digit tokens, in entry order
    pub kept: Vec<String>,
    /// Non-empty tokens that were rejected
    pub dropped: Vec<String>,
}

impl FavoriteNumbers {
    /// Seed suffix: kept numbers joined without a separator
    pub fn concatenated(&self) -> String {
        concat_favorites(&self.kept)
    }
}

/// Favourites joined in entry order with no separator, as used in seed keys
pub fn concat_favorites(favorites: &[String]) -> String {
    favorites.concat()
}

/// Split comma separated favourites, keeping only tokens that are exactly
/// two ASCII digits. Blank tokens are ignored entirely.
pub fn parse_favorites(text: &str) -> FavoriteNumbers {
    let mut favorites = FavoriteNumbers::default();

    for token in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if token.len() == 2 && token.bytes().all(|b| b.is_ascii_digit()) {
            favorites.kept.push(token.to_string());
        } else {
            favorites.dropped.push(token.to_string());
        }
    }

    favorites
}

/// Parse a strict 24-hour `HH:MM:SS` time of day
pub fn parse_time_of_day(text: &str) -> ScanResult<NaiveTime> {
    let bytes = text.as_bytes();
    let well_formed = bytes.len() == 8
        && bytes[2] == b':'
        && bytes[5] == b':'
        && [0, 1, 3, 4, 6, 7].iter().all(|&i| bytes[i].is_ascii_digit());

    if !well_formed {
        return Err(ScanError::InputFormat(text.to_string()));
    }

    let field = |i: usize| u32::from(bytes[i] - b'0') * 10 + u32::from(bytes[i + 1] - b'0');

    NaiveTime::from_hms_opt(field(0), field(3), field(6))
        .ok_or_else(|| ScanError::InputFormat(text.to_string()))
}

/// Whole seconds covered by a duration in hours, truncated
pub fn duration_seconds(hours: f64) -> ScanResult<u64> {
    if !hours.is_finite() || hours < MIN_DURATION_HOURS {
        return Err(ScanError::InvalidDuration(hours));
    }

    Ok((hours * 3600.0) as u64)
}
