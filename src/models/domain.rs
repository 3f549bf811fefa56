use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{element::element_of_year, input::duration_seconds, seed::MAX_YEAR};
use crate::error::{ScanError, ScanResult};
use crate::services::lunar::LunarCalendar;

/// One of the five traditional elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    Metal,
    Water,
    Wood,
    Fire,
    Earth,
}

impl Element {
    pub const ALL: [Element; 5] = [
        Element::Metal,
        Element::Water,
        Element::Wood,
        Element::Fire,
        Element::Earth,
    ];

    /// The element this one feeds along the generative cycle
    /// Metal -> Water -> Wood -> Fire -> Earth -> Metal.
    pub fn generates(self) -> Element {
        match self {
            Element::Metal => Element::Water,
            Element::Water => Element::Wood,
            Element::Wood => Element::Fire,
            Element::Fire => Element::Earth,
            Element::Earth => Element::Metal,
        }
    }

    /// Vietnamese display label
    pub fn label(self) -> &'static str {
        match self {
            Element::Metal => "Kim",
            Element::Water => "Thủy",
            Element::Wood => "Mộc",
            Element::Fire => "Hỏa",
            Element::Earth => "Thổ",
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The person the scan is run for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub birth_date: NaiveDate,
    pub lunar_year: i32,
    pub element: Element,
    /// True when the lunar year fell back to the Gregorian year
    pub approximate_lunar_year: bool,
}

impl UserProfile {
    pub fn new(birth_date: NaiveDate, calendar: &dyn LunarCalendar) -> Self {
        let lunar = calendar.lunar_year(birth_date);
        Self {
            birth_date,
            lunar_year: lunar.year,
            element: element_of_year(lunar.year),
            approximate_lunar_year: lunar.approximate,
        }
    }
}

/// Validated, read-only description of one scan window.
///
/// Every date a seed key formats, including the last second of the window,
/// lies in a year no later than [`MAX_YEAR`].
#[derive(Debug, Clone, Serialize)]
pub struct ScanRequest {
    pub target_date: NaiveDate,
    /// Two-digit favourite numbers in entry order
    pub favorites: Vec<String>,
    pub start: NaiveDateTime,
    pub duration_hours: f64,
    total_seconds: u64,
}

impl ScanRequest {
    pub fn new(
        target_date: NaiveDate,
        favorites: Vec<String>,
        start: NaiveDateTime,
        duration_hours: f64,
    ) -> ScanResult<Self> {
        let total_seconds = duration_seconds(duration_hours)?;
        let last = i64::try_from(total_seconds - 1)
            .ok()
            .and_then(chrono::TimeDelta::try_seconds)
            .and_then(|window| start.checked_add_signed(window))
            .ok_or(ScanError::InvalidDuration(duration_hours))?;

        if target_date.year() > MAX_YEAR {
            return Err(ScanError::InvalidDate(format!(
                "target year {} is after {}",
                target_date.year(),
                MAX_YEAR
            )));
        }
        if last.year() > MAX_YEAR {
            return Err(ScanError::InvalidDate(format!(
                "scan window ends at {} which is after year {}",
                last, MAX_YEAR
            )));
        }

        Ok(Self {
            target_date,
            favorites,
            start,
            duration_hours,
            total_seconds,
        })
    }

    /// Number of whole seconds in the half-open window
    pub fn total_seconds(&self) -> u64 {
        self.total_seconds
    }

    /// First second after the window
    pub fn end(&self) -> NaiveDateTime {
        self.start + chrono::TimeDelta::seconds(self.total_seconds as i64)
    }

    /// Timestamp of the second at `offset` from the start
    pub fn timestamp_at(&self, offset: u64) -> NaiveDateTime {
        self.start + chrono::TimeDelta::seconds(offset as i64)
    }
}

/// Five two-digit numbers derived for one second
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub timestamp: NaiveDateTime,
    pub numbers: [u8; 5],
}

impl Draw {
    /// Numbers as zero-padded text, e.g. `["07", "42", ...]`
    pub fn formatted(&self) -> Vec<String> {
        self.numbers.iter().map(|n| format!("{:02}", n)).collect()
    }
}

/// A draw that passed the element filter and hit the matching second
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub draw: Draw,
    pub second: u8,
}
