use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use crate::config::LunarSettings;

/// Errors that can occur while loading lunar calendar data
#[derive(Debug, Error)]
pub enum LunarError {
    #[error("Invalid lunar year key: {0}")]
    InvalidYear(String),

    #[error("Invalid new-year date for {year}: {value}")]
    InvalidDate { year: i32, value: String },
}

/// Lunar year of a Gregorian date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LunarYear {
    pub year: i32,
    /// True when no conversion data covered the date and the Gregorian
    /// year was used unchanged
    pub approximate: bool,
}

/// Converts Gregorian birth dates to lunar years
pub trait LunarCalendar: Send + Sync {
    fn lunar_year(&self, date: NaiveDate) -> LunarYear;

    /// Short name reported by the health endpoint
    fn name(&self) -> &'static str;
}

/// Used when no lunar conversion data is available.
///
/// Dates between 1 January and the lunar new year land in the wrong year,
/// which can change the element for those birthdays.
#[derive(Debug, Clone, Copy, Default)]
pub struct GregorianFallback;

impl LunarCalendar for GregorianFallback {
    fn lunar_year(&self, date: NaiveDate) -> LunarYear {
        LunarYear {
            year: date.year(),
            approximate: true,
        }
    }

    fn name(&self) -> &'static str {
        "gregorian-fallback"
    }
}

/// Lunar new-year (Tết) dates keyed by Gregorian year
#[derive(Debug, Clone, Default)]
pub struct TetTable {
    new_year: BTreeMap<i32, NaiveDate>,
}

impl TetTable {
    pub fn new(new_year: BTreeMap<i32, NaiveDate>) -> Self {
        Self { new_year }
    }

    /// Build from `lunar.new_year_dates` (`"1996" = "1996-02-19"`)
    pub fn from_settings(settings: &LunarSettings) -> Result<Self, LunarError> {
        let mut new_year = BTreeMap::new();

        for (key, value) in &settings.new_year_dates {
            let year: i32 = key
                .trim()
                .parse()
                .map_err(|_| LunarError::InvalidYear(key.clone()))?;
            let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
                .ok()
                .filter(|d| d.year() == year)
                .ok_or_else(|| LunarError::InvalidDate {
                    year,
                    value: value.clone(),
                })?;
            new_year.insert(year, date);
        }

        Ok(Self { new_year })
    }

    pub fn len(&self) -> usize {
        self.new_year.len()
    }

    pub fn is_empty(&self) -> bool {
        self.new_year.is_empty()
    }
}

impl LunarCalendar for TetTable {
    fn lunar_year(&self, date: NaiveDate) -> LunarYear {
        match self.new_year.get(&date.year()) {
            Some(tet) if date < *tet => LunarYear {
                year: date.year() - 1,
                approximate: false,
            },
            Some(_) => LunarYear {
                year: date.year(),
                approximate: false,
            },
            None => GregorianFallback.lunar_year(date),
        }
    }

    fn name(&self) -> &'static str {
        "tet-table"
    }
}

/// Pick the calendar for the configured data, warning when conversion is
/// unavailable
pub fn build_calendar(settings: &LunarSettings) -> Result<Arc<dyn LunarCalendar>, LunarError> {
    let table = TetTable::from_settings(settings)?;

    if table.is_empty() {
        tracing::warn!("No lunar new-year data configured, using the Gregorian year as lunar year");
        return Ok(Arc::new(GregorianFallback));
    }

    tracing::info!("Lunar calendar loaded ({} new-year dates)", table.len());
    Ok(Arc::new(table))
}
