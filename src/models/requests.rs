use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::input::{parse_favorites, parse_time_of_day, FavoriteNumbers};
use crate::core::seed::MAX_YEAR;
use crate::error::{ScanError, ScanResult};
use crate::models::domain::ScanRequest;

pub const MIN_BIRTH_YEAR: i32 = 1900;

/// Request to run a scan
///
/// Every field except `favorites` has a default so a bare `{}` body scans
/// the next hour for the default birth date.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScanRequestBody {
    #[serde(alias = "birth_date", rename = "birthDate", default = "default_birth_date")]
    pub birth_date: NaiveDate,
    #[serde(alias = "target_date", rename = "targetDate", default)]
    pub target_date: Option<NaiveDate>,
    /// Free text, comma separated
    #[serde(default)]
    pub favorites: String,
    #[serde(alias = "start_date", rename = "startDate", default)]
    pub start_date: Option<NaiveDate>,
    /// `HH:MM:SS`
    #[serde(alias = "start_time", rename = "startTime", default)]
    pub start_time: Option<String>,
    /// Time of day chosen on the previous submission, echoed back by the
    /// server so the form keeps it across re-renders
    #[serde(alias = "saved_time", rename = "savedTime", default)]
    pub saved_time: Option<String>,
    #[validate(range(min = 0.5))]
    #[serde(alias = "duration_hours", rename = "durationHours", default = "default_duration_hours")]
    pub duration_hours: f64,
    #[serde(alias = "resume_from_offset", rename = "resumeFromOffset", default)]
    pub resume_from_offset: Option<u64>,
}

fn default_birth_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1990, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn default_duration_hours() -> f64 {
    1.0
}

/// A scan body resolved against the current local time
#[derive(Debug, Clone)]
pub struct ResolvedScan {
    pub birth_date: NaiveDate,
    pub request: ScanRequest,
    pub favorites: FavoriteNumbers,
    /// The `HH:MM:SS` text actually used, handed back as `savedTime`
    pub saved_time: String,
    pub offset: u64,
}

impl ScanRequestBody {
    /// Apply defaults and parse the free-text fields.
    ///
    /// The start time comes from `startTime`, then `savedTime`, then `now`.
    pub fn resolve(&self, now: NaiveDateTime) -> ScanResult<ResolvedScan> {
        check_birth_date(self.birth_date)?;

        let time_text = self
            .start_time
            .as_deref()
            .or(self.saved_time.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| now.format("%H:%M:%S").to_string());
        let time = parse_time_of_day(&time_text)?;

        let today = now.date();
        let start = self.start_date.unwrap_or(today).and_time(time);
        let favorites = parse_favorites(&self.favorites);

        let request = ScanRequest::new(
            self.target_date.unwrap_or(today),
            favorites.kept.clone(),
            start,
            self.duration_hours,
        )?;

        let offset = self.resume_from_offset.unwrap_or(0);
        if offset > request.total_seconds() {
            return Err(ScanError::Validation(format!(
                "resumeFromOffset {} is past the end of a {} second window",
                offset,
                request.total_seconds()
            )));
        }

        Ok(ResolvedScan {
            birth_date: self.birth_date,
            request,
            favorites,
            saved_time: time_text,
            offset,
        })
    }
}

/// Request for the element of a birth date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementRequest {
    #[serde(alias = "birth_date", rename = "birthDate")]
    pub birth_date: NaiveDate,
}

pub fn check_birth_date(date: NaiveDate) -> ScanResult<()> {
    if date.year() < MIN_BIRTH_YEAR {
        return Err(ScanError::InvalidDate(format!(
            "birth year {} is before {}",
            date.year(),
            MIN_BIRTH_YEAR
        )));
    }
    if date.year() > MAX_YEAR {
        return Err(ScanError::InvalidDate(format!(
            "birth year {} is after {}",
            date.year(),
            MAX_YEAR
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(14, 20, 5)
            .unwrap()
    }

    fn body(json: &str) -> ScanRequestBody {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_defaults_resolve_to_now() {
        let resolved = body("{}").resolve(now()).unwrap();

        assert_eq!(resolved.birth_date, NaiveDate::from_ymd_opt(1990, 1, 1).unwrap());
        assert_eq!(resolved.request.start, now());
        assert_eq!(resolved.request.target_date, now().date());
        assert_eq!(resolved.request.total_seconds(), 3600);
        assert_eq!(resolved.saved_time, "14:20:05");
    }

    #[test]
    fn test_saved_time_used_when_start_time_missing() {
        let resolved = body(r#"{"savedTime": "08:00:00"}"#).resolve(now()).unwrap();
        assert_eq!(resolved.saved_time, "08:00:00");
        assert_eq!(resolved.request.start.format("%H:%M:%S").to_string(), "08:00:00");
    }

    #[test]
    fn test_start_time_wins_over_saved_time() {
        let resolved = body(r#"{"startTime": "09:15:00", "savedTime": "08:00:00"}"#)
            .resolve(now())
            .unwrap();
        assert_eq!(resolved.saved_time, "09:15:00");
    }

    #[test]
    fn test_malformed_time_is_rejected() {
        let err = body(r#"{"startTime": "10h30"}"#).resolve(now()).unwrap_err();
        assert_eq!(err, ScanError::InputFormat("10h30".to_string()));
    }

    #[test]
    fn test_birth_year_before_1900_rejected() {
        let err = body(r#"{"birthDate": "1899-12-31"}"#).resolve(now()).unwrap_err();
        assert!(matches!(err, ScanError::InvalidDate(_)));
    }

    #[test]
    fn test_years_past_9999_rejected() {
        for json in [
            r#"{"birthDate": "+10000-01-01"}"#,
            r#"{"targetDate": "+10000-01-01"}"#,
            r#"{"startDate": "+10000-01-01", "startTime": "00:00:00"}"#,
            r#"{"startDate": "9999-12-31", "startTime": "23:59:00", "durationHours": 0.5}"#,
        ] {
            let err = body(json).resolve(now()).unwrap_err();
            assert!(matches!(err, ScanError::InvalidDate(_)), "{json} gave {err:?}");
        }
    }

    #[test]
    fn test_year_9999_accepted() {
        let resolved = body(
            r#"{"birthDate": "9999-01-01", "targetDate": "9999-12-31",
                "startDate": "9999-12-31", "startTime": "23:00:00"}"#,
        )
        .resolve(now())
        .unwrap();
        assert_eq!(resolved.request.total_seconds(), 3600);
    }

    #[test]
    fn test_favorites_filtered() {
        let resolved = body(r#"{"favorites": "ab, 5, 123, 79"}"#).resolve(now()).unwrap();
        assert_eq!(resolved.request.favorites, vec!["79"]);
        assert_eq!(resolved.favorites.dropped.len(), 3);
    }

    #[test]
    fn test_offset_past_window_rejected() {
        let err = body(r#"{"durationHours": 0.5, "resumeFromOffset": 1801}"#)
            .resolve(now())
            .unwrap_err();
        assert!(matches!(err, ScanError::Validation(_)));
    }

    #[test]
    fn test_duration_below_minimum_fails_validation() {
        assert!(body(r#"{"durationHours": 0.25}"#).validate().is_err());
        assert!(body(r#"{"durationHours": 0.5}"#).validate().is_ok());
    }
}
