use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::core::scanner::{ScanReport, ScanState};
use crate::models::domain::{Element, MatchResult, UserProfile};
use crate::models::requests::ResolvedScan;

pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S %d/%m/%Y";
pub const NUMBER_SEPARATOR: &str = " - ";

/// One row of the result table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRow {
    pub timestamp: String,
    pub numbers: String,
    pub second: u8,
}

impl From<&MatchResult> for MatchRow {
    fn from(result: &MatchResult) -> Self {
        Self {
            timestamp: result.draw.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            numbers: result.draw.formatted().join(NUMBER_SEPARATOR),
            second: result.second,
        }
    }
}

/// Response for the scan endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub scan_id: String,
    pub element: Element,
    pub label: String,
    pub lunar_year: i32,
    pub approximate_lunar_year: bool,
    pub favorites: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dropped_favorites: Option<Vec<String>>,
    pub scan_start: String,
    pub scan_end: String,
    pub state: ScanState,
    pub scanned: u64,
    pub total: u64,
    pub next_offset: Option<u64>,
    pub matches: Vec<MatchRow>,
    pub notice: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub advisory: Option<String>,
    pub saved_time: String,
    pub warnings: Vec<String>,
}

impl ScanResponse {
    /// Assemble the response; `now` decides whether the window lies in
    /// the future
    pub fn build(
        scan_id: String,
        profile: &UserProfile,
        resolved: &ResolvedScan,
        report: &ScanReport,
        report_dropped: bool,
        now: NaiveDateTime,
    ) -> Self {
        let request = &resolved.request;
        let mut warnings = Vec::new();

        if profile.approximate_lunar_year {
            warnings.push(format!(
                "Lunar calendar data unavailable for {}; using the Gregorian year {} as lunar year",
                profile.birth_date, profile.lunar_year
            ));
        }
        if report.state == ScanState::Cancelled {
            warnings.push(format!(
                "Scan stopped after {} of {} seconds; resume with resumeFromOffset",
                report.scanned, report.total
            ));
        }

        let notice = if report.matches.is_empty() {
            "No matching second found in the scanned window.".to_string()
        } else {
            format!("Found {} matching second(s).", report.matches.len())
        };

        let advisory = (request.start > now).then(|| {
            "The window is in the future: act 1-2 seconds before each listed time to offset network latency."
                .to_string()
        });

        Self {
            scan_id,
            element: profile.element,
            label: profile.element.label().to_string(),
            lunar_year: profile.lunar_year,
            approximate_lunar_year: profile.approximate_lunar_year,
            favorites: request.favorites.clone(),
            dropped_favorites: report_dropped.then(|| resolved.favorites.dropped.clone()),
            scan_start: request.start.format(TIMESTAMP_FORMAT).to_string(),
            scan_end: request.end().format(TIMESTAMP_FORMAT).to_string(),
            state: report.state,
            scanned: report.scanned,
            total: report.total,
            next_offset: report.next_offset,
            matches: report.matches.iter().map(MatchRow::from).collect(),
            notice,
            advisory,
            saved_time: resolved.saved_time.clone(),
            warnings,
        }
    }
}

/// Response for the element endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementResponse {
    pub lunar_year: i32,
    pub element: Element,
    pub label: String,
    pub approximate: bool,
}

impl From<&UserProfile> for ElementResponse {
    fn from(profile: &UserProfile) -> Self {
        Self {
            lunar_year: profile.lunar_year,
            element: profile.element,
            label: profile.element.label().to_string(),
            approximate: profile.approximate_lunar_year,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub lunar_calendar: String,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::models::Draw;

    #[test]
    fn test_match_row_formatting() {
        let result = MatchResult {
            draw: Draw {
                timestamp: NaiveDate::from_ymd_opt(2024, 3, 9)
                    .unwrap()
                    .and_hms_opt(7, 5, 4)
                    .unwrap(),
                numbers: [4, 19, 0, 55, 9],
            },
            second: 4,
        };

        let row = MatchRow::from(&result);
        assert_eq!(row.timestamp, "07:05:04 09/03/2024");
        assert_eq!(row.numbers, "04 - 19 - 00 - 55 - 09");
        assert_eq!(row.second, 4);
    }

    #[test]
    fn test_error_response_uses_camel_case() {
        let body = serde_json::to_value(ErrorResponse {
            error: "invalid_date".to_string(),
            message: "invalid date: birth year 1899 is before 1900".to_string(),
            status_code: 400,
        })
        .unwrap();

        assert_eq!(body["statusCode"], 400);
        assert!(body.get("status_code").is_none());
    }
}
