use actix_web::{web, HttpResponse, Responder};
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;

use crate::config::ScanSettings;
use crate::core::{CancelToken, Scanner};
use crate::error::ScanError;
use crate::models::{
    ElementRequest, ElementResponse, ErrorResponse, HealthResponse, ScanRequestBody, ScanResponse,
    UserProfile,
};
use crate::models::requests::check_birth_date;
use crate::services::LunarCalendar;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub calendar: Arc<dyn LunarCalendar>,
    pub scanner: Scanner,
    pub timeout: Duration,
    pub report_dropped_favorites: bool,
}

impl AppState {
    pub fn new(calendar: Arc<dyn LunarCalendar>, settings: &ScanSettings) -> Self {
        Self {
            calendar,
            scanner: Scanner::new(settings.progress_interval, settings.batch_size, settings.workers),
            timeout: Duration::from_secs(settings.timeout_secs),
            report_dropped_favorites: settings.report_dropped_favorites,
        }
    }
}

/// Configure all scan-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/element", web::post().to(element))
        .route("/scan", web::post().to(scan));
}

fn bad_request(err: &ScanError) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: err.code().to_string(),
        message: err.to_string(),
        status_code: 400,
    })
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        lunar_calendar: state.calendar.name().to_string(),
    })
}

/// Element of a birth date
///
/// POST /api/v1/element
///
/// Request body:
/// ```json
/// { "birthDate": "1996-05-20" }
/// ```
async fn element(
    state: web::Data<AppState>,
    req: web::Json<ElementRequest>,
) -> impl Responder {
    if let Err(e) = check_birth_date(req.birth_date) {
        return bad_request(&e);
    }

    let profile = UserProfile::new(req.birth_date, state.calendar.as_ref());
    HttpResponse::Ok().json(ElementResponse::from(&profile))
}

/// Scan endpoint
///
/// POST /api/v1/scan
///
/// Request body:
/// ```json
/// {
///   "birthDate": "1996-05-20",
///   "targetDate": "2024-06-01",
///   "favorites": "07, 79",
///   "startDate": "2024-06-01",
///   "startTime": "18:30:00",
///   "savedTime": "18:30:00",
///   "durationHours": 1.0,
///   "resumeFromOffset": 0
/// }
/// ```
///
/// The scan runs on the blocking pool and is cancelled once the configured
/// timeout elapses; a cancelled response carries `nextOffset`. A zero
/// timeout cancels before the first second is scanned.
async fn scan(
    state: web::Data<AppState>,
    req: web::Json<ScanRequestBody>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for scan request: {}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "validation_failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let now = Local::now().naive_local();
    let resolved = match req.resolve(now) {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::info!("Rejected scan request: {}", e);
            return bad_request(&e);
        }
    };

    let profile = UserProfile::new(resolved.birth_date, state.calendar.as_ref());
    if profile.approximate_lunar_year {
        tracing::warn!(
            birth_date = %profile.birth_date,
            "No lunar data for birth date, using Gregorian year"
        );
    }

    let scan_id = uuid::Uuid::new_v4().to_string();
    let cancel = CancelToken::new();

    let timer = if state.timeout.is_zero() {
        cancel.cancel();
        None
    } else {
        let cancel = cancel.clone();
        let timeout = state.timeout;
        Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            cancel.cancel();
        }))
    };

    let span = tracing::info_span!("scan", scan_id = %scan_id);
    let scanner = state.scanner.clone();
    let job_profile = profile.clone();
    let job_request = resolved.request.clone();
    let offset = resolved.offset;

    let result = web::block(move || {
        span.in_scope(|| scanner.execute(&job_profile, &job_request, &cancel, offset))
    })
    .await;
    if let Some(timer) = timer {
        timer.abort();
    }

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Scan {} failed to run: {}", scan_id, e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "scan_failed".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    HttpResponse::Ok().json(ScanResponse::build(
        scan_id,
        &profile,
        &resolved,
        &report,
        state.report_dropped_favorites,
        now,
    ))
}
