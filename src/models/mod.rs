// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Draw, Element, MatchResult, ScanRequest, UserProfile};
pub use requests::{ElementRequest, ResolvedScan, ScanRequestBody};
pub use responses::{ElementResponse, ErrorResponse, HealthResponse, MatchRow, ScanResponse};
