//! Element Scan - deterministic five-element lucky-second scanner
//!
//! For every second of a scan window a draw of five two-digit numbers is
//! derived from a string seed. Seconds whose draw is entirely compatible
//! with the user's element, and which contain the second itself, are
//! reported as matches.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use self::core::{element_of_year, CancelToken, DrawStream, ScanReport, Scanner};
pub use error::ScanError;
pub use models::{Draw, Element, MatchResult, ScanRequest, UserProfile};
