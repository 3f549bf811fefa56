// Core algorithm exports
pub mod element;
pub mod filters;
pub mod input;
pub mod scanner;
pub mod seed;

pub use element::element_of_year;
pub use filters::{all_compatible, digit_element, evaluate, is_compatible, matching_second};
pub use input::{
    concat_favorites, duration_seconds, parse_favorites, parse_time_of_day, FavoriteNumbers,
};
pub use scanner::{CancelToken, DrawStream, Progress, ScanReport, ScanState, Scanner};
pub use seed::{numbers_for_key, seed_key, SeedGenerator, MAX_YEAR};
