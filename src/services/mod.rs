// Service exports
pub mod lunar;

pub use lunar::{build_calendar, GregorianFallback, LunarCalendar, LunarError, LunarYear, TetTable};
