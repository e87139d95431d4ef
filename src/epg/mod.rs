//! EPG (Electronic Program Guide) module
//!
//! Contains the XMLTV parser and the schedule index used for now/next lookups.

mod parser;
mod schedule;

// Re-export public types
pub use parser::{
    parse_epg,
    parse_epg_bytes,
    parse_epg_document,
    parse_xmltv_time,
    spawn_epg_parse,
    EpgChannel,
    EpgDocument,
};
pub use schedule::ScheduleIndex;

/// Format a program time as local HH:MM
pub fn format_time<Tz: chrono::TimeZone>(ts: &chrono::DateTime<Tz>) -> String {
    ts.with_timezone(&chrono::Local).format("%H:%M").to_string()
}

/// Format a program time as local YYYY-MM-DD HH:MM
pub fn format_datetime<Tz: chrono::TimeZone>(ts: &chrono::DateTime<Tz>) -> String {
    ts.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string()
}
