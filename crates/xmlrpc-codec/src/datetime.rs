//! `dateTime.iso8601` layouts.
//!
//! Values are written in the basic form `YYYYMMDDTHH:MM:SS`. Decoding also
//! accepts the hyphenated form and either form with a trailing `Z` or a
//! `±HH:MM` offset; zoned values are normalized to UTC.

use chrono::{DateTime, NaiveDateTime};

/// The layout used when encoding.
pub const BASIC_LAYOUT: &str = "%Y%m%dT%H:%M:%S";

const HYPHENATED_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S";

pub fn format(ts: &NaiveDateTime) -> String {
    ts.format(BASIC_LAYOUT).to_string()
}

/// Parse a timestamp, trying each accepted layout in turn.
pub fn parse(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    [BASIC_LAYOUT, HYPHENATED_LAYOUT]
        .into_iter()
        .find_map(|layout| parse_plain(text, layout).or_else(|| parse_zoned(text, layout)))
}

fn parse_plain(text: &str, layout: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, layout).ok()
}

fn parse_zoned(text: &str, layout: &str) -> Option<NaiveDateTime> {
    if let Some(utc) = text.strip_suffix('Z') {
        return parse_plain(utc, layout);
    }
    let zoned = format!("{layout}%:z");
    DateTime::parse_from_str(text, &zoned)
        .ok()
        .map(|ts| ts.naive_utc())
}
