use std::collections::BTreeMap;

use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Serialize, Serializer};

fn serialize_instant<S: Serializer>(instant: &DateTime<Tz>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&instant.to_rfc3339())
}

/// One schedule entry as read from the source page, before it is placed on a
/// week grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    pub calendar_name: String,
    pub title: String,
    #[serde(serialize_with = "serialize_instant")]
    pub start: DateTime<Tz>,
    #[serde(serialize_with = "serialize_instant")]
    pub end: DateTime<Tz>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Document-order position of the row or element the event came from.
    pub source_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorTriple {
    pub background: &'static str,
    pub text: &'static str,
    pub border: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridEvent {
    pub id: String,
    pub title: String,
    pub day_index: u8,
    pub start_minutes: u16,
    pub end_minutes: u16,
    #[serde(serialize_with = "serialize_instant")]
    pub start: DateTime<Tz>,
    #[serde(serialize_with = "serialize_instant")]
    pub end: DateTime<Tz>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub color: ColorTriple,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarBucket {
    pub label: String,
    pub events: Vec<GridEvent>,
}

/// Buckets keyed by calendar slug.
pub type Buckets = BTreeMap<String, CalendarBucket>;

/// Column indices resolved from the schedule table header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Columns {
    pub date: Option<usize>,
    pub time: Option<usize>,
    pub activity: Option<usize>,
    pub location: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub found_table: bool,
    pub headers: Vec<String>,
    pub columns: Columns,
    /// Name of the parser that produced the events, if any did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<&'static str>,
    /// Rows examined by the last parser that ran, which is `strategy` when set.
    pub rows_seen: usize,
    pub rows_skipped: usize,
    /// Events that parsed but started outside the requested week.
    pub out_of_week: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub buckets: Buckets,
    pub diagnostics: Diagnostics,
}

impl Extraction {
    pub fn event_count(&self) -> usize {
        self.buckets.values().map(|bucket| bucket.events.len()).sum()
    }
}
