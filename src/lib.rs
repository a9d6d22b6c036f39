use chrono::NaiveDate;
use chrono_tz::Tz;
use scraper::Html;

macro_rules! selector {
    ($query:expr) => {{
        static SELECTOR: once_cell::sync::Lazy<scraper::Selector> =
            once_cell::sync::Lazy::new(|| scraper::Selector::parse($query).unwrap());
        &SELECTOR
    }};
}

pub mod cache;
pub mod classify;
pub mod cli;
pub mod datetime;
mod error;
pub mod fetch;
pub mod grid;
pub mod ics;
pub mod model;
pub mod parser;
pub mod server;

pub use error::{Error, Result};
pub use model::{Buckets, CalendarBucket, ColorTriple, Diagnostics, Extraction, GridEvent, RawEvent};

use parser::{strategies, ParseContext};

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Origin that relative detail links are resolved against.
    pub base_origin: Option<String>,
    /// Any date in the week to display; normalized to its Monday.
    pub week_anchor: NaiveDate,
    /// Timezone the page's wall-clock times are read in.
    pub timezone: Tz,
}

/// Extracts the schedule on `html` and lays it out on the requested week.
///
/// Rows that cannot be read are skipped, so a page without a recognizable
/// schedule yields an empty set of buckets rather than an error.
pub fn extract(html: &str, options: &ExtractOptions) -> Extraction {
    let document = Html::parse_document(html);
    let context = ParseContext {
        base_origin: options.base_origin.as_deref(),
        timezone: options.timezone,
    };

    let mut diagnostics = Diagnostics::default();
    let mut events = Vec::new();

    for parser in strategies() {
        diagnostics.rows_seen = 0;
        diagnostics.rows_skipped = 0;
        events = parser.parse(&document, &context, &mut diagnostics);
        if !events.is_empty() {
            diagnostics.strategy = Some(parser.name());
            break;
        }
    }

    let anchor = grid::week_anchor(options.week_anchor);
    let (buckets, out_of_week) = grid::project(&events, anchor);
    diagnostics.out_of_week = out_of_week;

    tracing::debug!(
        strategy = diagnostics.strategy,
        parsed = events.len(),
        out_of_week,
        "extracted schedule"
    );

    Extraction {
        buckets,
        diagnostics,
    }
}
