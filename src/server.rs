use std::{io, net::SocketAddr, sync::Arc};

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};

use crate::cache::Cache;
use crate::datetime::{format_us_date, parse_us_date};
use crate::fetch::Fetcher;
use crate::{extract, grid, ics, Error, ExtractOptions, Extraction, Result};

const SCHEDULE_PATH: &str = "/schedule";
const SCHEDULE_ICS_PATH: &str = "/schedule.ics";

/// First day, last day and week anchor of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub anchor: NaiveDate,
}

pub struct AppState {
    pub fetcher: Fetcher,
    pub cache: Cache<Range, Extraction>,
    pub timezone: Tz,
}

impl AppState {
    async fn schedule(&self, range: Range) -> Result<Arc<Extraction>> {
        if let Some(extraction) = self.cache.get(&range) {
            return Ok(extraction);
        }

        let html = self.fetcher.fetch(range.start, range.end).await?;
        let options = ExtractOptions {
            base_origin: Some(self.fetcher.origin()),
            week_anchor: range.anchor,
            timezone: self.timezone,
        };

        let extraction = extract(&html, &options);
        info!(
            events = extraction.event_count(),
            strategy = extraction.diagnostics.strategy,
            found_table = extraction.diagnostics.found_table,
            "extracted schedule"
        );

        Ok(self.cache.insert(range, extraction))
    }

    fn cache_control(&self) -> String {
        format!("public, max-age={}", self.cache.ttl().as_secs())
    }
}

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    pub start: String,
    pub end: String,
    /// Any day of the week to display; defaults to `start`.
    pub week: Option<String>,
}

impl ScheduleQuery {
    pub fn validate(&self) -> Result<Range> {
        let parse = |text: &str| parse_us_date(text).ok_or_else(|| Error::InvalidDate(text.to_string()));

        let start = parse(self.start.as_str())?;
        let end = parse(self.end.as_str())?;
        if end < start {
            return Err(Error::InvalidRange {
                start: self.start.clone(),
                end: self.end.clone(),
            });
        }

        let reference = match &self.week {
            Some(week) => parse(week.as_str())?,
            None => start,
        };

        Ok(Range {
            start,
            end,
            anchor: grid::week_anchor(reference),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleResponse<'a> {
    week_start: String,
    #[serde(flatten)]
    extraction: &'a Extraction,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::InvalidDate(_) | Error::InvalidRange { .. } => StatusCode::BAD_REQUEST,
            Error::Upstream { .. } | Error::Transport(_) => StatusCode::BAD_GATEWAY,
            Error::InvalidUpstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        warn!(%status, error = %self, "request failed");
        (status, self.to_string()).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(SCHEDULE_PATH, get(handle_schedule))
        .route(SCHEDULE_ICS_PATH, get(handle_schedule_ics))
        .route("/health", get(|| async { "ok" }))
        .fallback(|| async { (StatusCode::NOT_FOUND, "not found") })
        .with_state(state)
}

pub async fn serve(address: SocketAddr, state: Arc<AppState>) -> io::Result<()> {
    let listener = TcpListener::bind(address).await?;
    info!("Listening at http://{address}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn handle_schedule(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Response> {
    let range = query.validate()?;
    let extraction = state.schedule(range).await?;

    let body = ScheduleResponse {
        week_start: format_us_date(range.anchor),
        extraction: &extraction,
    };

    Ok(([(header::CACHE_CONTROL, state.cache_control())], Json(body)).into_response())
}

async fn handle_schedule_ics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Response> {
    let range = query.validate()?;
    let extraction = state.schedule(range).await?;
    let calendar = ics::to_ics(env!("CARGO_PKG_NAME"), &extraction.buckets).to_string();

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar".to_string()),
            (header::CACHE_CONTROL, state.cache_control()),
        ],
        calendar,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(start: &str, end: &str, week: Option<&str>) -> ScheduleQuery {
        ScheduleQuery {
            start: start.into(),
            end: end.into(),
            week: week.map(Into::into),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn anchor_defaults_to_the_start_week() {
        let range = query("01/17/2024", "01/31/2024", None).validate().unwrap();
        assert_eq!(range.start, date(2024, 1, 17));
        assert_eq!(range.end, date(2024, 1, 31));
        assert_eq!(range.anchor, date(2024, 1, 15));
    }

    #[test]
    fn explicit_week_is_normalized_to_monday() {
        let range = query("01/15/2024", "01/31/2024", Some("1/25/2024")).validate().unwrap();
        assert_eq!(range.anchor, date(2024, 1, 22));
    }

    #[test]
    fn malformed_ranges_are_rejected() {
        assert!(matches!(
            query("2024-01-15", "01/31/2024", None).validate(),
            Err(Error::InvalidDate(text)) if text == "2024-01-15"
        ));
        assert!(matches!(
            query("01/31/2024", "01/15/2024", None).validate(),
            Err(Error::InvalidRange { .. })
        ));
        assert!(matches!(
            query("01/15/2024", "01/31/2024", Some("soon")).validate(),
            Err(Error::InvalidDate(_))
        ));
    }

    #[test]
    fn errors_map_to_status_codes() {
        let status = |err: Error| err.into_response().status();
        assert_eq!(status(Error::InvalidDate("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(Error::Upstream { status: 503 }), StatusCode::BAD_GATEWAY);
    }
}
