use scraper::{ElementRef, Html};

use super::{build_event, first_href, first_link, flat_text, ParseContext, ScheduleParser};
use crate::datetime;
use crate::model::{Columns, Diagnostics, RawEvent};

const DATE_KEYWORDS: &[&str] = &["date"];
const TIME_KEYWORDS: &[&str] = &["time", "hours", "start"];
const ACTIVITY_KEYWORDS: &[&str] = &["activity", "class", "title", "description", "program", "course"];
const LOCATION_KEYWORDS: &[&str] = &["location", "room", "facility"];

const MIN_HEADER_CELLS: usize = 3;

/// Reads the first table on the page that looks like a schedule: a header row
/// of at least three cells followed by data rows.
pub struct TableParser;

struct ScheduleTable<'a> {
    headers: Vec<String>,
    rows: Vec<Vec<ElementRef<'a>>>,
}

impl ScheduleParser for TableParser {
    fn name(&self) -> &'static str {
        "table"
    }

    fn parse(&self, document: &Html, context: &ParseContext, diagnostics: &mut Diagnostics) -> Vec<RawEvent> {
        let Some(table) = document.select(selector!("table")).find_map(schedule_table) else {
            tracing::debug!("no schedule table found");
            return Vec::new();
        };

        let columns = resolve_columns(table.headers.as_slice());
        tracing::debug!(headers = ?table.headers, ?columns, "found schedule table");

        diagnostics.found_table = true;
        diagnostics.headers = table.headers.clone();
        diagnostics.columns = columns;

        let mut events = Vec::new();
        for (index, row) in table.rows.iter().enumerate() {
            diagnostics.rows_seen += 1;
            match parse_row(row, columns, context, index) {
                Some(event) => events.push(event),
                None => {
                    tracing::debug!(row = index, "skipping table row");
                    diagnostics.rows_skipped += 1;
                }
            }
        }

        events
    }
}

/// Maps header texts to column roles. Keywords are tried in order and the
/// first header containing one wins.
pub fn resolve_columns<S: AsRef<str>>(headers: &[S]) -> Columns {
    let find = |keywords: &[&str]| {
        keywords.iter().find_map(|keyword| {
            headers
                .iter()
                .position(|header| header.as_ref().to_lowercase().contains(keyword))
        })
    };

    Columns {
        date: find(DATE_KEYWORDS),
        time: find(TIME_KEYWORDS),
        activity: Some(find(ACTIVITY_KEYWORDS).unwrap_or(0)),
        location: find(LOCATION_KEYWORDS),
    }
}

fn schedule_table(table: ElementRef) -> Option<ScheduleTable> {
    let mut rows = table
        .select(selector!("tr"))
        .filter(|row| owning_table(*row).is_some_and(|owner| owner.id() == table.id()));

    let header_row = rows.by_ref().find(|row| is_header_row(*row))?;
    let header_cells = cells(header_row);
    if header_cells.len() < MIN_HEADER_CELLS {
        return None;
    }

    let rows = rows
        .filter(|row| row.select(selector!("td")).next().is_some())
        .map(cells)
        .collect::<Vec<_>>();

    if rows.is_empty() {
        return None;
    }

    let headers = header_cells
        .into_iter()
        .map(|cell| flat_text(cell).to_lowercase())
        .collect();

    Some(ScheduleTable { headers, rows })
}

fn owning_table(row: ElementRef) -> Option<ElementRef> {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().name() == "table")
}

fn is_header_row(row: ElementRef) -> bool {
    let in_thead = row
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|element| element.value().name() == "thead");

    in_thead || cells(row).iter().any(|cell| cell.value().name() == "th")
}

fn cells(row: ElementRef) -> Vec<ElementRef> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "td" | "th"))
        .collect()
}

fn parse_row(row: &[ElementRef], columns: Columns, context: &ParseContext, index: usize) -> Option<RawEvent> {
    let cell = |column: Option<usize>| column.and_then(|column| row.get(column).copied());
    let cell_text = |column: Option<usize>| cell(column).map(flat_text).unwrap_or_default();

    let activity = cell(columns.activity)?;
    let mut title = flat_text(activity);
    if title.is_empty() {
        title = first_link(activity).map(flat_text).unwrap_or_default();
    }
    if title.is_empty() {
        return None;
    }

    let location = Some(cell_text(columns.location)).filter(|location| !location.is_empty());
    let url = row.iter().find_map(|element| first_href(*element, context.base_origin));

    let slot = datetime::strict(&cell_text(columns.date), &cell_text(columns.time))
        .or_else(|| datetime::loose(&activity.text().collect::<Vec<_>>().join(" ")))?;

    build_event(title, location, url, slot, context, index)
}
