use std::collections::HashSet;

use scraper::{ElementRef, Html};

use super::{build_event, first_href, first_link, flat_text, line_text, ParseContext, ScheduleParser};
use crate::datetime;
use crate::model::{Diagnostics, RawEvent};

const MAX_TITLE_CHARS: usize = 160;

/// Scans row-like elements anywhere on the page for a date and time range.
/// Noisier than [`super::TableParser`]; only used when that finds nothing.
pub struct FallbackParser;

impl ScheduleParser for FallbackParser {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn parse(&self, document: &Html, context: &ParseContext, diagnostics: &mut Diagnostics) -> Vec<RawEvent> {
        let candidates = document
            .select(selector!(
                r#"tr, li, [class*="row"], [class*="result"], [class*="item"]"#
            ))
            .enumerate()
            .map(|(index, element)| (index, element, line_text(element)))
            .filter(|(_, _, text)| datetime::contains_date(text))
            .collect::<Vec<_>>();

        // Only the innermost dated candidate is read, so a container and the
        // row it wraps do not both yield the same event.
        let dated = candidates.iter().map(|(_, element, _)| element.id()).collect::<HashSet<_>>();

        let mut events = Vec::new();
        for (index, element, text) in &candidates {
            if element.descendants().skip(1).any(|node| dated.contains(&node.id())) {
                continue;
            }

            diagnostics.rows_seen += 1;
            match parse_element(*element, text, context, *index) {
                Some(event) => events.push(event),
                None => {
                    tracing::debug!(element = *index, "skipping candidate element");
                    diagnostics.rows_skipped += 1;
                }
            }
        }

        events
    }
}

fn parse_element(element: ElementRef, text: &str, context: &ParseContext, index: usize) -> Option<RawEvent> {
    let slot = datetime::loose(text)?;
    let title = title(element, text)?;
    let url = first_href(element, context.base_origin);

    build_event(title, None, url, slot, context, index)
}

fn title(element: ElementRef, text: &str) -> Option<String> {
    if let Some(title) = first_link(element).map(flat_text).filter(|title| !title.is_empty()) {
        return Some(title);
    }

    let line = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !datetime::is_time_range_line(line))?;

    Some(line.chars().take(MAX_TITLE_CHARS).collect())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Timelike};
    use chrono_tz::America::Chicago;

    use super::*;

    fn parse(html: &str) -> (Vec<RawEvent>, Diagnostics) {
        let context = ParseContext {
            base_origin: Some("https://rec.example.org"),
            timezone: Chicago,
        };
        let mut diagnostics = Diagnostics::default();
        let events = FallbackParser.parse(&Html::parse_document(html), &context, &mut diagnostics);
        (events, diagnostics)
    }

    #[test]
    fn list_item_with_link() {
        let html = r#"
            <ul>
              <li><a href="gym/7">Open Gym</a> 02/01/2024 9:00 AM - 10:00 AM</li>
              <li>No date here</li>
            </ul>"#;

        let (events, diagnostics) = parse(html);

        assert_eq!(diagnostics.rows_seen, 1);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Open Gym");
        assert_eq!(events[0].url.as_deref(), Some("https://rec.example.org/gym/7"));
        assert_eq!(events[0].start.date_naive(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(events[0].start.hour(), 9);
    }

    #[test]
    fn title_skips_time_range_lines() {
        let html = r#"
            <div class="result-card">
              <span>9:00 AM - 10:00 AM</span>
              <strong>Water Walking</strong>
              <span>02/02/2024</span>
            </div>"#;

        let (events, _) = parse(html);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Water Walking");
        assert_eq!(events[0].calendar_name, "Aquatics");
        assert_eq!(events[0].url, None);
    }

    #[test]
    fn single_line_items_keep_their_text_as_title() {
        let (events, _) = parse("<ul><li>Open Gym 02/01/2024 9:00 AM - 10:00 AM</li></ul>");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Open Gym 02/01/2024 9:00 AM - 10:00 AM");
    }

    #[test]
    fn nested_candidates_yield_one_event() {
        let html = r#"
            <div class="results">
              <ul><li><a href="/g">Open Gym</a> 02/01/2024 9:00 AM - 10:00 AM</li></ul>
            </div>"#;

        let (events, diagnostics) = parse(html);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].url.as_deref(), Some("https://rec.example.org/g"));
        assert_eq!(diagnostics.rows_seen, 1);
        assert_eq!(diagnostics.rows_skipped, 0);
    }

    #[test]
    fn long_titles_are_truncated() {
        let name = "é".repeat(200);
        let html = format!(r#"<div class="item"><p>{name}</p><p>03/01/2024 1:00 PM - 2:00 PM</p></div>"#);

        let (events, _) = parse(&html);

        assert_eq!(events[0].title.chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn dated_elements_without_times_are_counted_as_skipped() {
        let (events, diagnostics) = parse("<ul><li>Closed 02/19/2024</li></ul>");

        assert!(events.is_empty());
        assert_eq!(diagnostics.rows_seen, 1);
        assert_eq!(diagnostics.rows_skipped, 1);
    }
}
