mod fallback;
mod table;

use chrono_tz::Tz;
use scraper::{ElementRef, Html};

use crate::classify::classify;
use crate::datetime::Slot;
use crate::model::{Diagnostics, RawEvent};

pub use fallback::FallbackParser;
pub use table::{resolve_columns, TableParser};

pub struct ParseContext<'a> {
    pub base_origin: Option<&'a str>,
    pub timezone: Tz,
}

/// One way of pulling schedule rows out of a page.
pub trait ScheduleParser {
    fn name(&self) -> &'static str;

    fn parse(&self, document: &Html, context: &ParseContext, diagnostics: &mut Diagnostics) -> Vec<RawEvent>;
}

/// Parsers in the order they are tried.
pub fn strategies() -> [&'static dyn ScheduleParser; 2] {
    [&TableParser, &FallbackParser]
}

/// Resolves `href` against `origin`. Fragment and script pseudo-links yield
/// `None`.
pub fn absolutize(href: &str, origin: Option<&str>) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.to_ascii_lowercase().starts_with("javascript:") {
        return None;
    }

    if has_scheme(href) {
        return Some(href.to_string());
    }

    let Some(origin) = origin.map(|origin| origin.trim_end_matches('/')) else {
        return Some(href.to_string());
    };

    if let Some(rest) = href.strip_prefix("//") {
        let scheme = origin.split_once("://").map_or("https", |(scheme, _)| scheme);
        return Some(format!("{scheme}://{rest}"));
    }

    if href.starts_with('/') {
        Some(format!("{origin}{href}"))
    } else {
        Some(format!("{origin}/{href}"))
    }
}

fn has_scheme(href: &str) -> bool {
    match href.split_once(':') {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c))
        }
        None => false,
    }
}

pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text of an element with whitespace collapsed.
pub(crate) fn flat_text(element: ElementRef) -> String {
    normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Text of an element with one line per text node.
pub(crate) fn line_text(element: ElementRef) -> String {
    element
        .text()
        .flat_map(str::lines)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn first_link(element: ElementRef) -> Option<ElementRef> {
    element.select(selector!("a")).next()
}

pub(crate) fn first_href(element: ElementRef, origin: Option<&str>) -> Option<String> {
    let href = element.select(selector!("a[href]")).next()?.value().attr("href")?;
    absolutize(href, origin)
}

pub(crate) fn build_event(
    title: String,
    location: Option<String>,
    url: Option<String>,
    slot: Slot,
    context: &ParseContext,
    source_index: usize,
) -> Option<RawEvent> {
    let (start, end) = slot.resolve(context.timezone)?;

    Some(RawEvent {
        calendar_name: classify(&title, location.as_deref()).to_string(),
        title,
        start,
        end,
        url,
        location,
        source_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_links_get_the_origin() {
        assert_eq!(
            absolutize("/detail/123", Some("https://example.org")).as_deref(),
            Some("https://example.org/detail/123")
        );
        assert_eq!(
            absolutize("detail/123", Some("https://example.org/")).as_deref(),
            Some("https://example.org/detail/123")
        );
        assert_eq!(
            absolutize("//cdn.example.org/a", Some("http://example.org")).as_deref(),
            Some("http://cdn.example.org/a")
        );
    }

    #[test]
    fn absolute_links_pass_through() {
        let href = "https://other.example.com/x?id=1";
        assert_eq!(absolutize(href, Some("https://example.org")).as_deref(), Some(href));
        assert_eq!(absolutize("/a", None).as_deref(), Some("/a"));
    }

    #[test]
    fn pseudo_links_are_dropped() {
        assert_eq!(absolutize("", Some("https://example.org")), None);
        assert_eq!(absolutize("#top", Some("https://example.org")), None);
        assert_eq!(absolutize("JavaScript:void(0)", Some("https://example.org")), None);
    }

    #[test]
    fn whitespace_is_collapsed() {
        assert_eq!(normalize_whitespace("  Lap \n\t Swim  "), "Lap Swim");
    }
}
