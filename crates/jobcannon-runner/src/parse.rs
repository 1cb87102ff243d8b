//! Event listing HTML parsing into an [`EventSet`].
//!
//! Each listing row is an `li.list-item.list_rows`. Within a row:
//!
//! - title: `div.list-item-title`, last non-blank stripped text fragment
//! - event type: `div.list-secondary-action`, same rule
//! - datetime: first `span.field-content` whose sole string matches
//!   `Start|End|AM|PM`, kept raw (whitespace included). A span's sole
//!   string is the text of its only child node, looking through
//!   single-child elements; spans with several child nodes never match.
//!
//! Rows mentioning an excluded marker anywhere in their text are dropped,
//! and a row equal to one already parsed is skipped.

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, info};

use jobcannon_types::{EventRecord, EventSet};

use crate::error::RunnerError;
use crate::session::selector;

/// Substrings that remove a row from the results: internal career-office
/// events and portal test data.
pub const EXCLUDED_MARKERS: [&str; 2] = ["MBA Career Management", "ABC Test Company"];

const ROW_SELECTOR: &str = "li.list-item.list_rows";
const TITLE_SELECTOR: &str = "div.list-item-title";
const EVENT_TYPE_SELECTOR: &str = "div.list-secondary-action";
const FIELD_CONTENT_SELECTOR: &str = "span.field-content";
const DATETIME_PATTERN: &str = "Start|End|AM|PM";

/// Compiled selectors and patterns for the listing page.
///
/// Build once with [`EventParser::new`] and reuse across runs.
#[derive(Debug)]
pub struct EventParser {
    row: Selector,
    title: Selector,
    event_type: Selector,
    field_content: Selector,
    datetime_pattern: Regex,
}

impl EventParser {
    /// Compile the listing selectors.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Parse`] if a selector or the datetime pattern
    /// fails to compile.
    pub fn new() -> Result<Self, RunnerError> {
        Ok(Self {
            row: selector(ROW_SELECTOR)?,
            title: selector(TITLE_SELECTOR)?,
            event_type: selector(EVENT_TYPE_SELECTOR)?,
            field_content: selector(FIELD_CONTENT_SELECTOR)?,
            datetime_pattern: Regex::new(DATETIME_PATTERN).map_err(|e| {
                RunnerError::Parse(format!("invalid datetime pattern {DATETIME_PATTERN:?}: {e}"))
            })?,
        })
    }

    /// Parse every listing row in `html`, in document order.
    pub fn parse(&self, html: &str) -> EventSet {
        let document = Html::parse_document(html);
        let mut events = EventSet::new();
        let mut rows = 0_usize;
        let mut excluded = 0_usize;

        for row in document.select(&self.row) {
            rows = rows.saturating_add(1);

            if is_excluded(&row) {
                excluded = excluded.saturating_add(1);
                continue;
            }

            let record = self.parse_row(&row);
            if !events.insert(record) {
                debug!("skipping duplicate listing row");
            }
        }

        info!(rows, excluded, events = events.len(), "parsed event listing");
        events
    }

    fn parse_row(&self, row: &ElementRef<'_>) -> EventRecord {
        let title = row
            .select(&self.title)
            .next()
            .and_then(|el| last_stripped_text(&el));

        let event_type = row
            .select(&self.event_type)
            .next()
            .and_then(|el| last_stripped_text(&el));

        let datetime = row
            .select(&self.field_content)
            .filter_map(sole_string)
            .find(|text| self.datetime_pattern.is_match(text))
            .map(ToOwned::to_owned);

        EventRecord {
            title,
            event_type,
            datetime,
        }
    }
}

/// Parse a listing page with a freshly compiled [`EventParser`].
///
/// # Errors
///
/// Returns [`RunnerError::Parse`] if the built-in selectors fail to compile.
pub fn parse_events(html: &str) -> Result<EventSet, RunnerError> {
    Ok(EventParser::new()?.parse(html))
}

fn is_excluded(row: &ElementRef<'_>) -> bool {
    let text: String = row.text().collect();
    EXCLUDED_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Text of the only child node of `el`, descending through elements that
/// themselves have a single child. `None` when any level has zero or
/// several children.
fn sole_string<'a>(el: ElementRef<'a>) -> Option<&'a str> {
    let mut children = el.children();
    let only = children.next()?;
    if children.next().is_some() {
        return None;
    }
    match only.value() {
        Node::Text(text) => Some(&**text),
        _ => ElementRef::wrap(only).and_then(sole_string),
    }
}

/// The last text fragment under `el` that is not blank once trimmed.
fn last_stripped_text(el: &ElementRef<'_>) -> Option<String> {
    el.text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .last()
        .map(ToOwned::to_owned)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn row(title: &str, event_type: &str, datetime: &str) -> String {
        format!(
            r#"<li class="list-item list_rows">
                 <div class="list-item-body">
                   <div class="list-item-title"><a href="/e/1">{title}</a></div>
                   <div class="list-data-columns">
                     <span class="field-content">McCombs School of Business</span>
                     <span class="field-content">{datetime}</span>
                   </div>
                 </div>
                 <div class="list-secondary-action"><span>{event_type}</span></div>
               </li>"#
        )
    }

    fn page(rows: &[String]) -> String {
        format!(
            r#"<html><body><ul class="list-group">{}</ul></body></html>"#,
            rows.concat()
        )
    }

    fn parse(html: &str) -> EventSet {
        parse_events(html).unwrap()
    }

    #[test]
    fn parses_rows_in_document_order() {
        let html = page(&[
            row("Goldman Sachs Info Session", "Employer Info Session", "Start: 6:00 PM"),
            row("Fall Career Expo", "Career Fair", "Oct 3, 10:00 AM"),
        ]);
        let events = parse(&html);

        assert_eq!(
            events.as_slice(),
            &[
                EventRecord::new(
                    Some("Goldman Sachs Info Session"),
                    Some("Employer Info Session"),
                    Some("Start: 6:00 PM"),
                ),
                EventRecord::new(
                    Some("Fall Career Expo"),
                    Some("Career Fair"),
                    Some("Oct 3, 10:00 AM"),
                ),
            ]
        );
    }

    #[test]
    fn excluded_rows_never_appear() {
        let html = page(&[
            row("Resume Review with MBA Career Management", "Workshop", "Start: 1:00 PM"),
            row("ABC Test Company Coffee Chat", "Coffee Chat", "End: 2:00 PM"),
            row("Real Event", "Talk", "3:00 PM"),
        ]);
        let events = parse(&html);

        assert_eq!(events.len(), 1);
        assert_eq!(events.as_slice()[0].title.as_deref(), Some("Real Event"));
    }

    #[test]
    fn exclusion_matches_anywhere_in_row_text() {
        let html = page(&[
            r#"<li class="list-item list_rows">
                 <div class="list-item-title">Networking Night</div>
                 <p class="host">Hosted by MBA Career Management</p>
               </li>"#
                .to_owned(),
        ]);
        assert!(parse(&html).is_empty());
    }

    #[test]
    fn missing_title_element_is_none() {
        let html = page(&[r#"<li class="list-item list_rows">
                 <div class="list-secondary-action">Workshop</div>
                 <span class="field-content">Start: 9:00 AM</span>
               </li>"#
            .to_owned()]);
        let events = parse(&html);

        assert_eq!(
            events.as_slice(),
            &[EventRecord::new(None::<&str>, Some("Workshop"), Some("Start: 9:00 AM"))]
        );
    }

    #[test]
    fn missing_event_type_element_is_none() {
        let html = page(&[r#"<li class="list-item list_rows">
                 <div class="list-item-title">Alumni Panel</div>
               </li>"#
            .to_owned()]);
        let events = parse(&html);

        assert_eq!(
            events.as_slice(),
            &[EventRecord::new(Some("Alumni Panel"), None::<&str>, None::<&str>)]
        );
    }

    #[test]
    fn title_takes_last_stripped_fragment() {
        let html = page(&[r#"<li class="list-item list_rows">
                 <div class="list-item-title">
                   <span class="badge">New</span>
                   <a>  Deloitte Case Workshop  </a>
                   <span>   </span>
                 </div>
               </li>"#
            .to_owned()]);
        let events = parse(&html);

        assert_eq!(
            events.as_slice()[0].title.as_deref(),
            Some("Deloitte Case Workshop")
        );
    }

    #[test]
    fn datetime_uses_first_matching_field_content() {
        let html = page(&[r#"<li class="list-item list_rows">
                 <div class="list-item-title">Trek</div>
                 <span class="field-content">Austin, TX</span>
                 <span class="field-content">Start: Mon 8:00 AM</span>
                 <span class="field-content">End: Mon 5:00 PM</span>
               </li>"#
            .to_owned()]);
        let events = parse(&html);

        assert_eq!(
            events.as_slice()[0].datetime.as_deref(),
            Some("Start: Mon 8:00 AM")
        );
    }

    #[test]
    fn datetime_keeps_raw_whitespace() {
        let html = page(&[r#"<li class="list-item list_rows">
                 <div class="list-item-title">Mixer</div>
                 <span class="field-content">  Start: 7:00 PM </span>
               </li>"#
            .to_owned()]);
        let events = parse(&html);

        assert_eq!(
            events.as_slice()[0].datetime.as_deref(),
            Some("  Start: 7:00 PM ")
        );
    }

    #[test]
    fn datetime_ignores_span_with_several_children() {
        let html = page(&[r#"<li class="list-item list_rows">
                 <div class="list-item-title">Mixer</div>
                 <span class="field-content"><b>Start</b>: 7:00 PM </span>
               </li>"#
            .to_owned()]);
        let events = parse(&html);

        assert_eq!(events.as_slice()[0].datetime, None);
    }

    #[test]
    fn datetime_skips_mixed_span_for_later_plain_one() {
        let html = page(&[r#"<li class="list-item list_rows">
                 <div class="list-item-title">Trek</div>
                 <span class="field-content"><b>Start</b> Mon</span>
                 <span class="field-content">End: Mon 5:00 PM</span>
               </li>"#
            .to_owned()]);
        let events = parse(&html);

        assert_eq!(
            events.as_slice()[0].datetime.as_deref(),
            Some("End: Mon 5:00 PM")
        );
    }

    #[test]
    fn datetime_looks_through_single_child_wrappers() {
        let html = page(&[r#"<li class="list-item list_rows">
                 <div class="list-item-title">Panel</div>
                 <span class="field-content"><em><b>Start: Tue 4:00 PM</b></em></span>
               </li>"#
            .to_owned()]);
        let events = parse(&html);

        assert_eq!(
            events.as_slice()[0].datetime.as_deref(),
            Some("Start: Tue 4:00 PM")
        );
    }

    #[test]
    fn datetime_pattern_is_case_sensitive() {
        let html = page(&[r#"<li class="list-item list_rows">
                 <div class="list-item-title">Lunch</div>
                 <span class="field-content">noon, pm-ish</span>
               </li>"#
            .to_owned()]);
        assert_eq!(parse(&html).as_slice()[0].datetime, None);
    }

    #[test]
    fn duplicate_rows_are_collapsed() {
        let html = page(&[
            row("A", "Talk", "Mon 9:00 AM"),
            row("B", "Fair", "Tue 9:00 AM"),
            row("A", "Talk", "Mon 9:00 AM"),
        ]);
        let events = parse(&html);

        let titles: Vec<_> = events.iter().filter_map(|r| r.title.as_deref()).collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn non_listing_markup_yields_empty_set() {
        let html = r#"<html><body><li class="list-item">Not a row</li></body></html>"#;
        assert!(parse(html).is_empty());
    }
}
