use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate, Timelike};

use crate::classify::color_for;
use crate::model::{Buckets, CalendarBucket, GridEvent, RawEvent};

/// Monday of the week containing `reference`.
pub fn week_anchor(reference: NaiveDate) -> NaiveDate {
    reference - Duration::days(i64::from(reference.weekday().num_days_from_monday()))
}

/// Key under which a calendar's bucket is stored.
pub fn slug(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Places events on the week starting at `anchor`. Returns the buckets and the
/// number of events that fell outside the week.
pub fn project<'a, I>(events: I, anchor: NaiveDate) -> (Buckets, usize)
where
    I: IntoIterator<Item = &'a RawEvent>,
{
    let midnight = anchor.and_time(Default::default());
    let mut buckets = Buckets::new();
    let mut seen_ids = HashMap::<String, usize>::new();
    let mut out_of_week = 0;

    for event in events {
        // Local wall clock, so a DST switch inside the week keeps day edges
        // at local midnight.
        let offset = event.start.naive_local() - midnight;
        let day_index = offset.num_milliseconds().div_euclid(Duration::days(1).num_milliseconds());

        if !(0..=6).contains(&day_index) {
            tracing::debug!(title = %event.title, start = %event.start, "event outside displayed week");
            out_of_week += 1;
            continue;
        }

        let base_id = format!(
            "{}_{}",
            event.start.format("%Y%m%dT%H%M"),
            event.title.replace(' ', "-")
        );
        let occurrences = seen_ids.entry(base_id.clone()).or_insert(0);
        *occurrences += 1;
        let id = match *occurrences {
            1 => base_id,
            n => format!("{base_id}-{n}"),
        };

        let grid_event = GridEvent {
            id,
            title: event.title.clone(),
            day_index: day_index as u8,
            start_minutes: minutes_of_day(event.start.time()),
            end_minutes: minutes_of_day(event.end.time()),
            start: event.start,
            end: event.end,
            location: event.location.clone(),
            url: event.url.clone(),
            color: color_for(&event.calendar_name),
        };

        buckets
            .entry(slug(&event.calendar_name))
            .or_insert_with(|| CalendarBucket {
                label: event.calendar_name.clone(),
                events: Vec::new(),
            })
            .events
            .push(grid_event);
    }

    (buckets, out_of_week)
}

fn minutes_of_day<T: Timelike>(time: T) -> u16 {
    (time.hour() * 60 + time.minute()) as u16
}
