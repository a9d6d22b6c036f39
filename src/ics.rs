use chrono::Utc;
use ics::properties::{Categories, DtEnd, DtStart, Location, Summary, URL};
use ics::ICalendar;

use crate::model::{Buckets, GridEvent};

/// Renders every bucketed event as a VEVENT with UTC timestamps.
pub fn to_ics<'a>(name: &'a str, buckets: &'a Buckets) -> ICalendar<'a> {
    let mut icalendar = ICalendar::new("2.0", name);

    for bucket in buckets.values() {
        for event in &bucket.events {
            icalendar.add_event(to_ics_event(event, &bucket.label));
        }
    }

    icalendar
}

fn to_ics_event<'a>(event: &'a GridEvent, calendar: &'a str) -> ics::Event<'a> {
    let start = utc_stamp(event.start);
    let end = utc_stamp(event.end);

    let mut ics_event = ics::Event::new(event.id.clone(), start.clone());

    ics_event.push(DtStart::new(start));
    ics_event.push(DtEnd::new(end));
    ics_event.push(Summary::new(event.title.as_str()));
    ics_event.push(Categories::new(calendar));

    if let Some(location) = &event.location {
        ics_event.push(Location::new(location.as_str()));
    }

    if let Some(url) = &event.url {
        ics_event.push(URL::new(url.as_str()));
    }

    ics_event
}

fn utc_stamp<T: chrono::TimeZone>(instant: chrono::DateTime<T>) -> String {
    instant.with_timezone(&Utc).format("%Y%m%dT%H%M%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};
    use chrono_tz::America::Chicago;

    use super::*;
    use crate::grid::project;
    use crate::model::RawEvent;

    #[test]
    fn events_become_vevents() {
        let events = [RawEvent {
            calendar_name: "Aquatics".into(),
            title: "Lap Swim".into(),
            start: Chicago.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
            end: Chicago.with_ymd_and_hms(2024, 1, 15, 11, 30, 0).unwrap(),
            url: Some("https://rec.example.org/detail/1".into()),
            location: Some("Main Pool".into()),
            source_index: 0,
        }];
        let (buckets, _) = project(&events, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());

        let rendered = to_ics("rec-schedule", &buckets).to_string();

        assert!(rendered.contains("BEGIN:VEVENT"));
        assert!(rendered.contains("UID:20240115T1000_Lap-Swim"));
        assert!(rendered.contains("DTSTART:20240115T160000Z"));
        assert!(rendered.contains("DTEND:20240115T173000Z"));
        assert!(rendered.contains("SUMMARY:Lap Swim"));
        assert!(rendered.contains("LOCATION:Main Pool"));
        assert!(rendered.contains("CATEGORIES:Aquatics"));
    }
}
