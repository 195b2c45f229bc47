//! Run-level operations that push scraped showings into a theatre's calendar.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use crate::calendar::{CalendarEvent, CalendarService, Reminders, from_calendar_event, to_calendar_event};
use crate::error::Result;
use crate::model::MovieShowing;
use crate::reconcile::reconcile;
use crate::siff::SiffScraper;
use crate::theatre::Theatre;
use crate::util::PACIFIC;

fn start_of(event: &CalendarEvent) -> Option<DateTime<Tz>> {
    event.start.date_time.map(|dt| dt.with_timezone(&PACIFIC))
}

/// Keeps timed events; with `future_only`, only those starting on or after
/// Pacific midnight of `today`.
pub fn filter_events(
    events: Vec<CalendarEvent>,
    future_only: bool,
    today: NaiveDate,
) -> Vec<CalendarEvent> {
    let cutoff = today
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| PACIFIC.from_local_datetime(&midnight).earliest());
    events
        .into_iter()
        .filter(|event| match (start_of(event), cutoff) {
            (None, _) => false,
            (Some(start), Some(cutoff)) if future_only => start >= cutoff,
            (Some(_), _) => true,
        })
        .collect()
}

fn today() -> NaiveDate {
    Utc::now().with_timezone(&PACIFIC).date_naive()
}

pub async fn calendar_events(
    service: &dyn CalendarService,
    theatre: Theatre,
    future_only: bool,
) -> Result<Vec<CalendarEvent>> {
    debug!(calendar = theatre.calendar_name(), "retrieving existing events");
    let events = service.list_events(theatre.calendar_id()).await?;
    info!(
        calendar = theatre.calendar_name(),
        count = events.len(),
        "found existing events"
    );
    let filtered = filter_events(events, future_only, today());
    if future_only {
        info!(
            calendar = theatre.calendar_name(),
            count = filtered.len(),
            "found future events"
        );
    }
    Ok(filtered)
}

/// Scrapes `interval_days` of listings and inserts every showing the
/// calendar does not already hold. Returns the inserted showings.
pub async fn update_calendar(
    service: &dyn CalendarService,
    scraper: &mut SiffScraper<'_>,
    theatre: Theatre,
    interval_days: i64,
) -> Result<Vec<MovieShowing>> {
    let scraped = scraper.scrape_showings(theatre, interval_days).await?;

    let recorded: Vec<MovieShowing> = calendar_events(service, theatre, true)
        .await?
        .iter()
        .filter_map(|event| match from_calendar_event(event) {
            Ok(showing) => Some(showing),
            Err(err) => {
                warn!(summary = %event.summary, %err, "skipping unrecognised calendar event");
                None
            }
        })
        .collect();

    let changeset = reconcile(&scraped, &recorded);
    for showing in &changeset {
        let event = to_calendar_event(showing);
        let created = service.insert_event(theatre.calendar_id(), &event).await?;
        info!(
            %theatre,
            summary = %event.summary,
            start = ?event.start.date_time,
            link = created.html_link.as_deref().unwrap_or_default(),
            "event created"
        );
    }

    deactivate_reminders(service, theatre).await?;
    Ok(changeset)
}

/// The API occasionally attaches reminders to inserted events; strip them.
pub async fn deactivate_reminders(service: &dyn CalendarService, theatre: Theatre) -> Result<usize> {
    let mut count = 0;
    for mut event in calendar_events(service, theatre, true).await? {
        let has_overrides = event
            .reminders
            .as_ref()
            .is_some_and(|r| !r.overrides.is_empty());
        let Some(id) = event.id.clone() else {
            continue;
        };
        if !has_overrides {
            continue;
        }
        warn!(
            calendar = theatre.calendar_name(),
            start = ?event.start.date_time,
            summary = %event.summary,
            "deactivating event with reminders"
        );
        event.reminders = Some(Reminders::disabled());
        service.update_event(theatre.calendar_id(), &id, &event).await?;
        count += 1;
    }
    Ok(count)
}

/// Deletes every event (or every future event) from the theatre's calendar.
pub async fn wipe_calendar(
    service: &dyn CalendarService,
    theatre: Theatre,
    future_only: bool,
) -> Result<usize> {
    let mut count = 0;
    for event in calendar_events(service, theatre, future_only).await? {
        let Some(id) = event.id.as_deref() else {
            continue;
        };
        service.delete_event(theatre.calendar_id(), id).await?;
        info!(
            calendar = theatre.calendar_name(),
            summary = %event.summary,
            start = ?event.start.date_time,
            "deleted"
        );
        count += 1;
    }
    Ok(count)
}
