//! Google Calendar side of the sync: the event wire model, the mapping
//! between showings and events, and a thin REST client.

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScrapeError};
use crate::model::{MovieShowing, ShowTime};
use crate::util::PACIFIC;

pub const TIME_ZONE: &str = "America/Los_Angeles";
pub const GOOGLE_CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3";

const INFERRED_YEAR_NOTE: &str = "\n\n* = year was unspecified, assuming this year";

/// Older events were written with this prefix in the summary.
const LEGACY_TITLE_PREFIX: &str = "[Movie] ";

static SUMMARY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^(?P<title>.*) \((?P<year>\d{4}\*?)\)$").expect("summary regex"));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub start: EventTime,
    #[serde(default)]
    pub end: EventTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    /// `transparent` keeps the event from blocking time on subscribers' calendars.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminders: Option<Reminders>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<FixedOffset>>,
    /// Set instead of `date_time` on all-day events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminders {
    pub use_default: bool,
    /// Always sent, so an update with an empty list clears existing overrides.
    #[serde(default)]
    pub overrides: Vec<ReminderOverride>,
}

impl Reminders {
    pub fn disabled() -> Self {
        Self {
            use_default: false,
            overrides: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderOverride {
    pub method: String,
    pub minutes: i64,
}

fn event_time(at: DateTime<Tz>) -> EventTime {
    EventTime {
        date_time: Some(at.with_nanosecond(0).unwrap_or(at).fixed_offset()),
        date: None,
        time_zone: Some(TIME_ZONE.to_string()),
    }
}

/// Encodes a showing as a public, non-blocking event without reminders.
pub fn to_calendar_event(showing: &MovieShowing) -> CalendarEvent {
    let start = showing.showtime.start;
    let end = showing
        .showtime
        .end
        .or_else(|| {
            showing
                .duration_minutes
                .map(|m| start + chrono::Duration::minutes(i64::from(m)))
        })
        .unwrap_or(start);

    let mut description = format!(
        "Director: {} - {}\n{}\n---\n{}",
        showing.director, showing.country, showing.description, showing.link
    );
    if showing.year_is_inferred() {
        description.push_str(INFERRED_YEAR_NOTE);
    }

    CalendarEvent {
        summary: showing.display_title(),
        location: Some(showing.location.clone()),
        description: Some(description),
        start: event_time(start),
        end: event_time(end),
        visibility: Some("public".to_string()),
        transparency: Some("transparent".to_string()),
        reminders: Some(Reminders::disabled()),
        ..Default::default()
    }
}

/// Splits `"<title> (<year>)"` back into title and year.
pub fn parse_summary(summary: &str) -> Option<(String, String)> {
    let summary = summary.strip_prefix(LEGACY_TITLE_PREFIX).unwrap_or(summary);
    let caps = SUMMARY_RE.captures(summary)?;
    Some((caps["title"].to_string(), caps["year"].to_string()))
}

/// Rebuilds the identity-bearing part of a showing from an existing event.
/// Description, link and duration are not recoverable and stay empty.
pub fn from_calendar_event(event: &CalendarEvent) -> Result<MovieShowing> {
    let (title, year) = parse_summary(&event.summary)
        .ok_or_else(|| ScrapeError::Parse(format!("no year in event summary: {:?}", event.summary)))?;
    let start = event
        .start
        .date_time
        .ok_or_else(|| ScrapeError::Parse(format!("event without start time: {:?}", event.summary)))?
        .with_timezone(&PACIFIC);

    Ok(MovieShowing {
        title,
        director: String::new(),
        country: String::new(),
        year,
        description: String::new(),
        link: String::new(),
        location: event.location.clone().unwrap_or_default(),
        duration_minutes: None,
        showtime: ShowTime::start_only(start),
    })
}

/// CRUD surface of a remote calendar.
#[async_trait::async_trait]
pub trait CalendarService: Send + Sync {
    async fn list_events(&self, calendar_id: &str) -> Result<Vec<CalendarEvent>>;

    async fn insert_event(&self, calendar_id: &str, event: &CalendarEvent)
    -> Result<CalendarEvent>;

    async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        event: &CalendarEvent,
    ) -> Result<CalendarEvent>;

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventList {
    #[serde(default)]
    items: Vec<CalendarEvent>,
    next_page_token: Option<String>,
}

/// Google Calendar v3 REST client authenticated with an OAuth access token.
pub struct GoogleCalendar {
    client: Client,
    access_token: String,
    base_url: String,
}

impl GoogleCalendar {
    pub fn new(client: Client, access_token: impl Into<String>) -> Self {
        Self {
            client,
            access_token: access_token.into(),
            base_url: GOOGLE_CALENDAR_API.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!("{}/calendars/{}/events", self.base_url, calendar_id)
    }

    fn event_url(&self, calendar_id: &str, event_id: &str) -> String {
        format!("{}/{}", self.events_url(calendar_id), event_id)
    }
}

fn calendar_error(action: &str) -> impl Fn(reqwest::Error) -> ScrapeError + '_ {
    move |e| ScrapeError::Calendar(format!("{action}: {e}"))
}

#[async_trait::async_trait]
impl CalendarService for GoogleCalendar {
    async fn list_events(&self, calendar_id: &str) -> Result<Vec<CalendarEvent>> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self
                .client
                .get(self.events_url(calendar_id))
                .bearer_auth(&self.access_token);
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token)]);
            }
            let page: EventList = request
                .send()
                .await
                .map_err(calendar_error("list events"))?
                .error_for_status()
                .map_err(calendar_error("list events"))?
                .json()
                .await
                .map_err(calendar_error("decode event list"))?;
            events.extend(page.items);
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(events)
    }

    async fn insert_event(
        &self,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> Result<CalendarEvent> {
        self.client
            .post(self.events_url(calendar_id))
            .bearer_auth(&self.access_token)
            .json(event)
            .send()
            .await
            .map_err(calendar_error("insert event"))?
            .error_for_status()
            .map_err(calendar_error("insert event"))?
            .json()
            .await
            .map_err(calendar_error("decode inserted event"))
    }

    async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        event: &CalendarEvent,
    ) -> Result<CalendarEvent> {
        // PATCH leaves fields this model does not carry untouched.
        self.client
            .patch(self.event_url(calendar_id, event_id))
            .bearer_auth(&self.access_token)
            .json(event)
            .send()
            .await
            .map_err(calendar_error("update event"))?
            .error_for_status()
            .map_err(calendar_error("update event"))?
            .json()
            .await
            .map_err(calendar_error("decode updated event"))
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<()> {
        self.client
            .delete(self.event_url(calendar_id, event_id))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(calendar_error("delete event"))?
            .error_for_status()
            .map_err(calendar_error("delete event"))?;
        Ok(())
    }
}
