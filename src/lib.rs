//! Scrapes the SIFF venue calendars and mirrors new screenings into one
//! Google Calendar per venue, inserting each screening exactly once.

pub mod calendar;
pub mod error;
pub mod fetch;
pub mod metadata;
pub mod model;
pub mod reconcile;
pub mod screening;
pub mod siff;
pub mod sync;
pub mod theatre;
pub mod util;

pub use calendar::{CalendarEvent, CalendarService, GoogleCalendar, from_calendar_event, to_calendar_event};
pub use error::{Result, ScrapeError};
pub use fetch::{DescriptionCache, PageFetcher};
pub use metadata::{Metadata, RepairPolicy, repair};
pub use model::{IdentityKey, MovieShowing, ShowTime, identity_key};
pub use reconcile::reconcile;
pub use siff::SiffScraper;
pub use theatre::Theatre;
