//! Per-showtime data embedded in a listing block.
//! Each showtime button carries a `data-screening` JSON attribute with epoch
//! millisecond times and the venue address.

use chrono::DateTime;
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, ScrapeError};
use crate::model::ShowTime;
use crate::util::{datetime_from_millis, millis_to_pacific};

static TIMES_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.times").expect("times selector"));
static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("anchor selector"));

const SCREENING_ATTR: &str = "data-screening";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ScreeningPayload {
    showtime: Value,
    showtime_end: Value,
    venue_name: String,
    venue_address1: String,
    venue_city: String,
    venue_state: String,
    venue_zip_code: String,
}

impl ScreeningPayload {
    fn showtime(&self) -> Result<ShowTime> {
        Ok(ShowTime::new(
            payload_time(&self.showtime)?,
            payload_time(&self.showtime_end)?,
        ))
    }

    fn location(&self) -> String {
        format!(
            "{}, {}, {}, {} {}",
            self.venue_name,
            self.venue_address1,
            self.venue_city,
            self.venue_state,
            self.venue_zip_code
        )
    }
}

fn payload_time(value: &Value) -> Result<DateTime<Tz>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| ScrapeError::Parse(format!("non-integer screening time: {n}")))
            .and_then(millis_to_pacific),
        Value::String(s) => datetime_from_millis(s),
        other => Err(ScrapeError::Parse(format!(
            "unexpected screening time: {other}"
        ))),
    }
}

/// Decodes every showtime button that carries a payload, in page order.
/// Buttons without the attribute (sold-out placeholders and the like) are skipped.
fn screening_payloads(block: ElementRef<'_>) -> Result<Vec<ScreeningPayload>> {
    let Some(times) = block.select(&TIMES_SELECTOR).next() else {
        return Ok(Vec::new());
    };
    times
        .select(&ANCHOR_SELECTOR)
        .filter_map(|a| a.value().attr(SCREENING_ATTR))
        .map(|raw| serde_json::from_str(raw).map_err(ScrapeError::from))
        .collect()
}

pub fn extract_showtimes(block: ElementRef<'_>) -> Result<Vec<ShowTime>> {
    screening_payloads(block)?
        .iter()
        .map(ScreeningPayload::showtime)
        .collect()
}

/// Venue strings formatted `"<venue>, <address>, <city>, <state> <zip>"`.
pub fn extract_locations(block: ElementRef<'_>) -> Result<Vec<String>> {
    Ok(screening_payloads(block)?
        .iter()
        .map(ScreeningPayload::location)
        .collect())
}

/// Showtimes paired with their venue, decoded from a single pass so that
/// `screenings[i]` always describes one button.
pub fn extract_screenings(block: ElementRef<'_>) -> Result<Vec<(ShowTime, String)>> {
    screening_payloads(block)?
        .iter()
        .map(|p| Ok((p.showtime()?, p.location())))
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// One listing block as served on the venue calendar page.
    pub const MOVIE_HTML: &str = r#"
    <div class="item">
        <h3><a href="/cinema/in-theaters/kneecap">Kneecap</a></h3>
        <div class="small-copy"><p class="meta">Ireland | 2024 | 106 min. | Rich Peppiatt</p></div>
        <div class="times">
            <a class="button" data-screening='{"Showtime":"/Date(1723753800000)/","ShowtimeEnd":"/Date(1723760100000)/","VenueName":"SIFF Cinema Egyptian","VenueAddress1":"805 East Pine Street","VenueCity":"Seattle","VenueState":"WA","VenueZipCode":"98122"}'>1:30 PM</a>
            <a class="button sold-out">4:00 PM</a>
            <a class="button" data-screening='{"Showtime":1723773600000,"ShowtimeEnd":1723779960000,"VenueName":"SIFF Cinema Uptown","VenueAddress1":"511 Queen Anne Ave N","VenueCity":"Seattle","VenueState":"WA","VenueZipCode":"98109"}'>7:00 PM</a>
        </div>
    </div>
    "#;
}

#[cfg(test)]
mod tests {
    use super::fixtures::MOVIE_HTML;
    use super::*;
    use crate::model::fixtures::pacific;
    use scraper::Html;

    fn with_block<T>(html: &str, f: impl FnOnce(ElementRef<'_>) -> T) -> T {
        let doc = Html::parse_fragment(html);
        let sel = Selector::parse("div.item").unwrap();
        let block = doc.select(&sel).next().unwrap();
        f(block)
    }

    #[test]
    fn extracts_showtimes_in_order() {
        let showtimes = with_block(MOVIE_HTML, extract_showtimes).unwrap();
        assert_eq!(
            showtimes,
            vec![
                ShowTime::new(pacific(2024, 8, 15, 13, 30), pacific(2024, 8, 15, 15, 15)),
                ShowTime::new(pacific(2024, 8, 15, 19, 0), pacific(2024, 8, 15, 20, 46)),
            ]
        );
    }

    #[test]
    fn extracts_locations_aligned_with_showtimes() {
        let locations = with_block(MOVIE_HTML, extract_locations).unwrap();
        assert_eq!(
            locations,
            vec![
                "SIFF Cinema Egyptian, 805 East Pine Street, Seattle, WA 98122",
                "SIFF Cinema Uptown, 511 Queen Anne Ave N, Seattle, WA 98109",
            ]
        );

        let pairs = with_block(MOVIE_HTML, extract_screenings).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1].0.start, pacific(2024, 8, 15, 19, 0));
        assert!(pairs[1].1.starts_with("SIFF Cinema Uptown"));
    }

    #[test]
    fn block_without_times_has_no_screenings() {
        let html = r#"<div class="item"><h3>Short Program</h3></div>"#;
        assert!(with_block(html, extract_showtimes).unwrap().is_empty());
        assert!(with_block(html, extract_locations).unwrap().is_empty());
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let html = r#"<div class="item"><div class="times"><a data-screening='{"Showtime":'>x</a></div></div>"#;
        let err = with_block(html, extract_showtimes).unwrap_err();
        assert!(matches!(err, ScrapeError::Payload(_)));
    }
}
