//! Scraper for the SIFF venue calendars.
//! Listing: https://siff.net/cinema/cinema-venues/<venue>?day=<offset>
//! Each `div.item` block holds one movie: title + detail link, a
//! `Country | Year | Duration | Director` line and one button per showtime.
//! The long description lives on the movie's detail page.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use crate::error::{Result, ScrapeError};
use crate::fetch::{DescriptionCache, PageFetcher};
use crate::metadata::{self, Metadata};
use crate::model::{MovieShowing, ShowTime};
use crate::screening::extract_screenings;
use crate::theatre::Theatre;
use crate::util::{date_delta, parse_int};

pub const SIFF_ROOT: &str = "https://siff.net";
const VENUES_PATH: &str = "/cinema/cinema-venues";

static LISTING_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.listing").expect("listing selector"));
static ITEM_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.item").expect("item selector"));
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h3").expect("title selector"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("link selector"));
static META_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.small-copy p.meta").expect("meta selector"));
static BODY_COPY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.body-copy").expect("body copy selector"));
static PARAGRAPH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("paragraph selector"));

/// One movie on a day's listing page, before descriptions are fetched.
#[derive(Debug)]
struct ListingBlock {
    title: String,
    link: String,
    metadata: Metadata,
    screenings: Vec<(ShowTime, String)>,
}

/// Parses a venue calendar page. A page without the listing container
/// (no screenings that day) yields an empty list.
fn parse_listing(html: &str, root: &str) -> Result<Vec<ListingBlock>> {
    let document = Html::parse_document(html);
    let Some(listing) = document.select(&LISTING_SELECTOR).next() else {
        debug!("no listing container on page");
        return Ok(Vec::new());
    };

    let mut blocks = Vec::new();
    for movie in listing.select(&ITEM_SELECTOR) {
        let title_element = movie
            .select(&TITLE_SELECTOR)
            .next()
            .ok_or_else(|| ScrapeError::Parse("listing block without title".to_string()))?;
        let title = title_element
            .text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        let screenings = extract_screenings(movie)?;
        if screenings.is_empty() {
            debug!(%title, "no screenings with payload, skipping");
            continue;
        }

        let link = movie_link(title_element, root)
            .ok_or_else(|| ScrapeError::Parse(format!("no detail link for {title}")))?;
        let metadata = metadata::repair(&metadata_fields(movie), screenings.first().map(|(s, _)| s));

        blocks.push(ListingBlock {
            title,
            link,
            metadata,
            screenings,
        });
    }
    Ok(blocks)
}

fn metadata_fields(movie: ElementRef<'_>) -> Vec<String> {
    match movie.select(&META_SELECTOR).next() {
        Some(meta) => metadata::split_fields(&meta.text().collect::<String>()),
        None => {
            warn!("listing block without metadata line");
            Vec::new()
        }
    }
}

fn movie_link(title_element: ElementRef<'_>, root: &str) -> Option<String> {
    let href = title_element
        .select(&LINK_SELECTOR)
        .next()?
        .value()
        .attr("href")?
        .trim();
    if href.is_empty() {
        None
    } else if href.starts_with("http") {
        Some(href.to_string())
    } else {
        Some(format!("{}{}", root, href))
    }
}

/// First paragraph of the detail page's body copy, formatting tags dropped.
fn parse_description(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let body = document.select(&BODY_COPY_SELECTOR).next()?;
    let paragraph = body.select(&PARAGRAPH_SELECTOR).next()?;
    Some(paragraph.text().collect::<String>())
}

/// Builds `MovieShowing`s from the SIFF calendar, one per movie x showtime.
pub struct SiffScraper<'a> {
    fetcher: &'a dyn PageFetcher,
    descriptions: &'a mut dyn DescriptionCache,
    root: String,
}

impl<'a> SiffScraper<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, descriptions: &'a mut dyn DescriptionCache) -> Self {
        Self {
            fetcher,
            descriptions,
            root: SIFF_ROOT.to_string(),
        }
    }

    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into().trim_end_matches('/').to_string();
        self
    }

    pub fn day_url(&self, theatre: Theatre, day: i64) -> String {
        format!("{}{}/{}?day={}", self.root, VENUES_PATH, theatre.slug(), day)
    }

    /// Scrapes `interval_days` consecutive days starting today, in order.
    pub async fn scrape_showings(
        &mut self,
        theatre: Theatre,
        interval_days: i64,
    ) -> Result<Vec<MovieShowing>> {
        if interval_days <= 0 {
            return Err(ScrapeError::InvalidArgument(format!(
                "interval_days must be positive, got {interval_days}"
            )));
        }

        let mut movies = Vec::new();
        for day in 0..interval_days {
            let url = self.day_url(theatre, day);
            let showings = self.scrape_page_calendar(&url).await?;
            if showings.is_empty() {
                warn!(
                    date = %date_delta(day),
                    %theatre,
                    "no movie listing found for date"
                );
            }
            movies.extend(showings);
        }

        let playing: BTreeSet<String> = movies.iter().map(MovieShowing::display_title).collect();
        info!(
            count = movies.len(),
            week_of = %date_delta(0),
            %theatre,
            "found showings"
        );
        info!(
            %theatre,
            "movies currently playing: {}",
            playing.into_iter().collect::<Vec<_>>().join(", ")
        );
        Ok(movies)
    }

    pub async fn scrape_page_calendar(&mut self, url: &str) -> Result<Vec<MovieShowing>> {
        debug!(%url, "scraping");
        let body = self.fetcher.fetch_page(url).await?;
        // Html is not Send; parse fully before the description fetches below.
        let blocks = parse_listing(&body, &self.root)?;

        let mut showings = Vec::new();
        for block in blocks {
            let description = self.description(&block.link).await?;
            let duration_minutes = duration_minutes(&block.title, &block.metadata.duration);
            for (showtime, location) in block.screenings {
                showings.push(MovieShowing {
                    title: block.title.clone(),
                    director: block.metadata.director.clone(),
                    country: block.metadata.country.clone(),
                    year: block.metadata.year.clone(),
                    description: description.clone(),
                    link: block.link.clone(),
                    location,
                    duration_minutes,
                    showtime,
                });
            }
        }
        Ok(showings)
    }

    async fn description(&mut self, url: &str) -> Result<String> {
        if let Some(cached) = self.descriptions.get(url) {
            return Ok(cached);
        }
        debug!(%url, "retrieving description");
        let body = self.fetcher.fetch_page(url).await?;
        let description = parse_description(&body).unwrap_or_else(|| {
            warn!(%url, "detail page without description block");
            String::new()
        });
        self.descriptions.insert(url.to_string(), description.clone());
        Ok(description)
    }
}

fn duration_minutes(title: &str, duration: &str) -> Option<u32> {
    match parse_int(duration) {
        Ok(minutes) => u32::try_from(minutes).ok(),
        Err(err) => {
            warn!(%title, %err, "duration unavailable");
            None
        }
    }
}
