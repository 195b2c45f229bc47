use std::collections::HashMap;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use siff_calendar::{GoogleCalendar, SiffScraper, Theatre, siff::SIFF_ROOT, sync};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "siff-calendar")]
#[command(about = "Mirror SIFF venue screenings into Google Calendar")]
struct Cli {
    /// Site root the venue calendars are served from
    #[arg(long, env = "SIFF_ROOT_URL", default_value = SIFF_ROOT, global = true)]
    root_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the showings for the next few days
    Scrape {
        #[command(flatten)]
        window: Window,
    },
    /// Insert new showings into the venue's calendar
    Sync {
        #[command(flatten)]
        window: Window,
        #[command(flatten)]
        auth: Auth,
    },
    /// Delete events from the venue's calendar
    Wipe {
        #[arg(long)]
        theatre: Theatre,
        #[arg(long)]
        future_only: bool,
        #[command(flatten)]
        auth: Auth,
    },
    /// Remove reminder overrides from upcoming events
    DeactivateReminders {
        #[arg(long)]
        theatre: Theatre,
        #[command(flatten)]
        auth: Auth,
    },
}

#[derive(Args, Debug)]
struct Window {
    /// Venue slug or short name (egyptian, downtown, uptown, film-center)
    #[arg(long, default_value = "siff-cinema-egyptian")]
    theatre: Theatre,
    /// Number of days to scrape, starting today
    #[arg(long, default_value_t = 7, allow_negative_numbers = true)]
    days: i64,
}

#[derive(Args, Debug)]
struct Auth {
    /// OAuth access token with the calendar scope
    #[arg(long, env = "GOOGLE_CALENDAR_TOKEN", hide_env_values = true)]
    access_token: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let client = reqwest::Client::builder().cookie_store(true).build()?;
    let mut descriptions: HashMap<String, String> = HashMap::new();

    match cli.command {
        Command::Scrape { window } => {
            let mut scraper =
                SiffScraper::new(&client, &mut descriptions).with_root(&cli.root_url);
            let showings = scraper
                .scrape_showings(window.theatre, window.days)
                .await
                .with_context(|| format!("scraping {}", window.theatre))?;
            for showing in showings {
                println!("TITLE       : {}", showing.display_title());
                println!("DIRECTOR    : {} - {}", showing.director, showing.country);
                println!("START       : {}", showing.showtime.start.to_rfc3339());
                println!(
                    "RUNTIME     : {}",
                    showing
                        .duration_minutes
                        .map(|m| format!("{m} min"))
                        .unwrap_or_else(|| "unknown".to_string())
                );
                println!("LOCATION    : {}", showing.location);
                println!("URL         : {}", showing.link);
                println!();
            }
        }
        Command::Sync { window, auth } => {
            let calendar = GoogleCalendar::new(client.clone(), auth.access_token);
            let mut scraper =
                SiffScraper::new(&client, &mut descriptions).with_root(&cli.root_url);
            let inserted =
                sync::update_calendar(&calendar, &mut scraper, window.theatre, window.days)
                    .await
                    .with_context(|| format!("updating calendar for {}", window.theatre))?;
            info!(theatre = %window.theatre, count = inserted.len(), "sync complete");
        }
        Command::Wipe {
            theatre,
            future_only,
            auth,
        } => {
            let calendar = GoogleCalendar::new(client, auth.access_token);
            let deleted = sync::wipe_calendar(&calendar, theatre, future_only)
                .await
                .with_context(|| format!("wiping calendar for {theatre}"))?;
            info!(%theatre, count = deleted, "wipe complete");
        }
        Command::DeactivateReminders { theatre, auth } => {
            let calendar = GoogleCalendar::new(client, auth.access_token);
            let updated = sync::deactivate_reminders(&calendar, theatre)
                .await
                .with_context(|| format!("deactivating reminders for {theatre}"))?;
            info!(%theatre, count = updated, "reminders deactivated");
        }
    }

    Ok(())
}
