use chrono::DateTime;
use chrono_tz::Tz;

/// Trailing marker on a year that was guessed rather than read from the page.
pub const INFERRED_YEAR_MARKER: char = '*';

#[derive(Debug, Clone, PartialEq)]
pub struct ShowTime {
    pub start: DateTime<Tz>,
    /// Absent for records rebuilt from a calendar entry's start time.
    pub end: Option<DateTime<Tz>>,
}

impl ShowTime {
    pub fn new(start: DateTime<Tz>, end: DateTime<Tz>) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    pub fn start_only(start: DateTime<Tz>) -> Self {
        Self { start, end: None }
    }

    /// Screening length rounded to whole minutes, when the end is known
    /// and not before the start.
    pub fn length_minutes(&self) -> Option<i64> {
        let end = self.end?;
        let seconds = (end - self.start).num_seconds();
        if seconds < 0 {
            return None;
        }
        Some((seconds as f64 / 60.0).round() as i64)
    }
}

/// One movie at one showtime.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieShowing {
    pub title: String,
    pub director: String,
    pub country: String,
    pub year: String,
    pub description: String,
    pub link: String,
    pub location: String,
    pub duration_minutes: Option<u32>,
    pub showtime: ShowTime,
}

impl MovieShowing {
    pub fn year_is_inferred(&self) -> bool {
        self.year.ends_with(INFERRED_YEAR_MARKER)
    }

    /// `"<title> (<year>)"`, the form used for calendar summaries and logs.
    pub fn display_title(&self) -> String {
        format!("{} ({})", self.title, self.year)
    }
}

/// The fields that decide whether two showings are the same event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub title: String,
    pub year: String,
    /// Start instant in whole epoch seconds.
    pub start: i64,
    pub location: String,
}

pub fn identity_key(showing: &MovieShowing) -> IdentityKey {
    IdentityKey {
        title: showing.title.clone(),
        year: showing.year.clone(),
        start: showing.showtime.start.timestamp(),
        location: showing.location.clone(),
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use chrono::Timelike;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    const EGYPTIAN: &str = "SIFF Cinema Egyptian, 805 East Pine Street, Seattle, WA 98122";

    fn hash_of(key: &IdentityKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn identity_ignores_non_key_fields() {
        let a = showing("Kneecap", "2024", pacific(2024, 8, 15, 19, 0), EGYPTIAN);
        let mut b = a.clone();
        b.description = "Corrected description".to_string();
        b.link = String::new();
        b.duration_minutes = None;
        b.director = String::new();
        b.showtime.end = None;
        b.showtime.start = b.showtime.start.with_nanosecond(250_000_000).unwrap();

        assert_eq!(identity_key(&a), identity_key(&b));
        assert_eq!(hash_of(&identity_key(&a)), hash_of(&identity_key(&b)));
    }

    #[test]
    fn identity_changes_with_any_key_field() {
        let base = showing("Kneecap", "2024", pacific(2024, 8, 15, 19, 0), EGYPTIAN);
        let variants = [
            showing("Kneecap!", "2024", pacific(2024, 8, 15, 19, 0), EGYPTIAN),
            showing("Kneecap", "2024*", pacific(2024, 8, 15, 19, 0), EGYPTIAN),
            showing("Kneecap", "2024", pacific(2024, 8, 15, 19, 1), EGYPTIAN),
            showing("Kneecap", "2024", pacific(2024, 8, 15, 19, 0), "SIFF Cinema Uptown"),
        ];
        for variant in &variants {
            assert_ne!(identity_key(&base), identity_key(variant));
        }
    }

    #[test]
    fn length_rounds_to_minutes() {
        assert_eq!(reference_showing().length_minutes(), Some(106));
        let open = ShowTime::start_only(pacific(2024, 8, 15, 19, 0));
        assert_eq!(open.length_minutes(), None);
        let reversed = ShowTime::new(pacific(2024, 8, 15, 19, 0), pacific(2024, 8, 15, 18, 0));
        assert_eq!(reversed.length_minutes(), None);
    }

    #[test]
    fn inferred_year_is_detected() {
        let s = showing("Kneecap", "2024*", pacific(2024, 8, 15, 19, 0), EGYPTIAN);
        assert!(s.year_is_inferred());
        assert_eq!(s.display_title(), "Kneecap (2024*)");
    }
}
