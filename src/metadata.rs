//! Repair of the `Country | Year | Duration | Director` line shown under each
//! listing. Some movies ship with fields missing; the policy below decides
//! which field is absent from the field count and the shape of the first field.

use chrono::{Datelike, Utc};
use tracing::{debug, warn};

use crate::model::{INFERRED_YEAR_MARKER, ShowTime};
use crate::util::{PACIFIC, is_parseable_as_int};

pub const UNKNOWN_COUNTRY: &str = "Unknown Country";
pub const UNKNOWN_DURATION: &str = "Unknown Duration";
pub const UNKNOWN_DIRECTOR: &str = "Unknown Director";

/// Canonical metadata tuple for a movie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub country: String,
    pub year: String,
    /// Duration text as listed, e.g. `"107 min."`.
    pub duration: String,
    pub director: String,
}

impl Metadata {
    fn new(country: &str, year: &str, duration: &str, director: &str) -> Self {
        Self {
            country: country.to_string(),
            year: year.to_string(),
            duration: duration.to_string(),
            director: director.to_string(),
        }
    }

    pub fn as_tuple(&self) -> (&str, &str, &str, &str) {
        (&self.country, &self.year, &self.duration, &self.director)
    }
}

/// Which repair applies to a raw field list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairPolicy {
    Complete,
    MissingCountry,
    /// Duration absent; rebuilt from the reference screening length.
    MissingDuration,
    OnlyDuration,
    OnlyYear,
    /// Nothing usable; every field falls back to a placeholder.
    Unknown,
}

impl RepairPolicy {
    pub fn classify<S: AsRef<str>>(fields: &[S], reference: Option<&ShowTime>) -> Self {
        match fields {
            [_, _, _, _] => RepairPolicy::Complete,
            [first, _, _] if is_parseable_as_int(first.as_ref()) => RepairPolicy::MissingCountry,
            [_, _, _] if reference.and_then(ShowTime::length_minutes).is_some() => {
                RepairPolicy::MissingDuration
            }
            [only] if only.as_ref().contains("min.") => RepairPolicy::OnlyDuration,
            [only] if is_parseable_as_int(only.as_ref()) => RepairPolicy::OnlyYear,
            _ => RepairPolicy::Unknown,
        }
    }
}

/// Splits a raw `a | b | c` metadata line into trimmed fields.
pub fn split_fields(raw: &str) -> Vec<String> {
    raw.split('|').map(|f| f.trim().to_string()).collect()
}

/// Rebuilds the full metadata tuple from up to four raw fields.
///
/// `reference` is a screening of the same movie; its length stands in for a
/// missing duration and its year for a missing year (marked with `*`).
pub fn repair<S: AsRef<str>>(fields: &[S], reference: Option<&ShowTime>) -> Metadata {
    let policy = RepairPolicy::classify(fields, reference);
    let raw: Vec<&str> = fields.iter().map(|f| f.as_ref()).collect();
    debug!(?raw, "extracted metadata");
    if policy != RepairPolicy::Complete {
        warn!(?raw, ?policy, "attempting to correct incomplete metadata");
    }

    let fallback_year = fallback_year(reference);
    let repaired = match policy {
        RepairPolicy::Complete => return Metadata::new(raw[0], raw[1], raw[2], raw[3]),
        RepairPolicy::MissingCountry => Metadata::new(UNKNOWN_COUNTRY, raw[0], raw[1], raw[2]),
        RepairPolicy::MissingDuration => {
            let minutes = reference.and_then(ShowTime::length_minutes).unwrap_or_default();
            Metadata::new(raw[0], raw[1], &format!("{minutes} min."), raw[2])
        }
        RepairPolicy::OnlyDuration => {
            Metadata::new(UNKNOWN_COUNTRY, &fallback_year, raw[0], UNKNOWN_DIRECTOR)
        }
        RepairPolicy::OnlyYear => {
            Metadata::new(UNKNOWN_COUNTRY, raw[0], UNKNOWN_DURATION, UNKNOWN_DIRECTOR)
        }
        RepairPolicy::Unknown => {
            Metadata::new(UNKNOWN_COUNTRY, &fallback_year, UNKNOWN_DURATION, UNKNOWN_DIRECTOR)
        }
    };
    warn!(?raw, corrected = ?repaired.as_tuple(), "corrected metadata");
    repaired
}

fn fallback_year(reference: Option<&ShowTime>) -> String {
    let year = reference
        .map(|r| r.start.year())
        .unwrap_or_else(|| Utc::now().with_timezone(&PACIFIC).year());
    format!("{year}{INFERRED_YEAR_MARKER}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{pacific, reference_showing};

    fn repaired(fields: &[&str]) -> Metadata {
        repair(fields, Some(&reference_showing()))
    }

    #[test]
    fn complete_metadata_passes_through() {
        let meta = repaired(&["USA", "2023", "107 min.", "Greg Kwedar"]);
        assert_eq!(meta.as_tuple(), ("USA", "2023", "107 min.", "Greg Kwedar"));
    }

    #[test]
    fn missing_country_is_filled() {
        let meta = repaired(&["2024", "90 min.", "Simona Risi"]);
        assert_eq!(
            meta.as_tuple(),
            ("Unknown Country", "2024", "90 min.", "Simona Risi")
        );
    }

    #[test]
    fn missing_duration_comes_from_reference() {
        let meta = repaired(&["Ireland", "2024", "Rich Peppiatt"]);
        assert_eq!(meta.as_tuple(), ("Ireland", "2024", "106 min.", "Rich Peppiatt"));
    }

    #[test]
    fn only_duration_infers_year() {
        let meta = repaired(&["91 min."]);
        assert_eq!(
            meta.as_tuple(),
            ("Unknown Country", "2024*", "91 min.", "Unknown Director")
        );
    }

    #[test]
    fn only_year_is_kept() {
        let meta = repaired(&["1987"]);
        assert_eq!(
            meta.as_tuple(),
            ("Unknown Country", "1987", "Unknown Duration", "Unknown Director")
        );
    }

    #[test]
    fn empty_metadata_falls_back() {
        let empty: [&str; 0] = [];
        let expected = ("Unknown Country", "2024*", "Unknown Duration", "Unknown Director");
        assert_eq!(repaired(&empty).as_tuple(), expected);
        assert_eq!(repaired(&[""]).as_tuple(), expected);
        assert_eq!(repaired(&["USA", "2023"]).as_tuple(), expected);
        assert_eq!(repaired(&["a", "b", "c", "d", "e"]).as_tuple(), expected);
    }

    #[test]
    fn missing_duration_without_end_time_falls_back() {
        let open = ShowTime::start_only(pacific(2024, 8, 15, 19, 0));
        let meta = repair(&["Ireland", "2024", "Rich Peppiatt"], Some(&open));
        assert_eq!(
            meta.as_tuple(),
            ("Unknown Country", "2024*", "Unknown Duration", "Unknown Director")
        );
    }

    #[test]
    fn missing_duration_with_reversed_times_falls_back() {
        let reversed = ShowTime::new(pacific(2024, 8, 15, 19, 0), pacific(2024, 8, 15, 18, 0));
        let fields = ["Ireland", "2024", "Rich Peppiatt"];
        assert_eq!(RepairPolicy::classify(&fields, Some(&reversed)), RepairPolicy::Unknown);
        assert_eq!(repair(&fields, Some(&reversed)).duration, "Unknown Duration");
    }

    #[test]
    fn classification_table() {
        let r = reference_showing();
        let r = Some(&r);
        assert_eq!(RepairPolicy::classify(&["a", "1", "2 min.", "d"], r), RepairPolicy::Complete);
        assert_eq!(RepairPolicy::classify(&["2024", "90 min.", "d"], r), RepairPolicy::MissingCountry);
        assert_eq!(RepairPolicy::classify(&["USA", "2024", "d"], r), RepairPolicy::MissingDuration);
        assert_eq!(RepairPolicy::classify(&["USA", "2024", "d"], None), RepairPolicy::Unknown);
        assert_eq!(RepairPolicy::classify(&["91 min."], None), RepairPolicy::OnlyDuration);
        assert_eq!(RepairPolicy::classify(&["2024"], None), RepairPolicy::OnlyYear);
        assert_eq!(RepairPolicy::classify(&["Canada"], None), RepairPolicy::Unknown);
    }

    #[test]
    fn splits_and_trims_fields() {
        assert_eq!(
            split_fields(" USA | 2023 |107 min.|  Greg Kwedar "),
            vec!["USA", "2023", "107 min.", "Greg Kwedar"]
        );
        assert_eq!(split_fields(""), vec![""]);
    }
}
