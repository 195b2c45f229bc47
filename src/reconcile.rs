use std::collections::HashSet;

use crate::model::{IdentityKey, MovieShowing, identity_key};

/// Showings from `scraped` whose identity is not already in `recorded`, in
/// scrape order. Recorded showings missing from the scrape are left alone;
/// removing them is a separate, date-filtered operation.
pub fn reconcile(scraped: &[MovieShowing], recorded: &[MovieShowing]) -> Vec<MovieShowing> {
    let known: HashSet<IdentityKey> = recorded.iter().map(identity_key).collect();
    scraped
        .iter()
        .filter(|showing| !known.contains(&identity_key(showing)))
        .cloned()
        .collect()
}
