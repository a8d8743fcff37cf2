//! Gurbani text search
//!
//! Ang lookup, free-text search with the transliteration -> translation
//! fallback, and the daily hukamnama.

mod client;
mod query;
mod service;

pub use client::{
    GurbaniCall, GurbaniNowClient, GurbaniSource, MockGurbaniSource, SearchVariant,
    DEFAULT_GURBANI_BASE, GURBANI_SERVICE,
};
pub use query::{is_latin_script, AngNumber, QueryKind, SearchQuery, MAX_ANG, MIN_ANG};
pub use service::{match_count, SearchOutcome, SearchService};
