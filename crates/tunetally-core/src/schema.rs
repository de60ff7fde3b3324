use std::collections::HashSet;

use once_cell::sync::Lazy;
use polars::prelude::DataFrame;
use tracing::warn;

use crate::error::PipelineWarning;

pub const RELEASE_DATE: &str = "Release.Date";
pub const YEAR: &str = "Year";
pub const EXPLICIT: &str = "Explicit.Track";
pub const OTHER: &str = "other";

pub const SENTINEL_VALUE: f64 = -1.0;

pub const EXPECTED_COLUMNS: [&str; 27] = [
    "Track",
    "Album.Name",
    "Artist",
    "Release.Date",
    "All.Time.Rank",
    "Track.Score",
    "Spotify.Streams",
    "Spotify.Playlist.Count",
    "Spotify.Playlist.Reach",
    "Spotify.Popularity",
    "YouTube.Views",
    "YouTube.Likes",
    "TikTok.Posts",
    "TikTok.Likes",
    "TikTok.Views",
    "YouTube.Playlist.Reach",
    "Apple.Music.Playlist.Count",
    "AirPlay.Spins",
    "SiriusXM.Spins",
    "Deezer.Playlist.Count",
    "Deezer.Playlist.Reach",
    "Amazon.Playlist.Count",
    "Pandora.Streams",
    "Pandora.Track.Stations",
    "Soundcloud.Streams",
    "Shazam.Counts",
    "Explicit.Track",
];

/// Per-platform engagement counts, coerced to Float64 by the normalizer.
pub const METRIC_COLUMNS: [&str; 20] = [
    "Spotify.Streams",
    "Spotify.Playlist.Count",
    "Spotify.Playlist.Reach",
    "Spotify.Popularity",
    "YouTube.Views",
    "YouTube.Likes",
    "TikTok.Posts",
    "TikTok.Likes",
    "TikTok.Views",
    "YouTube.Playlist.Reach",
    "Apple.Music.Playlist.Count",
    "AirPlay.Spins",
    "SiriusXM.Spins",
    "Deezer.Playlist.Count",
    "Deezer.Playlist.Reach",
    "Amazon.Playlist.Count",
    "Pandora.Streams",
    "Pandora.Track.Stations",
    "Soundcloud.Streams",
    "Shazam.Counts",
];

/// Columns where -1 means "not tracked" rather than a count.
pub const SENTINELED_COLUMNS: [&str; 4] = [
    "Spotify.Streams",
    "YouTube.Views",
    "TikTok.Views",
    "Pandora.Streams",
];

/// Minor platforms folded into the `other` column.
pub const OTHER_PLATFORM_COLUMNS: [&str; 5] = [
    "AirPlay.Spins",
    "SiriusXM.Spins",
    "Pandora.Streams",
    "Deezer.Playlist.Reach",
    "Soundcloud.Streams",
];

pub const DEFAULT_ANALYSIS_METRICS: [&str; 4] =
    ["YouTube.Views", "Spotify.Streams", "TikTok.Views", OTHER];

static SELECTABLE_METRICS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    METRIC_COLUMNS
        .iter()
        .copied()
        .chain(std::iter::once(OTHER))
        .collect()
});

/// True for names a caller may select for aggregation.
pub fn is_selectable_metric(name: &str) -> bool {
    SELECTABLE_METRICS.contains(name)
}

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_index(name).is_some()
}

/// Returns the expected columns absent from `df`, in schema order.
pub fn find_missing_columns(df: &DataFrame, expected: &[&str]) -> Vec<String> {
    expected
        .iter()
        .filter(|name| !has_column(df, name))
        .map(|name| name.to_string())
        .collect()
}

/// Checks `df` against the full expected schema. Emits one warning per gap and never fails.
pub fn validate_schema(df: &DataFrame) -> (Vec<String>, Vec<PipelineWarning>) {
    let missing = find_missing_columns(df, &EXPECTED_COLUMNS);
    let warnings = missing
        .iter()
        .map(|column| {
            warn!(column = column.as_str(), "Expected column missing from dataset");
            PipelineWarning::MissingColumn {
                column: column.clone(),
            }
        })
        .collect();
    (missing, warnings)
}
