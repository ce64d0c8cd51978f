//! Lyrics.ovh lyrics API

use super::{encode_segment, metadata_files, read_metadata};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_METADATA_DIR: &str = "lyrics_corpus/metadata";

/// Tracks crawled when the corpus yields nothing
pub const LYRICS_OVH_SEEDS: [(&str, &str); 5] = [
    ("The Beatles", "Yesterday"),
    ("Queen", "Bohemian Rhapsody"),
    ("Michael Jackson", "Billie Jean"),
    ("Nirvana", "Smells Like Teen Spirit"),
    ("Led Zeppelin", "Stairway to Heaven"),
];

#[derive(Debug, Default, Deserialize)]
struct TrackMetadata {
    #[serde(default)]
    track: Option<Track>,
}

#[derive(Debug, Default, Deserialize)]
struct Track {
    #[serde(default)]
    artist_name: String,
    #[serde(default)]
    track_name: String,
}

/// Lyrics URL of a track
pub fn lyrics_url(artist: &str, title: &str) -> String {
    format!(
        "https://api.lyrics.ovh/v1/{}/{}",
        encode_segment(artist),
        encode_segment(title)
    )
}

pub(super) fn generate(metadata_dir: Option<&str>) -> Vec<String> {
    let dir = Path::new(metadata_dir.unwrap_or(DEFAULT_METADATA_DIR));

    let mut urls: Vec<String> = metadata_files(dir)
        .iter()
        .filter_map(|path| read_metadata::<TrackMetadata>(path))
        .filter_map(|metadata| metadata.track)
        .filter(|track| !track.artist_name.is_empty() && !track.track_name.is_empty())
        .map(|track| lyrics_url(&track.artist_name, &track.track_name))
        .collect();

    if urls.is_empty() {
        tracing::info!("No Lyrics.ovh metadata in {}, using seed tracks", dir.display());
        urls = LYRICS_OVH_SEEDS
            .iter()
            .map(|(artist, title)| lyrics_url(artist, title))
            .collect();
    }

    urls
}
