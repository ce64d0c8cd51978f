//! MusicBrainz recording API

use super::{metadata_files, read_metadata};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_METADATA_DIR: &str = "musicbrainz_corpus/metadata";

/// Recording ids crawled when the corpus yields nothing
pub const MUSICBRAINZ_SEEDS: [&str; 5] = [
    "b3fbc2f9-7434-4d21-8bb3-1d246f5aef45",
    "d8f1f6bc-8e5c-42e5-9f5d-9b5f5b5f5b5f",
    "f6a3c7d8-9e2b-4f5d-8c3a-1b2e4f6a8c9d",
    "d4f1f6bc-8e5c-42e5-9f5d-9b5f5b5f5b5c",
    "c9f1f6bc-8e5c-42e5-9f5d-9b5f5b5f5b59",
];

#[derive(Debug, Default, Deserialize)]
struct RecordingMetadata {
    #[serde(default)]
    mbid: String,
}

/// Recording lookup URL for a MusicBrainz id
pub fn recording_url(mbid: &str) -> String {
    format!("https://musicbrainz.org/ws/2/recording/{}?fmt=json", mbid)
}

pub(super) fn generate(metadata_dir: Option<&str>) -> Vec<String> {
    let dir = Path::new(metadata_dir.unwrap_or(DEFAULT_METADATA_DIR));

    let mut urls: Vec<String> = metadata_files(dir)
        .iter()
        .filter_map(|path| read_metadata::<RecordingMetadata>(path))
        .filter(|metadata| !metadata.mbid.is_empty())
        .map(|metadata| recording_url(&metadata.mbid))
        .collect();

    if urls.is_empty() {
        tracing::info!("No MusicBrainz metadata in {}, using seed recordings", dir.display());
        urls = MUSICBRAINZ_SEEDS.iter().map(|mbid| recording_url(mbid)).collect();
    }

    urls
}
