//! Source URL generators
//!
//! Each source family turns its configuration into the list of URLs a run
//! should visit. Music sources read upstream metadata files and fall back
//! to a fixed seed list when none yield a URL; generic sources list their
//! URLs directly.

mod lyrics_ovh;
mod musicbrainz;

pub use lyrics_ovh::{lyrics_url, LYRICS_OVH_SEEDS};
pub use musicbrainz::{recording_url, MUSICBRAINZ_SEEDS};

use crate::config::{SourceConfig, SourceKind};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Generates the candidate URLs of a source, in visiting order
pub fn generate_urls(key: &str, source: &SourceConfig) -> Vec<String> {
    let urls = match source.resolved_kind(key) {
        SourceKind::LyricsOvh => lyrics_ovh::generate(source.metadata_dir.as_deref()),
        SourceKind::MusicBrainz => musicbrainz::generate(source.metadata_dir.as_deref()),
        SourceKind::Generic => source.urls.clone(),
    };

    tracing::debug!("Generated {} URLs for source {}", urls.len(), key);
    urls
}

/// Metadata files of a corpus directory: `*.json` files whose name contains
/// `full`, sorted by file name
///
/// A missing or unreadable directory yields no files.
pub fn metadata_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("No metadata directory at {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.ends_with(".json") && name.contains("full"))
                .unwrap_or(false)
        })
        .collect();

    files.sort();
    files
}

/// Reads one metadata file; failures are logged and yield None
fn read_metadata<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str(&content) {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            tracing::warn!("Failed to parse {}: {}", path.display(), e);
            None
        }
    }
}

/// Form-encodes a path segment (`+` for spaces)
fn encode_segment(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
