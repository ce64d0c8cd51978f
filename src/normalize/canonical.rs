use crate::config::SourceKind;
use url::Url;

/// Reduces a URL to the key used to identify its document
///
/// - Lyrics.ovh URLs are kept exactly as generated
/// - MusicBrainz URLs drop query and fragment (`?fmt=json` does not identify
///   the recording)
/// - Everything else drops only the fragment
///
/// A URL that does not parse is returned unchanged.
///
/// # Examples
///
/// ```
/// use recrawl::config::SourceKind;
/// use recrawl::normalize::canonical_url;
///
/// let url = canonical_url("https://example.com/a?x=1#top", SourceKind::Generic);
/// assert_eq!(url, "https://example.com/a?x=1");
/// ```
pub fn canonical_url(raw: &str, kind: SourceKind) -> String {
    if kind == SourceKind::LyricsOvh {
        return raw.to_string();
    }

    let mut url = match Url::parse(raw) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("Keeping unparseable URL {} as is: {}", raw, e);
            return raw.to_string();
        }
    };

    url.set_fragment(None);
    if kind == SourceKind::MusicBrainz {
        url.set_query(None);
    }

    url.to_string()
}
