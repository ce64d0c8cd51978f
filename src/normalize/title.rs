use crate::config::SourceKind;
use crate::storage::MAX_TITLE_CHARS;

/// Scans a title out of a document body
///
/// Tried in order:
///
/// 1. the text between the first `<title>` and the following `</title>`
/// 2. for Lyrics.ovh, the first `<h1>` element; for MusicBrainz, the text
///    after the first tag carrying `class="title"` up to the next `<`
/// 3. `"Document from {source_name}"`
///
/// An empty match falls through to the next step. The result is cut to
/// [`MAX_TITLE_CHARS`] characters.
pub fn extract_title(body: &str, kind: SourceKind, source_name: &str) -> String {
    let found = between(body, "<title>", "</title>").or_else(|| match kind {
        SourceKind::LyricsOvh => between(body, "<h1>", "</h1>"),
        SourceKind::MusicBrainz => title_class_text(body),
        SourceKind::Generic => None,
    });

    match found {
        Some(title) => truncate_chars(title, MAX_TITLE_CHARS),
        None => placeholder_title(source_name),
    }
}

/// Title used when the body offers none
pub fn placeholder_title(source_name: &str) -> String {
    truncate_chars(&format!("Document from {}", source_name), MAX_TITLE_CHARS)
}

/// Trimmed text between `open` and the next `close`; None if either is missing
fn between<'a>(body: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = body.find(open)? + open.len();
    let len = body[start..].find(close)?;
    non_empty(&body[start..start + len])
}

/// Text of the first element tagged `class="title"`
fn title_class_text(body: &str) -> Option<&str> {
    let marker = body.find(r#"class="title""#)?;
    let start = marker + body[marker..].find('>')? + 1;
    let end = body[start..]
        .find('<')
        .map(|len| start + len)
        .unwrap_or(body.len());
    non_empty(&body[start..end])
}

fn non_empty(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
