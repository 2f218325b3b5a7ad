use uuid::Uuid;

use super::kind::BlobCategory;

/// Generate a fresh object key: `{category}/{uuid}.{ext}`.
///
/// The extension comes from the MIME type and is omitted when unknown.
pub fn object_key(category: BlobCategory, mime_type: &str) -> String {
    let id = Uuid::now_v7();
    match preferred_extension(mime_type) {
        Some(ext) => format!("{category}/{id}.{ext}"),
        None => format!("{category}/{id}"),
    }
}

fn preferred_extension(mime_type: &str) -> Option<&'static str> {
    let exts = mime_guess::get_mime_extensions_str(mime_type)?;
    // mime_guess lists extensions alphabetically, which puts oddities like
    // "jpe" first.
    let essence = mime_type.rsplit('/').next().unwrap_or_default();
    exts.iter()
        .copied()
        .find(|ext| *ext == essence)
        .or_else(|| exts.first().copied())
}

/// Recover the object key from a public URL produced with `public_url`.
///
/// Returns `None` for URLs outside the prefix and for keys that could escape
/// the storage root.
pub fn key_from_url<'a>(public_url: &str, url: &'a str) -> Option<&'a str> {
    let prefix = public_url.trim_end_matches('/');
    let key = url.strip_prefix(prefix)?.strip_prefix('/')?;
    let key = key.split(['?', '#']).next().unwrap_or_default();
    if key.is_empty()
        || key.contains('\\')
        || key.contains('\0')
        || key.split('/').any(|part| part.is_empty() || part == "." || part == "..")
    {
        return None;
    }
    Some(key)
}
