//! Description merging for legacy short/long text pairs.

const PLACEHOLDERS: [&str; 2] = ["N/A", "N/A."];

/// Whether `text` carries no content once trimmed.
///
/// Empty strings and the `N/A` placeholders count as absent.
pub fn is_placeholder(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || PLACEHOLDERS.contains(&trimmed)
}

fn present(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|trimmed| !is_placeholder(trimmed))
}

/// Collapse a short/long description pair into one field.
///
/// Both absent gives `""`; one absent gives the other, trimmed; identical
/// values collapse; otherwise `short + "\n\n" + long`.
pub fn merge_descriptions(short: Option<&str>, long: Option<&str>) -> String {
    match (present(short), present(long)) {
        (None, None) => String::new(),
        (Some(only), None) | (None, Some(only)) => only.to_string(),
        (Some(short), Some(long)) if short == long => short.to_string(),
        (Some(short), Some(long)) => format!("{short}\n\n{long}"),
    }
}
