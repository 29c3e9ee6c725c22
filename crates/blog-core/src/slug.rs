//! URL-safe slugs for tag labels.

/// Convert a label to a slug: lowercase alphanumerics joined by single dashes.
///
/// Non-ASCII letters are kept, so Cyrillic labels produce Cyrillic slugs.
pub fn slugify(label: &str) -> String {
    label
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
