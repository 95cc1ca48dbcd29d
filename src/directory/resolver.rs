use super::domain::CategoryRef;

/// Split newline-delimited skill text into discrete skill names: trimmed,
/// blank lines dropped, duplicates preserved (registrants sometimes list the
/// same skill under several categories on purpose).
pub fn split_skills(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Requested slugs that did not resolve to a category. These are dropped from
/// the registration rather than erroring, but adapters log them at WARN so
/// typos stay visible.
pub fn dropped_slugs(requested: &[String], resolved: &[CategoryRef]) -> Vec<String> {
    requested
        .iter()
        .filter(|slug| !resolved.iter().any(|category| &category.slug == *slug))
        .cloned()
        .collect()
}
