/// Canonical form of a page name, used for cache keys, routes and link
/// comparison.
///
/// Underscores become spaces, whitespace runs collapse to one space and the
/// first character is upper-cased. Only the first letter of a title is
/// case-insensitive on MediaWiki, so the rest is left untouched.
pub fn canonical_name(raw: &str) -> String {
    let spaced = raw.replace('_', " ");
    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// URL path form of a page name (`Apple Inc.` -> `Apple_Inc.`).
pub fn page_slug(name: &str) -> String {
    canonical_name(name).replace(' ', "_")
}
