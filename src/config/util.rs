//! Configuration utility functions.

/// Environment variable holding a comma-separated domain list.
pub const DOMAIN_ENV: &str = "DOMAIN_NAMES";

/// Split a comma-separated domain list.
///
/// Items are trimmed, empty items dropped, order kept.
///
/// # Examples
/// ```ignore
/// parse_domain_list("a.com,b.com")     -> ["a.com", "b.com"]
/// parse_domain_list(" a.com , ,b.com") -> ["a.com", "b.com"]
/// parse_domain_list("")                -> []
/// ```
pub fn parse_domain_list(raw: &str) -> Vec<String> {
    normalize_domains(raw.split(','))
}

/// Trim every domain and drop the empty ones.
pub fn normalize_domains<'a>(domains: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    domains
        .into_iter()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_owned)
        .collect()
}
