//! Free-text search helpers.
//!
//! Lives in `core` so the repository layer and handlers agree on what
//! counts as an empty query before any SQL is built.

/// Text search configuration for queries. Must match the regconfig of the
/// generated `videos.search_vector` column.
pub const TEXT_SEARCH_CONFIG: &str = "english";

/// Split user input into terms that are safe to splice into a `tsquery`.
///
/// Any character other than alphanumerics and `_` acts as a separator, so
/// tsquery operators (`&`, `|`, `!`, `:`, parentheses) can never reach the
/// parser. Returns `None` when nothing usable remains.
fn sanitize_terms(query: &str) -> Option<Vec<&str>> {
    let terms: Vec<&str> = query
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| !t.is_empty())
        .collect();

    if terms.is_empty() { None } else { Some(terms) }
}

/// Convert user input into a PostgreSQL `tsquery` that matches rows
/// containing *any* of the terms.
///
/// Rows matching more terms rank higher under `ts_rank`, so relevance
/// ordering still favours the closest matches.
///
/// # Examples
///
/// ```
/// use vidfeed_core::search::build_tsquery;
/// assert_eq!(build_tsquery("funny cats"), Some("funny | cats".to_string()));
/// assert_eq!(build_tsquery("  "), None);
/// ```
pub fn build_tsquery(query: &str) -> Option<String> {
    sanitize_terms(query).map(|terms| terms.join(" | "))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
