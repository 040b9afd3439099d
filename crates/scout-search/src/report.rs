use crate::provider::SearchHit;
use std::fmt::Write;

/// Render hits as a numbered plain-text report.
pub fn format_results(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No results found for \"{query}\".");
    }

    let mut out = format!("Search results for \"{query}\":\n");
    for (i, hit) in hits.iter().enumerate() {
        let _ = write!(
            out,
            "\n{}. {}\n   Link: {}\n   Snippet: {}\n",
            i + 1,
            hit.title,
            hit.link,
            hit.snippet
        );
    }
    out
}
