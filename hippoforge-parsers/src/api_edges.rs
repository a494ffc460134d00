//! Client-side API-call extraction from §4.3: read the first string
//! argument of `fetch(...)` or `axios.{get,post,...}(...)` whose value
//! starts with `/api`.

use once_cell::sync::Lazy;
use regex::Regex;

static FETCH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"fetch\(\s*["'](?P<url>/api[^"']*)["']"#).unwrap());
static AXIOS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"axios\.(get|post|put|delete|patch)\(\s*["'](?P<url>/api[^"']*)["']"#).unwrap()
});

pub fn extract_client_api_calls(body: &str) -> Vec<String> {
    let mut calls = Vec::new();
    for caps in FETCH_RE.captures_iter(body) {
        calls.push(caps["url"].to_string());
    }
    for caps in AXIOS_RE.captures_iter(body) {
        calls.push(caps["url"].to_string());
    }
    calls
}

/// Route normalization shared with the knowledge graph (C4): the
/// canonical form a client call is looked up by is computed once here
/// and re-applied by `hippoforge-knowledge-graph` at retrieval time, so
/// both sides agree on the same rules without duplicating the regexes.
pub fn normalize_client_api_call(url: &str) -> String {
    hippoforge_route_normalization::normalize(url)
}

mod hippoforge_route_normalization {
    use once_cell::sync::Lazy;
    use regex::Regex;

    static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());
    static UUID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$",
        )
        .unwrap()
    });

    /// Strip trailing `/`, drop the query string, replace numeric and
    /// UUID path segments with `:id` — the exact algorithm from
    /// `hipporag_retriever.py::_normalize_route`.
    pub fn normalize(route: &str) -> String {
        let without_query = route.split('?').next().unwrap_or(route);
        let trimmed = without_query.trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').collect();
        segments
            .into_iter()
            .map(|segment| {
                if NUMERIC_SEGMENT.is_match(segment) || UUID_SEGMENT.is_match(segment) {
                    ":id"
                } else {
                    segment
                }
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_fetch_and_axios_api_urls() {
        let body = r#"fetch('/api/users/123'); axios.post("/api/comments");"#;
        let calls = extract_client_api_calls(body);
        assert_eq!(calls, vec!["/api/users/123".to_string(), "/api/comments".to_string()]);
    }

    #[test]
    fn normalize_client_api_call_matches_route_normalization() {
        assert_eq!(normalize_client_api_call("/api/users/123/"), "/api/users/:id");
    }
}
