//! Route normalization shared with `hippoforge-parsers::normalize_client_api_call`
//! (same algorithm, kept independent here so the graph crate doesn't need to
//! import the client-side extraction regexes, only the rule itself): strip
//! trailing `/`, drop the query string, replace numeric or UUID path
//! segments with `:id` (§4.4).

use once_cell::sync::Lazy;
use regex::Regex;

static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());
static UUID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap()
});

pub fn normalize_route(route: &str) -> String {
    let without_query = route.split('?').next().unwrap_or(route);
    let trimmed = without_query.trim_end_matches('/');
    trimmed
        .split('/')
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_slash_and_numeric_id() {
        assert_eq!(normalize_route("/api/users/123/"), "/api/users/:id");
    }

    #[test]
    fn drops_query_string() {
        assert_eq!(normalize_route("/api/users?page=1"), "/api/users");
    }

    #[test]
    fn replaces_uuid_segment() {
        assert_eq!(
            normalize_route("/api/users/6fa459ea-ee8a-3ca4-894e-db77e160355e"),
            "/api/users/:id"
        );
    }
}
