//! The React/Next heuristic from §4.3: a function is typed `component`
//! iff its name starts with uppercase AND its body contains a JSX
//! element; `renders` lists distinct uppercase JSX tag names; `hooks`
//! lists identifiers matching `use[A-Z]*`.

use once_cell::sync::Lazy;
use regex::Regex;

static JSX_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<([A-Z][A-Za-z0-9]*)[\s/>]").unwrap());
static HOOK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\buse[A-Z][A-Za-z0-9]*\b").unwrap());

pub fn is_component(name: &str, body: &str) -> bool {
    starts_with_uppercase(name) && JSX_TAG_RE.is_match(body)
}

pub fn rendered_components(body: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut tags = Vec::new();
    for caps in JSX_TAG_RE.captures_iter(body) {
        let tag = caps[1].to_string();
        if seen.insert(tag.clone()) {
            tags.push(tag);
        }
    }
    tags
}

pub fn hooks_used(body: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut hooks = Vec::new();
    for m in HOOK_RE.find_iter(body) {
        let hook = m.as_str().to_string();
        if seen.insert(hook.clone()) {
            hooks.push(hook);
        }
    }
    hooks
}

fn starts_with_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}
