//! `Link` header pagination as used by the Canvas API.

use reqwest::header::{HeaderMap, LINK};

/// URL of the next page, if the response has one
pub fn next_page(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(next_link)
        .map(str::to_string)
}

/// Find the `rel="next"` target in a Link header value.
///
/// Canvas sends `<https://...&page=2>; rel="next", <https://...&page=1>; rel="first"`.
pub fn next_link(value: &str) -> Option<&str> {
    value.split(',').find_map(|entry| {
        let (target, params) = entry.trim().split_once(';')?;
        let url = target.trim().strip_prefix('<')?.strip_suffix('>')?;

        let is_next = params.split(';').any(|param| {
            param
                .trim()
                .strip_prefix("rel=")
                .map(|rel| rel.trim_matches('"'))
                .is_some_and(|rel| rel.split_whitespace().any(|r| r == "next"))
        });

        is_next.then_some(url)
    })
}
