//! URL templates rendered by the server with `0` placeholder segments
//!
//! The markup carries URLs such as `/api/group/0/role/0`. Every path segment
//! that is exactly `0` is a slot, filled left to right.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Path segment that marks a slot
pub const PLACEHOLDER: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of slots in the path
    pub fn placeholders(&self) -> usize {
        let (path, _) = split_path(&self.0);
        path.split('/').filter(|segment| *segment == PLACEHOLDER).count()
    }

    /// Fill slots left to right with percent-encoded values.
    ///
    /// Surplus values are ignored and unfilled slots stay as they are.
    pub fn fill<S: AsRef<str>>(&self, values: &[S]) -> String {
        let (path, rest) = split_path(&self.0);
        let mut values = values.iter();

        let filled = path
            .split('/')
            .map(|segment| {
                if segment == PLACEHOLDER {
                    if let Some(value) = values.next() {
                        return urlencoding::encode(value.as_ref()).into_owned();
                    }
                }
                segment.to_string()
            })
            .collect::<Vec<_>>()
            .join("/");

        format!("{}{}", filled, rest)
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UrlTemplate {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for UrlTemplate {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

fn split_path(url: &str) -> (&str, &str) {
    match url.find(['?', '#']) {
        Some(index) => url.split_at(index),
        None => (url, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_left_to_right() {
        let template = UrlTemplate::new("/api/group/0/role/0");
        assert_eq!(template.placeholders(), 2);
        assert_eq!(template.fill(&["7", "3"]), "/api/group/7/role/3");
    }

    #[test]
    fn test_fill_only_whole_segments() {
        let template = UrlTemplate::new("/api/zones/10.in-addr.arpa/records/0");
        assert_eq!(template.placeholders(), 1);
        assert_eq!(
            template.fill(&["www"]),
            "/api/zones/10.in-addr.arpa/records/www"
        );
    }

    #[test]
    fn test_fill_encodes_values() {
        let template = UrlTemplate::new("/api/zones/example.com/records/0");
        assert_eq!(
            template.fill(&["a b/c"]),
            "/api/zones/example.com/records/a%20b%2Fc"
        );
    }

    #[test]
    fn test_fill_keeps_query_and_unfilled_slots() {
        let template = UrlTemplate::new("/api/group/0/user/0?browser=0");
        assert_eq!(template.fill(&["4"]), "/api/group/4/user/0?browser=0");
    }

    #[test]
    fn test_fill_without_placeholder_is_identity() {
        let template = UrlTemplate::new("http://localhost:5000/api/user");
        assert_eq!(template.placeholders(), 0);
        assert_eq!(template.fill(&["bob"]), "http://localhost:5000/api/user");
    }
}
