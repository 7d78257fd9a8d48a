//! Response content-type negotiation.
//!
//! Rules are applied in order; every rule that finds its header overrides
//! the value chosen so far, so later rules win.

use crate::http::header_map::HeaderMap;

pub const DEFAULT_CONTENT_TYPE: &str = "text/json";

/// A single negotiation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Use the field's value verbatim.
    Field(&'static str),
    /// Use the first comma-separated token of the field.
    FirstToken(&'static str),
}

impl Rule {
    fn apply(self, fields: &HeaderMap) -> Option<String> {
        match self {
            Rule::Field(name) => fields.get(name).map(str::to_string),
            Rule::FirstToken(name) => fields
                .get(name)
                .and_then(|value| value.split(',').next())
                .map(|token| token.trim().to_string()),
        }
    }
}

/// Precedence, lowest first.
pub const RULES: [Rule; 3] = [
    Rule::Field("Content-Type"),
    Rule::Field("content-type"),
    Rule::FirstToken("Accept"),
];

/// Content type for the response to a request carrying `fields`.
pub fn negotiate(fields: &HeaderMap) -> String {
    RULES
        .iter()
        .fold(DEFAULT_CONTENT_TYPE.to_string(), |chosen, rule| {
            rule.apply(fields).unwrap_or(chosen)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_map(pairs: &[(&str, &str)]) -> HeaderMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_default() {
        assert_eq!(negotiate(&HeaderMap::new()), "text/json");
    }

    #[test]
    fn test_accept_wins_over_content_type() {
        let fields = header_map(&[
            ("Content-Type", "application/json"),
            ("Accept", "application/json"),
        ]);
        assert_eq!(negotiate(&fields), "application/json");

        let fields = header_map(&[
            ("Content-Type", "application/x-www-form-urlencoded"),
            ("Accept", "text/html, application/xhtml+xml;q=0.9"),
        ]);
        assert_eq!(negotiate(&fields), "text/html");
    }

    #[test]
    fn test_lowercase_content_type_overrides() {
        let fields = header_map(&[("Content-Type", "text/plain"), ("content-type", "text/csv")]);
        assert_eq!(negotiate(&fields), "text/csv");
    }
}
