//! Ordered header field storage.
//!
//! Field names are kept exactly as received: `Content-Type` and
//! `content-type` are two distinct entries. Inserting an existing name
//! replaces its value in place.

use serde_json::{Map, Value};

/// Ordered mapping of header field name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, returning the previous value if the name existed.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.entries.iter().position(|(k, _)| k == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fields as a JSON object of strings.
    pub fn to_json(&self) -> Map<String, Value> {
        self.iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = HeaderMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut map = HeaderMap::new();
        map.insert("Host", "a");
        map.insert("Accept", "*/*");
        assert_eq!(map.insert("Host", "b"), Some("a".to_string()));

        let names: Vec<_> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["Host", "Accept"]);
        assert_eq!(map.get("Host"), Some("b"));
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut map = HeaderMap::new();
        map.insert("Content-Type", "text/html");
        map.insert("content-type", "text/plain");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("CONTENT-TYPE"), None);
    }

    #[test]
    fn test_remove() {
        let mut map: HeaderMap = [("A", "1"), ("B", "2")].into_iter().collect();
        assert_eq!(map.remove("A"), Some("1".to_string()));
        assert_eq!(map.remove("A"), None);
        assert_eq!(map.len(), 1);
    }
}
