//! Ordered, case-insensitive request header multi-map.
//!
//! # Design Decisions
//! - Names are stored as received; lookups compare ASCII case-insensitively
//! - Entries keep first-insertion order, which is what diagnostics render
//! - `set` replaces values in place so a re-set header keeps its position

use axum::http::HeaderMap;

/// A single header field and every value received for it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HeaderEntry {
    name: String,
    values: Vec<String>,
}

/// Request headers in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<HeaderEntry>,
}

impl HeaderSet {
    /// Create an empty header set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all values of `name` with a single value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx].values = vec![value],
            None => self.entries.push(HeaderEntry {
                name,
                values: vec![value],
            }),
        }
    }

    /// Append a value to `name`, creating the entry if needed.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx].values.push(value),
            None => self.entries.push(HeaderEntry {
                name,
                values: vec![value],
            }),
        }
    }

    /// Insert a field with no values. Only diagnostics ever see it.
    pub fn add_empty(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.position(&name).is_none() {
            self.entries.push(HeaderEntry {
                name,
                values: Vec::new(),
            });
        }
    }

    /// First value of `name`, if any.
    pub fn get_first(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    /// Every value of `name`, in arrival order.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.position(name)
            .map(|idx| self.entries[idx].values.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Iterate `(name, values)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|e| (e.name.as_str(), e.values.as_slice()))
    }

    /// Number of distinct field names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.name.eq_ignore_ascii_case(name))
    }
}

impl From<&HeaderMap> for HeaderSet {
    /// Non-UTF-8 bytes are replaced rather than dropped so logging still sees the field.
    fn from(map: &HeaderMap) -> Self {
        let mut set = HeaderSet::new();
        for (name, value) in map.iter() {
            set.add(
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }
        set
    }
}

/// Render a field name with the first letter of every hyphen-separated
/// segment upper-cased and the rest lower-cased.
pub fn canonical_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut start_of_segment = true;
    for ch in name.chars() {
        if start_of_segment {
            out.extend(ch.to_uppercase());
        } else {
            out.extend(ch.to_lowercase());
        }
        start_of_segment = ch == '-';
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        let mut headers = HeaderSet::new();
        headers.set("Accept-Encoding", "gzip");
        assert_eq!(headers.get_first("accept-encoding"), Some("gzip"));
        assert!(headers.contains("ACCEPT-ENCODING"));
        assert_eq!(headers.get_first("host"), None);
    }

    #[test]
    fn set_keeps_position_and_replaces_values() {
        let mut headers = HeaderSet::new();
        headers.add("a", "1");
        headers.add("b", "2");
        headers.add("A", "3");
        assert_eq!(headers.get_all("a"), ["1", "3"]);

        headers.set("a", "9");
        let names: Vec<_> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(headers.get_all("a"), ["9"]);
    }

    #[test]
    fn canonical_names() {
        assert_eq!(canonical_name("a"), "A");
        assert_eq!(canonical_name("accept-encoding"), "Accept-Encoding");
        assert_eq!(canonical_name("IF-MODIFIED-SINCE"), "If-Modified-Since");
        assert_eq!(canonical_name("x--y"), "X--Y");
        assert_eq!(canonical_name(""), "");
    }

    #[test]
    fn from_header_map() {
        let mut map = HeaderMap::new();
        map.insert("host", "example.com".parse().unwrap());
        map.append("accept", "text/html".parse().unwrap());
        map.append("accept", "text/plain".parse().unwrap());

        let set = HeaderSet::from(&map);
        assert_eq!(set.get_first("Host"), Some("example.com"));
        assert_eq!(set.get_all("Accept"), ["text/html", "text/plain"]);
    }
}
