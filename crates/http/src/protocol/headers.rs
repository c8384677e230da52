//! Case-insensitive header collection.
//!
//! Names are stored lower-cased and entries keep their first-insertion order, which is
//! also the order [`Headers::iter`] yields and the order the response encoder writes.
//! Incremental parsing of header lines lives in the codec module, see [`Headers::parse`].

use std::fmt;

/// A case-insensitive mapping from field name to field value.
///
/// Setting a name twice folds the values into one comma separated list, the way
/// RFC 9110 allows a repeated field to be combined.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `name`, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|index| self.entries[index].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Inserts `value` under `name`, or appends it to the existing value joined by `", "`.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.position(name) {
            Some(index) => {
                let existing = &mut self.entries[index].1;
                existing.push_str(", ");
                existing.push_str(value);
            }
            None => self.entries.push((name.to_ascii_lowercase(), value.to_string())),
        }
    }

    /// Overwrites the value stored under `name`, inserting it if absent.
    pub fn replace(&mut self, name: &str, value: &str) {
        match self.position(name) {
            Some(index) => self.entries[index].1 = value.to_string(),
            None => self.entries.push((name.to_ascii_lowercase(), value.to_string())),
        }
    }

    /// Removes `name`, returning its value if it was present.
    pub fn delete(&mut self, name: &str) -> Option<String> {
        self.position(name).map(|index| self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(key, _)| key.eq_ignore_ascii_case(name))
    }
}

impl fmt::Debug for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// The headers a plain response usually starts from: a fixed `content-length`,
/// `connection: close` since every connection serves one request, and a text content type.
pub fn default_headers(content_length: usize) -> Headers {
    let mut headers = Headers::new();
    headers.set(http::header::CONTENT_LENGTH.as_str(), &content_length.to_string());
    headers.set(http::header::CONNECTION.as_str(), "close");
    headers.set(http::header::CONTENT_TYPE.as_str(), mime::TEXT_PLAIN.as_ref());
    headers
}
