//! Ordered header list
//!
//! `http::HeaderMap` groups values by name, which loses the order callers
//! added them in. Requests keep headers in a `HeaderList` instead and only
//! convert to a `HeaderMap` when handed to the transport.

use http::{HeaderMap, HeaderName, HeaderValue};

use crate::error::{self, Result};

/// Headers in insertion order with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderList {
    entries: Vec<(HeaderName, HeaderValue)>,
}

impl HeaderList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from string pairs, later entries replacing earlier ones of the same name.
    ///
    /// # Errors
    ///
    /// Fails with an invalid-request error when a name or value is not valid on the wire.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut headers = Self::new();
        for (name, value) in pairs {
            headers.try_set(name.as_ref(), value.as_ref())?;
        }
        Ok(headers)
    }

    #[must_use]
    pub fn get<N: AsRef<str>>(&self, name: N) -> Option<&HeaderValue> {
        let name = name.as_ref();
        self.entries
            .iter()
            .find(|(existing, _)| existing.as_str().eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// The first value for `name` as a string, if it is visible ASCII.
    #[must_use]
    pub fn get_str<N: AsRef<str>>(&self, name: N) -> Option<&str> {
        self.get(name).and_then(|value| value.to_str().ok())
    }

    #[must_use]
    pub fn contains<N: AsRef<str>>(&self, name: N) -> bool {
        self.get(name).is_some()
    }

    /// Replace the value for `name`, keeping its original position.
    ///
    /// Duplicate entries for the same name are dropped. A new name goes last.
    pub fn set(&mut self, name: HeaderName, value: HeaderValue) {
        match self.entries.iter().position(|(existing, _)| *existing == name) {
            Some(index) => {
                self.entries[index].1 = value;
                let mut seen = 0usize;
                self.entries.retain(|(existing, _)| {
                    if *existing == name {
                        seen += 1;
                        seen == 1
                    } else {
                        true
                    }
                });
            }
            None => self.entries.push((name, value)),
        }
    }

    /// [`HeaderList::set`] from strings.
    ///
    /// # Errors
    ///
    /// Fails with an invalid-request error when `name` or `value` is not valid on the wire.
    pub fn try_set(&mut self, name: &str, value: &str) -> Result<()> {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| error::invalid_header(format!("invalid header name `{name}`")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|_| error::invalid_header(format!("invalid value for header `{name}`")))?;
        self.set(header_name, header_value);
        Ok(())
    }

    /// Add an entry without replacing existing ones of the same name.
    pub fn append(&mut self, name: HeaderName, value: HeaderValue) {
        self.entries.push((name, value));
    }

    /// Remove every entry for `name`; returns whether anything was removed.
    pub fn remove<N: AsRef<str>>(&mut self, name: N) -> bool {
        let name = name.as_ref();
        let before = self.entries.len();
        self.entries
            .retain(|(existing, _)| !existing.as_str().eq_ignore_ascii_case(name));
        self.entries.len() != before
    }

    /// Copy every entry of `other` over `self` with [`HeaderList::set`].
    pub fn extend_from(&mut self, other: &HeaderList) {
        for (name, value) in other {
            self.set(name.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.entries.iter().map(|(name, value)| (name, value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn to_header_map(&self) -> HeaderMap {
        let mut map = HeaderMap::with_capacity(self.entries.len());
        for (name, value) in &self.entries {
            map.append(name.clone(), value.clone());
        }
        map
    }
}

impl<'a> IntoIterator for &'a HeaderList {
    type Item = (&'a HeaderName, &'a HeaderValue);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (HeaderName, HeaderValue)>,
        fn(&'a (HeaderName, HeaderValue)) -> (&'a HeaderName, &'a HeaderValue),
    >;

    fn into_iter(self) -> Self::IntoIter {
        fn split(entry: &(HeaderName, HeaderValue)) -> (&HeaderName, &HeaderValue) {
            (&entry.0, &entry.1)
        }
        self.entries.iter().map(split as fn(_) -> _)
    }
}
