//! Deterministic storage keys.
//!
//! A key is the plain concatenation
//! `<origin><path><query><target id><field name>[<prefix>]`. There is no
//! separator and no versioning: the same page, form, and field always map to
//! the same key, which is what lets a later page load find an earlier save
//! and lets release find it again. The fragment never participates, so
//! in-page anchors share drafts.

use std::fmt;

#[cfg(test)]
#[path = "key_test.rs"]
mod key_test;

/// The page identity that scopes every key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLocation {
    origin: String,
    path: String,
    query: String,
}

impl PageLocation {
    /// Build from already-split parts, as exposed by `window.location`.
    ///
    /// `query` is the search string including its leading `?`, or empty.
    #[must_use]
    pub fn new(origin: impl Into<String>, path: impl Into<String>, query: impl Into<String>) -> Self {
        let query = query.into();
        Self {
            origin: origin.into(),
            path: path.into(),
            query: if query == "?" { String::new() } else { query },
        }
    }

    /// Split an absolute or path-only href, discarding any fragment.
    ///
    /// An absolute URL with no path gets `/`, matching what browsers report
    /// for `location.pathname`.
    #[must_use]
    pub fn parse(href: &str) -> Self {
        let without_fragment = href.split_once('#').map_or(href, |(head, _)| head);
        let (rest, query) = match without_fragment.find('?') {
            Some(at) => without_fragment.split_at(at),
            None => (without_fragment, ""),
        };

        let Some(scheme_end) = rest.find("://") else {
            return Self::new("", rest, query);
        };
        let authority_start = scheme_end + 3;
        match rest[authority_start..].find('/') {
            Some(slash) => {
                let (origin, path) = rest.split_at(authority_start + slash);
                Self::new(origin, path, query)
            }
            None => Self::new(rest, "/", query),
        }
    }

    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// `<origin><path><query>`, the page part of every key.
    #[must_use]
    pub fn page_identity(&self) -> String {
        format!("{}{}{}", self.origin, self.path, self.query)
    }
}

/// A derived storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageKey(String);

impl StorageKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derive the key for one field of one form on one page.
///
/// Pure: identical inputs always yield identical keys. Pass an empty
/// `prefix` for the prefix-less form used by release.
#[must_use]
pub fn build_key(location: &PageLocation, target_id: &str, field_name: &str, prefix: &str) -> StorageKey {
    let mut key = String::with_capacity(
        location.origin.len()
            + location.path.len()
            + location.query.len()
            + target_id.len()
            + field_name.len()
            + prefix.len(),
    );
    key.push_str(&location.origin);
    key.push_str(&location.path);
    key.push_str(&location.query);
    key.push_str(target_id);
    key.push_str(field_name);
    key.push_str(prefix);
    StorageKey(key)
}
