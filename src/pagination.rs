//! Page envelope returned by list endpoints.

use serde::{Deserialize, Serialize};

/// One page of a list response.
///
/// `next` and `prev` hold follow-up page URLs, or `None` at the ends of
/// the list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    /// The items on this page.
    #[serde(default = "Vec::new")]
    pub objects: Vec<T>,
    /// URL of the following page.
    #[serde(default)]
    pub next: Option<String>,
    /// URL of the preceding page.
    #[serde(default)]
    pub prev: Option<String>,
}

impl<T> Page<T> {
    /// Create a new page from items and links.
    #[must_use]
    pub fn new(objects: Vec<T>, next: Option<String>, prev: Option<String>) -> Self {
        Self {
            objects,
            next,
            prev,
        }
    }

    /// Whether a following page exists.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Whether a preceding page exists.
    #[must_use]
    pub fn has_prev(&self) -> bool {
        self.prev.is_some()
    }

    /// Map the items to a different type.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            objects: self.objects.into_iter().map(f).collect(),
            next: self.next,
            prev: self.prev,
        }
    }

    /// Returns true if this page has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Returns the number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns an iterator over the items in this page.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.objects.iter()
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.iter()
    }
}
