//! Ordered string lists, the value type of every build variable.

use std::fmt;

/// An ordered sequence of strings.
///
/// Variable values, bind lists and argument groups are all lists. The
/// empty list is the value of an unset variable.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct List {
    items: Vec<String>,
}

impl List {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append a single string.
    pub fn push(&mut self, item: impl Into<String>) {
        self.items.push(item.into());
    }

    /// Concatenate `other` onto the end of this list, keeping existing
    /// items first.
    pub fn append(mut self, other: List) -> List {
        if self.items.is_empty() {
            return other;
        }
        self.items.extend(other.items);
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn first(&self) -> Option<&str> {
        self.items.first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    /// Drop every item, keeping the allocation for reuse.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<S: Into<String>> FromIterator<S> for List {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for List {
    fn from(items: [S; N]) -> Self {
        items.into_iter().collect()
    }
}

impl From<Vec<String>> for List {
    fn from(items: Vec<String>) -> Self {
        Self { items }
    }
}

impl IntoIterator for List {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.items).finish()
    }
}

impl fmt::Display for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(item)?;
        }
        Ok(())
    }
}
