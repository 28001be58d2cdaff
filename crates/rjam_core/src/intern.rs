//! Name interning for rule, target and module names.
//!
//! Rule and target tables are keyed by interned names so that lookups
//! compare integer handles instead of strings.

use lasso::{Spur, ThreadedRodeo};
use std::fmt;
use std::sync::Arc;

/// An interned name. This is a lightweight handle (u32) that can be used
/// to look up the actual string content.
///
/// Comparing two `Name` values is an O(1) integer comparison.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Name(Spur);

impl Name {
    /// Create from a raw lasso key.
    #[inline]
    pub fn from_spur(spur: Spur) -> Self {
        Self(spur)
    }

    /// Get the raw lasso key.
    #[inline]
    pub fn as_spur(self) -> Spur {
        self.0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.0)
    }
}

/// Shared name interner.
///
/// Stores one copy of each unique name and returns lightweight handles.
/// Cloning is cheap and yields a handle onto the same storage, so the
/// parser and the registries can agree on names without copying strings.
#[derive(Clone)]
pub struct NameInterner {
    rodeo: Arc<ThreadedRodeo>,
}

impl NameInterner {
    pub fn new() -> Self {
        Self {
            rodeo: Arc::new(ThreadedRodeo::new()),
        }
    }

    /// Intern a name, returning the existing handle if it was seen before.
    #[inline]
    pub fn intern(&self, s: &str) -> Name {
        Name::from_spur(self.rodeo.get_or_intern(s))
    }

    /// Intern a static name. More efficient than `intern` for literals.
    #[inline]
    pub fn intern_static(&self, s: &'static str) -> Name {
        Name::from_spur(self.rodeo.get_or_intern_static(s))
    }

    /// Look up an already-interned name without interning it if absent.
    #[inline]
    pub fn get(&self, s: &str) -> Option<Name> {
        self.rodeo.get(s).map(Name::from_spur)
    }

    /// Resolve a handle back to its string content.
    #[inline]
    pub fn resolve(&self, name: Name) -> &str {
        self.rodeo.resolve(&name.as_spur())
    }

    /// Concatenate two interned names with no separator and intern the
    /// result.
    pub fn concat(&self, prefix: Name, suffix: Name) -> Name {
        let prefix = self.resolve(prefix);
        let suffix = self.resolve(suffix);
        let mut joined = String::with_capacity(prefix.len() + suffix.len());
        joined.push_str(prefix);
        joined.push_str(suffix);
        self.intern(&joined)
    }

    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

impl Default for NameInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NameInterner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameInterner")
            .field("len", &self.len())
            .finish()
    }
}
