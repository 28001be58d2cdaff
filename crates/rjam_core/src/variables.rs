//! The global build-variable store.
//!
//! Target-specific settings are applied by exchanging values with this
//! store, so the only operation the settings stack needs is `swap`.

use crate::collections::FxMap;
use crate::list::List;

/// Atomic exchange of a named variable's value.
pub trait VariableSwap {
    /// Install `value` as the value of `name` and return the value it
    /// replaced. An unset variable yields the empty list.
    fn swap(&mut self, name: &str, value: List) -> List;
}

/// A string-keyed table of global variables.
#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    vars: FxMap<String, List>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `name`, or `None` if it was never set.
    pub fn get(&self, name: &str) -> Option<&List> {
        self.vars.get(name)
    }

    /// Current value of `name`, treating unset as empty.
    pub fn value(&self, name: &str) -> List {
        self.vars.get(name).cloned().unwrap_or_default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: List) {
        self.vars.insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl VariableSwap for VariableTable {
    fn swap(&mut self, name: &str, value: List) -> List {
        tracing::trace!(var = name, "swap");
        match self.vars.get_mut(name) {
            Some(slot) => std::mem::replace(slot, value),
            None => {
                self.vars.insert(name.to_owned(), value);
                List::new()
            }
        }
    }
}
