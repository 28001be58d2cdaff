//! Target-specific variable settings.
//!
//! A target's settings form a chain of `(symbol, value)` nodes stored in a
//! shared pool. Before a target's actions run the chain is pushed: each
//! node's value is swapped into the global variable of the same name and
//! the variable's previous value is kept in the node. Popping performs the
//! very same swaps in the very same order, which puts every variable back.
//!
//! Invariant: between a push and its pop a node holds the value the
//! variable had before the push; otherwise it holds the target's setting.

use rjam_core::{List, VariableSwap};
use std::sync::atomic::{AtomicU32, Ordering};

// Pool ids start at 1; 0 marks a chain that was never stamped.
static NEXT_POOL_ID: AtomicU32 = AtomicU32::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeIdx(u32);

impl NodeIdx {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
struct SettingsNode {
    symbol: String,
    value: List,
    next: Option<NodeIdx>,
}

/// How `add` treats a symbol that is already in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetMode {
    /// Discard the old value (`VAR on target = value`).
    Replace,
    /// Concatenate after the old value (`VAR on target += value`).
    Append,
}

/// Handle on one settings chain inside a `SettingsPool`.
///
/// Not `Clone`: a chain is released exactly once, by value. A non-empty
/// chain is stamped with the pool that allocated it and may only be used
/// with that pool.
#[derive(Debug, Default, PartialEq, Eq)]
#[must_use]
pub struct Settings {
    head: Option<NodeIdx>,
    pool: u32,
}

impl Settings {
    /// The empty chain. It belongs to no pool.
    pub fn empty() -> Self {
        Self { head: None, pool: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }
}

/// Node storage for all settings chains, with a free list.
///
/// Chains are built and torn down once per target activation, so released
/// nodes are kept and handed out again instead of being reallocated.
#[derive(Debug)]
pub struct SettingsPool {
    id: u32,
    nodes: Vec<SettingsNode>,
    free: Option<NodeIdx>,
    free_len: usize,
}

impl SettingsPool {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            nodes: Vec::with_capacity(capacity),
            free: None,
            free_len: 0,
        }
    }

    fn chain(&self, head: Option<NodeIdx>) -> Settings {
        match head {
            Some(_) => Settings { head, pool: self.id },
            None => Settings::empty(),
        }
    }

    #[inline]
    fn check_owner(&self, chain: &Settings) {
        if chain.head.is_some() {
            debug_assert_eq!(chain.pool, self.id, "settings chain belongs to another pool");
        }
    }

    /// Add a deferred setting of `symbol` to `chain` and return the new head.
    ///
    /// A new symbol is prepended. An existing one is replaced or appended
    /// to according to `mode`.
    pub fn add(&mut self, chain: Settings, mode: SetMode, symbol: &str, value: List) -> Settings {
        debug_assert!(!symbol.is_empty(), "settings symbol must not be empty");

        if let Some(idx) = self.find(&chain, symbol) {
            let node = &mut self.nodes[idx.index()];
            node.value = match mode {
                SetMode::Append => std::mem::take(&mut node.value).append(value),
                SetMode::Replace => value,
            };
            return chain;
        }

        let idx = self.alloc(symbol, value, chain.head);
        self.chain(Some(idx))
    }

    /// Swap every setting into the global variables.
    pub fn push<V: VariableSwap + ?Sized>(&mut self, chain: &Settings, vars: &mut V) {
        self.swap_all(chain, vars);
    }

    /// Undo a `push` of the same chain.
    pub fn pop<V: VariableSwap + ?Sized>(&mut self, chain: &Settings, vars: &mut V) {
        self.swap_all(chain, vars);
    }

    /// Run `f` with `chain` pushed, popping it again afterwards.
    pub fn with_pushed<V, R>(&mut self, chain: &Settings, vars: &mut V, f: impl FnOnce(&mut V) -> R) -> R
    where
        V: VariableSwap + ?Sized,
    {
        self.push(chain, vars);
        let result = f(vars);
        self.pop(chain, vars);
        result
    }

    // Each swap is its own inverse, so push and pop are this one traversal.
    fn swap_all<V: VariableSwap + ?Sized>(&mut self, chain: &Settings, vars: &mut V) {
        self.check_owner(chain);
        let mut cursor = chain.head;
        while let Some(idx) = cursor {
            let node = &mut self.nodes[idx.index()];
            let value = std::mem::take(&mut node.value);
            node.value = vars.swap(&node.symbol, value);
            cursor = node.next;
        }
    }

    /// Release every node of `chain` onto the free list.
    pub fn release(&mut self, chain: Settings) {
        self.check_owner(&chain);
        let mut cursor = chain.head;
        let mut released = 0usize;
        while let Some(idx) = cursor {
            let node = &mut self.nodes[idx.index()];
            cursor = node.next;
            node.symbol.clear();
            node.value = List::new();
            node.next = self.free;
            self.free = Some(idx);
            released += 1;
        }
        self.free_len += released;
        if released > 0 {
            tracing::trace!(released, free = self.free_len, "settings released");
        }
    }

    /// An independent chain with the same symbols, values and order.
    pub fn copy(&mut self, chain: &Settings) -> Settings {
        let entries: Vec<(String, List)> = self
            .iter(chain)
            .map(|(symbol, value)| (symbol.to_owned(), value.clone()))
            .collect();

        let mut head = None;
        for (symbol, value) in entries.into_iter().rev() {
            head = Some(self.alloc(&symbol, value, head));
        }
        self.chain(head)
    }

    /// The value stored for `symbol`, if the chain sets it.
    pub fn value(&self, chain: &Settings, symbol: &str) -> Option<&List> {
        self.find(chain, symbol).map(|idx| &self.nodes[idx.index()].value)
    }

    /// Walk the chain in traversal order.
    pub fn iter<'a>(&'a self, chain: &Settings) -> SettingsIter<'a> {
        self.check_owner(chain);
        SettingsIter {
            pool: self,
            cursor: chain.head,
        }
    }

    pub fn chain_len(&self, chain: &Settings) -> usize {
        self.iter(chain).count()
    }

    /// Nodes waiting on the free list.
    pub fn free_len(&self) -> usize {
        self.free_len
    }

    /// Nodes ever allocated, live or free.
    pub fn allocated(&self) -> usize {
        self.nodes.len()
    }

    /// Discard all node storage and return how many free nodes were
    /// dropped. Any chain still held becomes invalid.
    pub fn drain(&mut self) -> usize {
        let drained = self.free_len;
        self.nodes = Vec::new();
        self.free = None;
        self.free_len = 0;
        drained
    }

    fn find(&self, chain: &Settings, symbol: &str) -> Option<NodeIdx> {
        self.check_owner(chain);
        let mut cursor = chain.head;
        while let Some(idx) = cursor {
            let node = &self.nodes[idx.index()];
            if node.symbol == symbol {
                return Some(idx);
            }
            cursor = node.next;
        }
        None
    }

    fn alloc(&mut self, symbol: &str, value: List, next: Option<NodeIdx>) -> NodeIdx {
        match self.free {
            Some(idx) => {
                let node = &mut self.nodes[idx.index()];
                self.free = node.next;
                self.free_len -= 1;
                node.symbol.push_str(symbol);
                node.value = value;
                node.next = next;
                idx
            }
            None => {
                let idx = NodeIdx(self.nodes.len() as u32);
                self.nodes.push(SettingsNode {
                    symbol: symbol.to_owned(),
                    value,
                    next,
                });
                idx
            }
        }
    }
}

impl Default for SettingsPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over `(symbol, value)` pairs of a chain.
pub struct SettingsIter<'a> {
    pool: &'a SettingsPool,
    cursor: Option<NodeIdx>,
}

impl<'a> Iterator for SettingsIter<'a> {
    type Item = (&'a str, &'a List);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor?;
        let node = &self.pool.nodes[idx.index()];
        self.cursor = node.next;
        Some((node.symbol.as_str(), &node.value))
    }
}
