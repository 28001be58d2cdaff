//! Reference-counted rule payloads.
//!
//! Argument lists and rule actions are built once and then shared between
//! a rule's local entry and its mirror in the root module. Neither is ever
//! edited in place: a rule slot is repointed by retaining the incoming
//! payload before releasing the outgoing one.

use rjam_core::List;
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

/// A counted shared handle.
///
/// `retain` takes another reference and `release` gives one up; the
/// payload and everything it owns are freed exactly when the last
/// reference is released. Handles are single-threaded, like the
/// interpreter that holds them.
#[repr(transparent)]
pub struct Shared<T>(Rc<T>);

impl<T> Shared<T> {
    /// Wrap a freshly built payload. The returned handle is the caller's
    /// only reference; storing the payload in a rule slot retains it again.
    #[inline]
    pub fn new(value: T) -> Self {
        Shared(Rc::new(value))
    }

    /// Take a new reference.
    #[inline]
    pub fn retain(&self) -> Self {
        Shared(Rc::clone(&self.0))
    }

    /// Give up this reference.
    #[inline]
    pub fn release(self) {
        drop(self);
    }

    /// Number of live references.
    #[inline]
    pub fn reference_count(this: &Self) -> usize {
        Rc::strong_count(&this.0)
    }

    /// Whether two handles refer to the same payload.
    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// A non-owning observer, useful to confirm when a payload is freed.
    #[inline]
    pub fn downgrade(this: &Self) -> Weak<T> {
        Rc::downgrade(&this.0)
    }
}

impl<T> Clone for Shared<T> {
    #[inline]
    fn clone(&self) -> Self {
        self.retain()
    }
}

impl<T> Deref for Shared<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Shared").field(&self.0).finish()
    }
}

/// Repoint a payload slot: retain `incoming` first, then release whatever
/// the slot held. Assigning a payload to a slot that already holds it
/// therefore never drops its count to zero.
pub(crate) fn adopt<T>(slot: &mut Option<Shared<T>>, incoming: Option<&Shared<T>>) {
    let adopted = incoming.map(Shared::retain);
    let retired = std::mem::replace(slot, adopted);
    if let Some(old) = retired {
        old.release();
    }
}

/// The formal parameter list of a rule: one list of names per argument
/// group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentList {
    groups: Vec<List>,
}

impl ArgumentList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn groups(&self) -> &[List] {
        &self.groups
    }
}

impl FromIterator<List> for ArgumentList {
    fn from_iter<I: IntoIterator<Item = List>>(iter: I) -> Self {
        Self {
            groups: iter.into_iter().collect(),
        }
    }
}

bitflags::bitflags! {
    /// Modifiers on an `actions` declaration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ActionFlags: u32 {
        /// Only pass sources that are being rebuilt.
        const UPDATED   = 1 << 0;
        /// Merge invocations on the same target into one command.
        const TOGETHER  = 1 << 1;
        /// Ignore the command's exit status.
        const IGNORE    = 1 << 2;
        /// Do not echo the command.
        const QUIETLY   = 1 << 3;
        /// Split long source lists across several commands.
        const PIECEMEAL = 1 << 4;
        /// Only pass sources that already exist.
        const EXISTING  = 1 << 5;
    }
}

/// The command template of an `actions` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleActions {
    command: String,
    bind_list: List,
    flags: ActionFlags,
}

impl RuleActions {
    /// Build actions from a command template. The command text is copied.
    pub fn new(command: &str, bind_list: List, flags: ActionFlags) -> Self {
        Self {
            command: command.to_owned(),
            bind_list,
            flags,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Variables whose values are bound to file paths before the command runs.
    pub fn bind_list(&self) -> &List {
        &self.bind_list
    }

    pub fn flags(&self) -> ActionFlags {
        self.flags
    }
}
