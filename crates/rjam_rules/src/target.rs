//! The process-wide target table.

use crate::chain::{ActionChain, TargetChain};
use crate::ids::TargetId;
use crate::settings::Settings;
use rjam_core::collections::FxMap;
use rjam_core::Name;

bitflags::bitflags! {
    /// Per-target state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TargetFlags: u32 {
        /// Intermediate file that may be removed after the build.
        const TEMP          = 1 << 0;
        /// Missing target is not an error.
        const NOCARE        = 1 << 1;
        /// Not a file; never bound to a path.
        const NOTFILE       = 1 << 2;
        /// Forced rebuild regardless of timestamps.
        const TOUCHED       = 1 << 3;
        /// Depends only on its leaf sources.
        const LEAVES        = 1 << 4;
        /// Built only if missing.
        const NOUPDATE      = 1 << 5;
        /// Created by the interpreter rather than a build description.
        const INTERNAL      = 1 << 6;
        /// The build is expected to fail.
        const FAIL_EXPECTED = 1 << 7;
    }
}

/// A named buildable entity.
///
/// `depends` and `actions` are filled in by the build scheduler; the
/// registry only guarantees the slots exist.
#[derive(Debug)]
pub struct Target {
    pub id: TargetId,
    pub name: Name,
    /// The file path the target was bound to; the name until bound.
    pub bound_name: Name,
    pub flags: TargetFlags,
    pub(crate) settings: Settings,
    pub depends: TargetChain,
    pub actions: ActionChain,
}

impl Target {
    fn new(id: TargetId, name: Name) -> Self {
        Self {
            id,
            name,
            bound_name: name,
            flags: TargetFlags::empty(),
            settings: Settings::empty(),
            depends: TargetChain::new(),
            actions: ActionChain::new(),
        }
    }

    /// The target's own settings chain, allocated from its registry's pool.
    ///
    /// Only the registry replaces the chain, so its nodes always go back
    /// to the pool:
    ///
    /// ```compile_fail
    /// use rjam_rules::{Registry, Settings};
    ///
    /// let mut reg = Registry::new();
    /// let t = reg.bind_target("lib.a");
    /// reg.target_mut(t).settings = Settings::empty();
    /// ```
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

/// Create-or-find table of targets keyed by name.
#[derive(Debug, Default)]
pub struct TargetTable {
    targets: Vec<Target>,
    index: FxMap<Name, TargetId>,
}

impl TargetTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            targets: Vec::with_capacity(capacity),
            index: FxMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Create-or-find. The flag is `true` when the target was created.
    pub fn bind(&mut self, name: Name) -> (TargetId, bool) {
        if let Some(&id) = self.index.get(&name) {
            return (id, false);
        }
        let id = TargetId(self.targets.len() as u32);
        self.targets.push(Target::new(id, name));
        self.index.insert(name, id);
        (id, true)
    }

    pub fn find(&self, name: &Name) -> Option<TargetId> {
        self.index.get(name).copied()
    }

    pub fn get(&self, id: TargetId) -> &Target {
        &self.targets[id.index()]
    }

    pub fn get_mut(&mut self, id: TargetId) -> &mut Target {
        &mut self.targets[id.index()]
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Target> {
        self.targets.iter_mut()
    }
}
