//! Module namespaces.

use crate::ids::{ModuleId, RuleId};
use crate::rule::RuleTable;
use rjam_core::collections::FxMap;
use rjam_core::{Name, NameInterner};

/// A namespace with its own rule table.
///
/// Module names carry their own trailing separator (e.g. `gcc.`) so that
/// qualified rule names are plain concatenations. The root module's name
/// is empty.
#[derive(Debug)]
pub struct Module {
    pub id: ModuleId,
    pub name: Name,
    pub rules: RuleTable,
}

impl Module {
    fn new(id: ModuleId, name: Name) -> Self {
        Self {
            id,
            name,
            rules: RuleTable::new(),
        }
    }

    /// Rules of this module in definition order.
    pub fn rule_ids(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.rules.iter().map(|(_, id)| *id)
    }
}

/// All modules of one registry. The root module always exists.
#[derive(Debug)]
pub struct ModuleTable {
    modules: Vec<Module>,
    by_name: FxMap<Name, ModuleId>,
}

impl ModuleTable {
    pub fn new(interner: &NameInterner) -> Self {
        let root_name = interner.intern_static("");
        let mut by_name = FxMap::default();
        by_name.insert(root_name, ModuleId::ROOT);
        Self {
            modules: vec![Module::new(ModuleId::ROOT, root_name)],
            by_name,
        }
    }

    pub fn root(&self) -> &Module {
        &self.modules[ModuleId::ROOT.index()]
    }

    /// Create-or-find a module by name.
    pub fn bind(&mut self, name: Name) -> ModuleId {
        if let Some(&id) = self.by_name.get(&name) {
            return id;
        }
        let id = ModuleId(self.modules.len() as u32);
        self.modules.push(Module::new(id, name));
        self.by_name.insert(name, id);
        id
    }

    pub fn find(&self, name: &Name) -> Option<ModuleId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: ModuleId) -> &Module {
        &self.modules[id.index()]
    }

    pub fn get_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.index()]
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter()
    }
}
