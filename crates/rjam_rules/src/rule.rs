//! Rules and per-module rule tables.

use crate::ids::{ModuleId, RuleId};
use crate::payload::{adopt, ArgumentList, RuleActions, Shared};
use crate::procedure::Procedure;
use rjam_core::collections::OrderedMap;
use rjam_core::Name;

/// A named build rule.
///
/// A rule lives in the table of the module it was entered into, but its
/// body runs in its source module, which differs for imported rules and
/// for the root-module mirrors of exported rules.
#[derive(Debug)]
pub struct Rule {
    pub id: RuleId,
    pub name: Name,
    /// The module whose namespace the body executes in.
    pub module: ModuleId,
    /// Whether the body is mirrored into the root module.
    pub exported: bool,
    procedure: Option<Procedure>,
    arguments: Option<Shared<ArgumentList>>,
    actions: Option<Shared<RuleActions>>,
}

impl Rule {
    pub(crate) fn new(id: RuleId, name: Name, module: ModuleId) -> Self {
        Self {
            id,
            name,
            module,
            exported: false,
            procedure: None,
            arguments: None,
            actions: None,
        }
    }

    pub fn procedure(&self) -> Option<&Procedure> {
        self.procedure.as_ref()
    }

    pub fn arguments(&self) -> Option<&Shared<ArgumentList>> {
        self.arguments.as_ref()
    }

    pub fn actions(&self) -> Option<&Shared<RuleActions>> {
        self.actions.as_ref()
    }

    /// Whether the rule has neither a body nor actions.
    pub fn is_empty(&self) -> bool {
        self.procedure.is_none() && self.arguments.is_none() && self.actions.is_none()
    }

    /// Install an argument list and procedure. `None` clears a slot.
    pub fn set_body(&mut self, args: Option<&Shared<ArgumentList>>, procedure: Option<&Procedure>) {
        adopt(&mut self.arguments, args);
        adopt(&mut self.procedure, procedure);
    }

    /// Install actions. `None` clears the slot.
    pub fn set_actions(&mut self, actions: Option<&Shared<RuleActions>>) {
        adopt(&mut self.actions, actions);
    }

    /// Release body and actions.
    pub fn clear(&mut self) {
        self.set_body(None, None);
        self.set_actions(None);
    }
}

/// Name-to-rule map of one module, in definition order.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    table: OrderedMap<Name, RuleId>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self {
            table: OrderedMap::new(),
        }
    }

    pub fn get(&self, name: &Name) -> Option<RuleId> {
        self.table.get(name).copied()
    }

    /// Create-or-find. `next` supplies the id for a new entry; the flag
    /// reports whether it was used.
    pub(crate) fn enter(&mut self, name: Name, next: RuleId) -> (RuleId, bool) {
        let (id, created) = self.table.entry_or_insert_with(name, || next);
        (*id, created)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &RuleId)> {
        self.table.iter()
    }
}
