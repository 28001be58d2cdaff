//! The registry context: modules, rules, targets and settings of one
//! interpreter instance.
//!
//! Rule operations follow a create-or-find discipline. Defining a rule
//! whose entry was last filled from a different source module clears the
//! entry first, so a redefinition never runs a stale body. Exported bodies
//! and all declared actions are mirrored into the root module under the
//! qualified name (module name followed by rule name) and share their
//! payloads with the local entry.

use crate::chain::TargetChain;
use crate::error::RulesError;
use crate::ids::{ModuleId, RuleId, TargetId};
use crate::module::{Module, ModuleTable};
use crate::payload::{ActionFlags, ArgumentList, RuleActions, Shared};
use crate::procedure::Procedure;
use crate::rule::Rule;
use crate::settings::{SetMode, SettingsPool};
use crate::target::{Target, TargetFlags, TargetTable};
use rjam_core::{List, Name, NameInterner, VariableSwap};
use rjam_options::RegistryOptions;
use tracing::{debug, trace};

/// Counts reported by `Registry::teardown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TeardownStats {
    pub modules: usize,
    pub rules: usize,
    pub targets: usize,
    /// Settings nodes dropped from the free list.
    pub settings_nodes: usize,
}

/// All rule, target and settings state of one interpreter.
pub struct Registry {
    interner: NameInterner,
    options: RegistryOptions,
    modules: ModuleTable,
    rules: Vec<Rule>,
    targets: TargetTable,
    settings: SettingsPool,
}

impl Registry {
    pub fn new() -> Self {
        Self::build(NameInterner::new(), RegistryOptions::default())
    }

    /// A registry tuned by `options`, which are validated first.
    pub fn with_options(options: RegistryOptions) -> Result<Self, RulesError> {
        Self::with_interner(NameInterner::new(), options)
    }

    /// A registry sharing names with the caller's interner.
    pub fn with_interner(interner: NameInterner, options: RegistryOptions) -> Result<Self, RulesError> {
        options.validate()?;
        Ok(Self::build(interner, options))
    }

    fn build(interner: NameInterner, options: RegistryOptions) -> Self {
        let targets = match options.target_capacity {
            Some(capacity) => TargetTable::with_capacity(capacity),
            None => TargetTable::new(),
        };
        let settings = match options.settings_pool_capacity {
            Some(capacity) => SettingsPool::with_capacity(capacity),
            None => SettingsPool::new(),
        };
        Self {
            modules: ModuleTable::new(&interner),
            interner,
            options,
            rules: Vec::new(),
            targets,
            settings,
        }
    }

    pub fn interner(&self) -> &NameInterner {
        &self.interner
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    // ========================================================================
    // Modules
    // ========================================================================

    pub fn root_module(&self) -> ModuleId {
        ModuleId::ROOT
    }

    /// Create-or-find a module. Names include their separator, e.g. `gcc.`.
    pub fn bind_module(&mut self, name: &str) -> ModuleId {
        let name = self.interner.intern(name);
        self.modules.bind(name)
    }

    pub fn find_module(&self, name: &str) -> Option<ModuleId> {
        self.modules.find(&self.interner.get(name)?)
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        self.modules.get(id)
    }

    pub fn modules(&self) -> &ModuleTable {
        &self.modules
    }

    pub fn module_name(&self, id: ModuleId) -> &str {
        self.interner.resolve(self.modules.get(id).name)
    }

    /// Rules of `module` whose bodies are exported.
    pub fn exported_rules(&self, module: ModuleId) -> impl Iterator<Item = RuleId> + '_ {
        self.modules
            .get(module)
            .rule_ids()
            .filter(move |id| self.rules[id.index()].exported)
    }

    // ========================================================================
    // Rules
    // ========================================================================

    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.index()]
    }

    pub fn rule_mut(&mut self, id: RuleId) -> &mut Rule {
        &mut self.rules[id.index()]
    }

    pub fn rule_name(&self, id: RuleId) -> &str {
        self.interner.resolve(self.rules[id.index()].name)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Create-or-find `name` in `module`'s table. A new rule is owned by
    /// `module`, unexported, and has no body or actions.
    pub fn enter_rule(&mut self, module: ModuleId, name: &str) -> RuleId {
        debug_assert!(!name.is_empty(), "rule name must not be empty");
        let name = self.interner.intern(name);
        self.enter_rule_named(module, name)
    }

    fn enter_rule_named(&mut self, module: ModuleId, name: Name) -> RuleId {
        let next = RuleId(self.rules.len() as u32);
        let (id, created) = self.modules.get_mut(module).rules.enter(name, next);
        if created {
            self.rules.push(Rule::new(id, name, module));
            trace!(
                rule = self.interner.resolve(name),
                module = self.module_name(module),
                "rule entered"
            );
        }
        id
    }

    /// Prepare `name` in `target`'s table to take a body or actions that
    /// run in `src`. An entry last filled from another module is cleared.
    pub fn define_rule(&mut self, src: ModuleId, name: &str, target: ModuleId) -> RuleId {
        debug_assert!(!name.is_empty(), "rule name must not be empty");
        let name = self.interner.intern(name);
        self.define_rule_named(src, name, target)
    }

    fn define_rule_named(&mut self, src: ModuleId, name: Name, target: ModuleId) -> RuleId {
        let id = self.enter_rule_named(target, name);
        let rule = &mut self.rules[id.index()];
        if rule.module != src {
            if !rule.is_empty() {
                debug!(
                    rule = self.interner.resolve(name),
                    from = self.interner.resolve(self.modules.get(rule.module).name),
                    to = self.interner.resolve(self.modules.get(src).name),
                    "redefinition clears rule imported from another module"
                );
            }
            rule.clear();
            rule.module = src;
        }
        id
    }

    /// Lookup-only in `module`; falls back to create-or-find in the root
    /// module. Never fails.
    pub fn bind_rule(&mut self, name: &str, module: ModuleId) -> RuleId {
        match self.find_rule(name, module) {
            Some(id) => id,
            None => self.enter_rule(ModuleId::ROOT, name),
        }
    }

    /// Lookup-only in `module`, without the root fallback.
    pub fn find_rule(&self, name: &str, module: ModuleId) -> Option<RuleId> {
        let name = self.interner.get(name)?;
        self.modules.get(module).rules.get(&name)
    }

    /// The name a rule of `module` called `name` has in the root module.
    /// Root rules are not qualified, so the length cap does not apply.
    pub fn qualified_name(&self, module: ModuleId, name: &str) -> Result<String, RulesError> {
        if module.is_root() {
            return Ok(name.to_owned());
        }
        let prefix = self.module_name(module);
        self.check_qualified_len(prefix, name)?;
        let mut qualified = String::with_capacity(prefix.len() + name.len());
        qualified.push_str(prefix);
        qualified.push_str(name);
        Ok(qualified)
    }

    fn check_qualified_len(&self, prefix: &str, name: &str) -> Result<(), RulesError> {
        let len = prefix.len() + name.len();
        match self.options.max_qualified_name_len {
            Some(limit) if len > limit => Err(RulesError::QualifiedNameTooLong {
                name: format!("{prefix}{name}"),
                len,
                limit,
            }),
            _ => Ok(()),
        }
    }

    fn qualified_name_of(&self, module: ModuleId, name: Name) -> Result<Name, RulesError> {
        if module.is_root() {
            return Ok(name);
        }
        let prefix = self.modules.get(module).name;
        self.check_qualified_len(self.interner.resolve(prefix), self.interner.resolve(name))?;
        Ok(self.interner.concat(prefix, name))
    }

    /// The root-module entry mirroring `rule`; the rule itself if it is
    /// already a root rule.
    fn global_rule(&mut self, rule: RuleId, qualified: Name) -> RuleId {
        let src = self.rules[rule.index()].module;
        if src.is_root() {
            return rule;
        }
        self.define_rule_named(src, qualified, ModuleId::ROOT)
    }

    /// Define `name` in `module` with a body. The procedure is tagged with
    /// the qualified name unless it already carries one. An exported body
    /// is also installed in the root module under the qualified name.
    #[tracing::instrument(level = "trace", skip_all, fields(rule = name, exported = exported))]
    pub fn new_body(
        &mut self,
        module: ModuleId,
        name: &str,
        args: Option<Shared<ArgumentList>>,
        procedure: Procedure,
        exported: bool,
    ) -> Result<RuleId, RulesError> {
        debug_assert!(!name.is_empty(), "rule name must not be empty");
        let name = self.interner.intern(name);
        let qualified = self.qualified_name_of(module, name)?;

        let local = self.define_rule_named(module, name, module);
        let rule = &mut self.rules[local.index()];
        rule.exported = exported;
        rule.set_body(args.as_ref(), Some(&procedure));

        let interner = &self.interner;
        procedure.tag_rule_name(|| interner.resolve(qualified).to_owned());

        if exported {
            let global = self.global_rule(local, qualified);
            self.rules[global.index()].set_body(args.as_ref(), Some(&procedure));
            debug!(qualified = self.interner.resolve(qualified), "body exported");
        }
        Ok(local)
    }

    /// Define `name` in `module` with actions, always mirroring the same
    /// actions object into the root module.
    #[tracing::instrument(level = "trace", skip_all, fields(rule = name))]
    pub fn new_actions(
        &mut self,
        module: ModuleId,
        name: &str,
        command: &str,
        bind_list: List,
        flags: ActionFlags,
    ) -> Result<RuleId, RulesError> {
        debug_assert!(!name.is_empty(), "rule name must not be empty");
        let name = self.interner.intern(name);
        let qualified = self.qualified_name_of(module, name)?;

        let local = self.define_rule_named(module, name, module);
        let global = self.global_rule(local, qualified);
        let actions = Shared::new(RuleActions::new(command, bind_list, flags));
        self.rules[local.index()].set_actions(Some(&actions));
        self.rules[global.index()].set_actions(Some(&actions));
        trace!(qualified = self.interner.resolve(qualified), "actions mirrored");
        Ok(local)
    }

    /// Make `source` available as `dest_name` in `dest_module`. The new
    /// entry runs in `source`'s module and shares its body and actions;
    /// `source` itself is untouched.
    #[tracing::instrument(level = "trace", skip_all, fields(rule = dest_name))]
    pub fn import_rule(&mut self, source: RuleId, dest_module: ModuleId, dest_name: &str) -> RuleId {
        debug_assert!(!dest_name.is_empty(), "rule name must not be empty");
        let src = &self.rules[source.index()];
        let src_module = src.module;
        let arguments = src.arguments().cloned();
        let procedure = src.procedure().cloned();
        let actions = src.actions().cloned();

        let name = self.interner.intern(dest_name);
        let dest = self.define_rule_named(src_module, name, dest_module);
        let rule = &mut self.rules[dest.index()];
        rule.set_body(arguments.as_ref(), procedure.as_ref());
        rule.set_actions(actions.as_ref());
        dest
    }

    // ========================================================================
    // Targets
    // ========================================================================

    /// Create-or-find a target. A new target's bound name is its name.
    pub fn bind_target(&mut self, name: &str) -> TargetId {
        debug_assert!(!name.is_empty(), "target name must not be empty");
        let name = self.interner.intern(name);
        let (id, created) = self.targets.bind(name);
        if created {
            trace!(target_name = self.interner.resolve(name), "target created");
        }
        id
    }

    pub fn find_target(&self, name: &str) -> Option<TargetId> {
        self.targets.find(&self.interner.get(name)?)
    }

    /// Mark a target for rebuild without touching any timestamp.
    pub fn touch_target(&mut self, name: &str) -> TargetId {
        let id = self.bind_target(name);
        self.targets.get_mut(id).flags |= TargetFlags::TOUCHED;
        id
    }

    pub fn target(&self, id: TargetId) -> &Target {
        self.targets.get(id)
    }

    pub fn target_mut(&mut self, id: TargetId) -> &mut Target {
        self.targets.get_mut(id)
    }

    pub fn target_name(&self, id: TargetId) -> &str {
        self.interner.resolve(self.targets.get(id).name)
    }

    pub fn bound_name(&self, id: TargetId) -> &str {
        self.interner.resolve(self.targets.get(id).bound_name)
    }

    pub fn set_bound_name(&mut self, id: TargetId, path: &str) {
        let path = self.interner.intern(path);
        self.targets.get_mut(id).bound_name = path;
    }

    pub fn targets(&self) -> &TargetTable {
        &self.targets
    }

    /// Bind each name and append it to `chain`, in input order.
    pub fn target_list<'n, I>(&mut self, mut chain: TargetChain, names: I) -> TargetChain
    where
        I: IntoIterator<Item = &'n str>,
    {
        for name in names {
            chain.push(self.bind_target(name));
        }
        chain
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub fn settings(&self) -> &SettingsPool {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut SettingsPool {
        &mut self.settings
    }

    /// Add a deferred setting to `target`'s own chain.
    pub fn add_target_setting(&mut self, target: TargetId, mode: SetMode, symbol: &str, value: List) {
        let slot = &mut self.targets.get_mut(target).settings;
        let chain = std::mem::take(slot);
        *slot = self.settings.add(chain, mode, symbol, value);
    }

    /// Value `target`'s chain holds for `symbol`.
    pub fn target_setting(&self, target: TargetId, symbol: &str) -> Option<&List> {
        self.settings.value(&self.targets.get(target).settings, symbol)
    }

    pub fn push_target_settings<V: VariableSwap + ?Sized>(&mut self, target: TargetId, vars: &mut V) {
        self.settings.push(&self.targets.get(target).settings, vars);
    }

    pub fn pop_target_settings<V: VariableSwap + ?Sized>(&mut self, target: TargetId, vars: &mut V) {
        self.settings.pop(&self.targets.get(target).settings, vars);
    }

    /// Release `target`'s chain; the target keeps an empty one.
    pub fn clear_target_settings(&mut self, target: TargetId) {
        let chain = std::mem::take(&mut self.targets.get_mut(target).settings);
        self.settings.release(chain);
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Release all registry state. Must be the last use of the registry.
    pub fn teardown(mut self) -> TeardownStats {
        for target in self.targets.iter_mut() {
            let chain = std::mem::take(&mut target.settings);
            self.settings.release(chain);
        }
        let stats = TeardownStats {
            modules: self.modules.len(),
            rules: self.rules.len(),
            targets: self.targets.len(),
            settings_nodes: self.settings.drain(),
        };
        for rule in self.rules.iter_mut() {
            rule.clear();
        }
        debug!(?stats, "registry torn down");
        stats
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("modules", &self.modules.len())
            .field("rules", &self.rules.len())
            .field("targets", &self.targets.len())
            .field("settings_nodes", &self.settings.allocated())
            .finish()
    }
}
