//! Registry integration tests.
//!
//! Exercises rule definition, export mirroring, import, and the target
//! table through the public `Registry` API.

use rjam_core::List;
use rjam_options::{parse_options, RegistryOptions};
use rjam_rules::{
    ActionFlags, ArgumentList, ModuleId, Procedure, Registry, RuleActions, RuleId, RulesError,
    Shared, TargetChain, TargetFlags,
};

/// Helper: a fresh registry with tracing enabled when `RUST_LOG` is set.
fn registry() -> Registry {
    rjam_core::init_tracing();
    Registry::new()
}

/// Helper: a one-group argument list.
fn args(names: &[&str]) -> Shared<ArgumentList> {
    Shared::new(ArgumentList::from_iter([names.iter().copied().collect::<List>()]))
}

// ============================================================================
// Targets
// ============================================================================

#[test]
fn test_bind_target_is_idempotent() {
    let mut reg = registry();
    let a = reg.bind_target("main.o");
    let b = reg.bind_target("main.o");
    assert_eq!(a, b);
    assert_eq!(reg.targets().len(), 1);
    assert_eq!(reg.bound_name(a), "main.o");
    assert!(reg.target(a).flags.is_empty());
}

#[test]
fn test_rebind_keeps_flags() {
    let mut reg = registry();
    let id = reg.bind_target("install");
    reg.target_mut(id).flags |= TargetFlags::NOTFILE;
    reg.bind_target("install");
    assert_eq!(reg.target(id).flags, TargetFlags::NOTFILE);
}

#[test]
fn test_touch_creates_and_marks() {
    let mut reg = registry();
    assert!(reg.find_target("config.h").is_none());
    let id = reg.touch_target("config.h");
    assert_eq!(reg.find_target("config.h"), Some(id));
    assert!(reg.target(id).flags.contains(TargetFlags::TOUCHED));

    reg.target_mut(id).flags |= TargetFlags::NOCARE;
    reg.touch_target("config.h");
    assert_eq!(reg.target(id).flags, TargetFlags::TOUCHED | TargetFlags::NOCARE);
}

#[test]
fn test_set_bound_name() {
    let mut reg = registry();
    let id = reg.bind_target("<src>util.c");
    reg.set_bound_name(id, "src/util.c");
    assert_eq!(reg.target_name(id), "<src>util.c");
    assert_eq!(reg.bound_name(id), "src/util.c");
}

#[test]
fn test_target_list_preserves_order() {
    let mut reg = registry();
    let existing = reg.bind_target("b.o");
    let chain = reg.target_list(TargetChain::new(), ["a.o", "b.o", "c.o"]);
    let names: Vec<_> = chain.iter().map(|&t| reg.target_name(t)).collect();
    assert_eq!(names, vec!["a.o", "b.o", "c.o"]);
    assert_eq!(chain.as_slice()[1], existing);
    assert_eq!(reg.targets().len(), 3);

    let chain = reg.target_list(chain, ["d.o"]);
    assert_eq!(chain.len(), 4);
    assert_eq!(reg.target_name(*chain.tail().unwrap()), "d.o");
}

#[test]
fn test_append_ten_thousand_targets() {
    let mut reg = registry();
    let names: Vec<String> = (0..10_000).map(|i| format!("obj{i}.o")).collect();
    let mut chain = TargetChain::new();
    for name in &names {
        let id = reg.bind_target(name);
        chain = chain.append(id);
    }
    assert_eq!(chain.len(), 10_000);
    for (i, id) in chain.iter().enumerate() {
        assert_eq!(reg.target_name(*id), names[i]);
    }
}

// ============================================================================
// Rule lookup
// ============================================================================

#[test]
fn test_enter_rule_is_idempotent() {
    let mut reg = registry();
    let gcc = reg.bind_module("gcc.");
    let a = reg.enter_rule(gcc, "compile");
    let b = reg.enter_rule(gcc, "compile");
    assert_eq!(a, b);
    assert_eq!(reg.rule(a).module, gcc);
    assert!(reg.rule(a).is_empty());
    assert!(!reg.rule(a).exported);
}

#[test]
fn test_bind_rule_finds_local() {
    let mut reg = registry();
    let gcc = reg.bind_module("gcc.");
    let local = reg.enter_rule(gcc, "compile");
    assert_eq!(reg.bind_rule("compile", gcc), local);
    assert_eq!(reg.bind_rule("compile", gcc), local);
}

#[test]
fn test_bind_rule_falls_back_to_root() {
    let mut reg = registry();
    let gcc = reg.bind_module("gcc.");
    let id = reg.bind_rule("Echo", gcc);
    assert_eq!(reg.rule(id).module, ModuleId::ROOT);
    assert_eq!(reg.find_rule("Echo", ModuleId::ROOT), Some(id));
    assert!(reg.find_rule("Echo", gcc).is_none());
    assert_eq!(reg.bind_rule("Echo", gcc), id);
}

#[test]
fn test_module_rules_in_definition_order() {
    let mut reg = registry();
    let m = reg.bind_module("tools.");
    for name in ["link", "archive", "compile"] {
        reg.enter_rule(m, name);
    }
    let names: Vec<_> = reg.module(m).rule_ids().map(|id| reg.rule_name(id)).collect();
    assert_eq!(names, vec!["link", "archive", "compile"]);
}

// ============================================================================
// Definition and re-declaration
// ============================================================================

#[test]
fn test_redefinition_from_other_module_clears() {
    let mut reg = registry();
    let src = reg.bind_module("a.");
    let src2 = reg.bind_module("b.");
    let tgt = reg.bind_module("c.");

    let id = reg.define_rule(src, "build", tgt);
    reg.rule_mut(id).set_body(Some(&args(&["x"])), Some(&Procedure::procedure("a:1")));
    reg.rule_mut(id).set_actions(Some(&Shared::new(RuleActions::new(
        "touch $(<)",
        List::new(),
        ActionFlags::empty(),
    ))));

    let again = reg.define_rule(src2, "build", tgt);
    assert_eq!(again, id);
    let rule = reg.rule(id);
    assert!(rule.procedure().is_none());
    assert!(rule.arguments().is_none());
    assert!(rule.actions().is_none());
    assert_eq!(rule.module, src2);
}

#[test]
fn test_redefinition_from_same_module_keeps_body() {
    let mut reg = registry();
    let src = reg.bind_module("a.");
    let id = reg.define_rule(src, "build", src);
    reg.rule_mut(id).set_body(None, Some(&Procedure::procedure("a:1")));
    reg.define_rule(src, "build", src);
    assert!(reg.rule(id).procedure().is_some());
}

#[test]
fn test_redefined_payload_is_released() {
    let mut reg = registry();
    let a = reg.bind_module("a.");
    let b = reg.bind_module("b.");
    let body = Procedure::procedure("a:7");
    let observer = Shared::downgrade(&body);
    reg.new_body(a, "run", None, body, false).unwrap();
    let imported = reg.import_rule(reg.find_rule("run", a).unwrap(), b, "run");
    assert!(observer.upgrade().is_some());

    reg.rule_mut(reg.find_rule("run", a).unwrap()).clear();
    reg.define_rule(b, "run", b);
    assert!(reg.rule(imported).is_empty());
    assert!(observer.upgrade().is_none());
}

// ============================================================================
// Bodies and export mirroring
// ============================================================================

#[test]
fn test_new_body_local_only() {
    let mut reg = registry();
    let m = reg.bind_module("gcc.");
    let a = args(&["sources"]);
    let p = Procedure::procedure("gcc.jam:10");
    let id = reg.new_body(m, "compile", Some(a.retain()), p.retain(), false).unwrap();

    let rule = reg.rule(id);
    assert!(!rule.exported);
    assert_eq!(rule.module, m);
    assert!(Shared::ptr_eq(rule.procedure().unwrap(), &p));
    assert!(reg.find_rule("gcc.compile", ModuleId::ROOT).is_none());
    assert_eq!(Shared::reference_count(&a), 2);
}

#[test]
fn test_export_mirrors_shared_payloads() {
    let mut reg = registry();
    let m = reg.bind_module("gcc.");
    let a = args(&["targets", "sources"]);
    let p = Procedure::procedure("gcc.jam:20");
    reg.new_body(m, "foo", Some(a.retain()), p.retain(), true).unwrap();

    let local = reg.bind_rule("foo", m);
    let global = reg.bind_rule("gcc.foo", ModuleId::ROOT);
    assert_ne!(local, global);

    let (l, g) = (reg.rule(local), reg.rule(global));
    assert!(l.exported);
    assert!(Shared::ptr_eq(l.procedure().unwrap(), &p));
    assert!(Shared::ptr_eq(g.procedure().unwrap(), &p));
    assert!(Shared::ptr_eq(l.arguments().unwrap(), &a));
    assert!(Shared::ptr_eq(g.arguments().unwrap(), &a));
    assert_eq!(g.module, m);

    // Caller's handle plus the local and global slots.
    assert_eq!(Shared::reference_count(&a), 3);
    assert_eq!(Shared::reference_count(&p), 3);
}

#[test]
fn test_export_from_root_uses_same_entry() {
    let mut reg = registry();
    let p = Procedure::procedure("Jambase:1");
    let id = reg.new_body(ModuleId::ROOT, "Main", None, p.retain(), true).unwrap();
    assert_eq!(reg.bind_rule("Main", ModuleId::ROOT), id);
    assert_eq!(reg.rule_count(), 1);
    assert_eq!(Shared::reference_count(&p), 2);
}

#[test]
fn test_procedure_tagged_once() {
    let mut reg = registry();
    let gcc = reg.bind_module("gcc.");
    let msvc = reg.bind_module("msvc.");
    let p = Procedure::procedure("common.jam:5");

    reg.new_body(gcc, "compile", None, p.retain(), false).unwrap();
    assert_eq!(p.rule_name(), Some("gcc.compile"));

    reg.new_body(msvc, "compile", None, p.retain(), true).unwrap();
    assert_eq!(p.rule_name(), Some("gcc.compile"));
}

#[test]
fn test_root_procedure_tag_is_bare_name() {
    let mut reg = registry();
    let p = Procedure::procedure("Jambase:3");
    reg.new_body(ModuleId::ROOT, "Library", None, p.retain(), false).unwrap();
    assert_eq!(p.rule_name(), Some("Library"));
}

#[test]
fn test_reexport_replaces_body_and_releases_old() {
    let mut reg = registry();
    let m = reg.bind_module("m.");
    let old = Procedure::procedure("m:1");
    let observer = Shared::downgrade(&old);
    reg.new_body(m, "r", None, old, true).unwrap();

    let new = Procedure::procedure("m:2");
    reg.new_body(m, "r", None, new.retain(), true).unwrap();
    assert!(observer.upgrade().is_none());
    let global = reg.bind_rule("m.r", ModuleId::ROOT);
    assert!(Shared::ptr_eq(reg.rule(global).procedure().unwrap(), &new));
}

#[test]
fn test_exported_rules() {
    let mut reg = registry();
    let m = reg.bind_module("m.");
    reg.new_body(m, "public", None, Procedure::procedure("m:1"), true).unwrap();
    reg.new_body(m, "private", None, Procedure::procedure("m:2"), false).unwrap();
    let exported: Vec<_> = reg.exported_rules(m).map(|id| reg.rule_name(id)).collect();
    assert_eq!(exported, vec!["public"]);
}

// ============================================================================
// Actions
// ============================================================================

#[test]
fn test_actions_always_mirrored() {
    let mut reg = registry();
    let m = reg.bind_module("gcc.");
    let id = reg
        .new_actions(m, "link", "gcc -o $(<) $(>)", List::from(["NEEDLIBS"]), ActionFlags::TOGETHER)
        .unwrap();

    let global = reg.find_rule("gcc.link", ModuleId::ROOT).unwrap();
    let local_actions = reg.rule(id).actions().unwrap();
    let global_actions = reg.rule(global).actions().unwrap();
    assert!(Shared::ptr_eq(local_actions, global_actions));
    assert_eq!(Shared::reference_count(local_actions), 2);
    assert_eq!(local_actions.command(), "gcc -o $(<) $(>)");
    assert_eq!(local_actions.bind_list(), &List::from(["NEEDLIBS"]));
    assert!(local_actions.flags().contains(ActionFlags::TOGETHER));
    assert!(!reg.rule(id).exported);
}

#[test]
fn test_root_actions_single_reference() {
    let mut reg = registry();
    let id = reg
        .new_actions(ModuleId::ROOT, "Clean", "rm -f $(>)", List::new(), ActionFlags::PIECEMEAL | ActionFlags::QUIETLY)
        .unwrap();
    assert_eq!(Shared::reference_count(reg.rule(id).actions().unwrap()), 1);
}

#[test]
fn test_actions_replace_releases_previous() {
    let mut reg = registry();
    let m = reg.bind_module("m.");
    let id = reg.new_actions(m, "a", "first", List::new(), ActionFlags::empty()).unwrap();
    let observer = Shared::downgrade(reg.rule(id).actions().unwrap());
    reg.new_actions(m, "a", "second", List::new(), ActionFlags::empty()).unwrap();
    assert!(observer.upgrade().is_none());
    let global = reg.find_rule("m.a", ModuleId::ROOT).unwrap();
    assert_eq!(reg.rule(global).actions().unwrap().command(), "second");
}

#[test]
fn test_body_and_actions_coexist() {
    let mut reg = registry();
    let m = reg.bind_module("m.");
    let id = reg.new_body(m, "Cc", None, Procedure::procedure("m:1"), false).unwrap();
    reg.new_actions(m, "Cc", "cc -c $(>)", List::new(), ActionFlags::empty()).unwrap();
    let rule = reg.rule(id);
    assert!(rule.procedure().is_some());
    assert!(rule.actions().is_some());
}

// ============================================================================
// Import
// ============================================================================

#[test]
fn test_import_shares_and_keeps_source() {
    let mut reg = registry();
    let gcc = reg.bind_module("gcc.");
    let user = reg.bind_module("user.");
    let a = args(&["x"]);
    let p = Procedure::procedure("gcc.jam:1");
    let source = reg.new_body(gcc, "compile", Some(a.retain()), p.retain(), false).unwrap();
    reg.new_actions(gcc, "compile", "gcc -c", List::new(), ActionFlags::empty()).unwrap();

    let dest = reg.import_rule(source, user, "cc");
    assert_eq!(reg.rule(dest).module, gcc);
    assert_eq!(reg.find_rule("cc", user), Some(dest));
    assert!(Shared::ptr_eq(reg.rule(dest).procedure().unwrap(), &p));
    assert!(Shared::ptr_eq(reg.rule(dest).arguments().unwrap(), &a));
    assert!(Shared::ptr_eq(
        reg.rule(dest).actions().unwrap(),
        reg.rule(source).actions().unwrap()
    ));

    let src = reg.rule(source);
    assert_eq!(src.module, gcc);
    assert!(Shared::ptr_eq(src.procedure().unwrap(), &p));
    assert_eq!(Shared::reference_count(&a), 3);
}

#[test]
fn test_import_over_local_rule_clears_it() {
    let mut reg = registry();
    let lib = reg.bind_module("lib.");
    let app = reg.bind_module("app.");
    let source = reg.new_body(lib, "helper", None, Procedure::procedure("lib:1"), false).unwrap();
    let local = reg
        .new_actions(app, "helper", "echo local", List::new(), ActionFlags::empty())
        .unwrap();

    let dest = reg.import_rule(source, app, "helper");
    assert_eq!(dest, local);
    assert_eq!(reg.rule(dest).module, lib);
    assert!(reg.rule(dest).actions().is_none());
    assert!(reg.rule(dest).procedure().is_some());
}

#[test]
fn test_import_onto_itself() {
    let mut reg = registry();
    let m = reg.bind_module("m.");
    let p = Procedure::procedure("m:1");
    let id = reg.new_body(m, "r", None, p.retain(), false).unwrap();
    assert_eq!(reg.import_rule(id, m, "r"), id);
    assert!(Shared::ptr_eq(reg.rule(id).procedure().unwrap(), &p));
    assert_eq!(Shared::reference_count(&p), 2);
}

// ============================================================================
// Qualified names and options
// ============================================================================

#[test]
fn test_qualified_name_is_untruncated() {
    let mut reg = registry();
    let long_module = format!("{}.", "m".repeat(5000));
    let m = reg.bind_module(&long_module);
    let long_rule = "r".repeat(5000);
    reg.new_body(m, &long_rule, None, Procedure::procedure("m:1"), true).unwrap();

    let qualified = reg.qualified_name(m, &long_rule).unwrap();
    assert_eq!(qualified.len(), 10_001);
    assert!(reg.find_rule(&qualified, ModuleId::ROOT).is_some());
}

#[test]
fn test_qualified_name_limit_fails_without_mutation() {
    let options = RegistryOptions {
        max_qualified_name_len: Some(10),
        ..RegistryOptions::default()
    };
    let mut reg = Registry::with_options(options).unwrap();
    let m = reg.bind_module("module.");
    let p = Procedure::procedure("m:1");

    let err = reg.new_body(m, "toolong", None, p.retain(), true).unwrap_err();
    match err {
        RulesError::QualifiedNameTooLong { name, len, limit } => {
            assert_eq!(name, "module.toolong");
            assert_eq!(len, 14);
            assert_eq!(limit, 10);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(reg.find_rule("toolong", m).is_none());
    assert_eq!(reg.rule_count(), 0);
    assert_eq!(p.rule_name(), None);
    assert_eq!(Shared::reference_count(&p), 1);

    let err = reg.new_actions(m, "toolong", "true", List::new(), ActionFlags::empty());
    assert!(matches!(err, Err(RulesError::QualifiedNameTooLong { .. })));
    assert_eq!(reg.rule_count(), 0);

    assert!(reg.new_body(m, "ok", None, p.retain(), true).is_ok());
}

#[test]
fn test_name_limit_skips_root_rules() {
    let options = RegistryOptions {
        max_qualified_name_len: Some(4),
        ..RegistryOptions::default()
    };
    let mut reg = Registry::with_options(options).unwrap();
    let root = reg.root_module();

    let id = reg.new_body(root, "Library", None, Procedure::procedure("Jambase:1"), true).unwrap();
    assert_eq!(reg.rule_name(id), "Library");
    assert_eq!(reg.qualified_name(root, "Library").unwrap(), "Library");
    reg.new_actions(root, "Library", "ar ru", List::new(), ActionFlags::empty()).unwrap();
    assert_eq!(reg.rule_count(), 1);

    let m = reg.bind_module("m.");
    assert!(matches!(
        reg.qualified_name(m, "Library"),
        Err(RulesError::QualifiedNameTooLong { len: 9, limit: 4, .. })
    ));
}

#[test]
fn test_invalid_options_rejected() {
    let options = RegistryOptions {
        max_qualified_name_len: Some(0),
        ..RegistryOptions::default()
    };
    assert!(matches!(Registry::with_options(options), Err(RulesError::Options(_))));
}

#[test]
fn test_registry_from_parsed_options() {
    let options = parse_options(r#"{ "targetCapacity": 16, "settingsPoolCapacity": 4 }"#).unwrap();
    let mut reg = Registry::with_options(options).unwrap();
    reg.bind_target("all");
    assert_eq!(reg.options().target_capacity, Some(16));
    assert_eq!(reg.targets().len(), 1);
}

#[test]
fn test_independent_registries() {
    let mut one = registry();
    let mut two = registry();
    one.touch_target("all");
    assert!(two.find_target("all").is_none());
    let id = two.bind_target("all");
    assert!(two.target(id).flags.is_empty());
}

#[test]
fn test_teardown_releases_payloads() {
    let mut reg = registry();
    let m = reg.bind_module("m.");
    let p = Procedure::procedure("m:1");
    let observer = Shared::downgrade(&p);
    reg.new_body(m, "r", None, p, true).unwrap();
    reg.bind_target("a");
    reg.bind_target("b");

    let stats = reg.teardown();
    assert_eq!(stats.modules, 2);
    assert_eq!(stats.rules, 2);
    assert_eq!(stats.targets, 2);
    assert!(observer.upgrade().is_none());
}

// ============================================================================
// Caller contract
// ============================================================================

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "target name must not be empty")]
fn test_empty_target_name_rejected() {
    let mut reg = registry();
    reg.bind_target("");
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "rule name must not be empty")]
fn test_empty_rule_name_rejected() {
    let mut reg = registry();
    let m = reg.bind_module("m.");
    reg.enter_rule(m, "");
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "rule name must not be empty")]
fn test_empty_body_name_rejected() {
    let mut reg = registry();
    let m = reg.bind_module("m.");
    let _ = reg.new_body(m, "", None, Procedure::procedure("m:1"), false);
}

#[test]
#[should_panic(expected = "index out of bounds")]
fn test_dangling_rule_id_rejected() {
    let reg = registry();
    let _ = reg.rule(RuleId(99));
}
