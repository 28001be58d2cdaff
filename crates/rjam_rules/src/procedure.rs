//! Handles on compiled rule bodies.

use crate::payload::Shared;
use std::cell::OnceCell;

/// A compiled rule body as handed over by the parser.
///
/// The registry never looks inside a body; it only shares it between rule
/// entries and tags it with a qualified rule name for profiling output.
#[derive(Debug)]
pub struct ProcedureBody {
    label: String,
    rule_name: OnceCell<String>,
}

impl ProcedureBody {
    /// `label` identifies the body's origin, e.g. `Jamrules:42`.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            rule_name: OnceCell::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The qualified name of the first rule this body was registered under.
    pub fn rule_name(&self) -> Option<&str> {
        self.rule_name.get().map(String::as_str)
    }

    /// Tag the body with a rule name. Only the first tag sticks; returns
    /// whether this call set it.
    pub fn tag_rule_name(&self, name: impl FnOnce() -> String) -> bool {
        let mut tagged = false;
        self.rule_name.get_or_init(|| {
            tagged = true;
            name()
        });
        tagged
    }
}

/// Shared handle on a compiled body.
pub type Procedure = Shared<ProcedureBody>;

impl Shared<ProcedureBody> {
    /// Convenience constructor for a fresh, untagged procedure.
    pub fn procedure(label: impl Into<String>) -> Procedure {
        Shared::new(ProcedureBody::new(label))
    }
}
