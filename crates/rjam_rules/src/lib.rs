//! rjam_rules: Rule, target and settings registries.
//!
//! Maps rule names to executable build rules per module, mirrors exported
//! rules and declared actions into the root module, keeps the process-wide
//! target table, and applies target-specific variable settings around
//! action execution by swapping them with the global variable store.

mod chain;
mod error;
mod ids;
mod module;
mod payload;
mod procedure;
mod registry;
mod rule;
mod settings;
mod target;

pub use chain::{Action, ActionChain, Chain, TargetChain};
pub use error::RulesError;
pub use ids::{ModuleId, RuleId, TargetId};
pub use module::{Module, ModuleTable};
pub use payload::{ActionFlags, ArgumentList, RuleActions, Shared};
pub use procedure::{Procedure, ProcedureBody};
pub use registry::{Registry, TeardownStats};
pub use rule::{Rule, RuleTable};
pub use settings::{SetMode, Settings, SettingsIter, SettingsPool};
pub use target::{Target, TargetFlags, TargetTable};
