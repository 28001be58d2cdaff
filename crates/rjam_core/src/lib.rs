//! rjam_core: Core utilities for the rjam build-description interpreter.
//!
//! Provides name interning, the ordered string lists that carry variable
//! values, the global variable store, and collections used by the rule and
//! target registries.

pub mod collections;
pub mod intern;
pub mod list;
pub mod logging;
pub mod variables;

// Re-export commonly used types
pub use intern::{Name, NameInterner};
pub use list::List;
pub use logging::init_tracing;
pub use variables::{VariableSwap, VariableTable};
