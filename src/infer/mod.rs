//! Rule-based inference.
//!
//! - [`binding`]: variable bindings, extended copy-on-branch
//! - [`builtin`]: comparison filters
//! - [`matcher`]: atom unification and lazy body search
//! - [`saturate`]: the forward-chaining fixpoint

pub mod binding;
pub mod builtin;
pub mod matcher;
pub mod saturate;

pub use binding::Binding;
pub use builtin::BuiltinOp;
pub use matcher::{Bindings, Matcher};
pub use saturate::{
    DerivedFact, RuleEngine, RuleEngineConfig, SaturationResult, subsumption_rules,
};
