// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # ontorule
//!
//! A rule-based inference and query engine over typed ontology facts.
//!
//! ## Architecture
//!
//! - **Entities** (`entity`, `registry`): classes, properties and individuals
//!   interned to compact ids
//! - **Fact store** (`store`): class memberships and property links with
//!   secondary indexes
//! - **Axioms** (`axiom`) and **classification** (`classify`): subclass
//!   closure, unsatisfiable classes, consistency
//! - **Rules** (`rules`): range-restricted Horn rules and queries, with a
//!   text parser
//! - **Inference** (`infer`): unification, builtins and forward-chaining
//!   saturation
//! - **Queries** (`query`): conjunctive patterns with projection
//!
//! ## Library usage
//!
//! ```
//! use ontorule::engine::{Engine, EngineConfig};
//! use ontorule::entity::EntityKind;
//! use ontorule::store::Fact;
//!
//! let mut engine = Engine::new(EngineConfig::default()).unwrap();
//! let person = engine.declare("Person", EntityKind::Class).unwrap();
//! let speaker = engine.declare("EnglishSpeaker", EntityKind::Class).unwrap();
//! let speaks = engine.declare("speaksLanguage", EntityKind::ObjectProperty).unwrap();
//! let john = engine.declare("John", EntityKind::Individual).unwrap();
//! let english = engine.declare("English", EntityKind::Individual).unwrap();
//!
//! engine.assert_fact(Fact::membership(john, person));
//! engine.assert_fact(Fact::link(speaks, john, english));
//! engine
//!     .add_rule_text(
//!         "english-speaker",
//!         "Person(?x) ^ speaksLanguage(?x, English) -> EnglishSpeaker(?x)",
//!     )
//!     .unwrap();
//!
//! engine.saturate().unwrap();
//! assert!(engine.store().contains(&Fact::membership(john, speaker)));
//! ```

pub mod axiom;
pub mod classify;
pub mod document;
pub mod engine;
pub mod entity;
pub mod error;
pub mod infer;
pub mod query;
pub mod registry;
pub mod render;
pub mod rules;
pub mod store;
