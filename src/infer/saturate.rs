//! Forward-chaining rule engine.
//!
//! Runs rules over the fact store in passes until a pass asserts nothing
//! new. Each derived fact is recorded with the rule and pass that produced it.
//!
//! With `semi_naive` enabled, a rule is only re-run in pass *n* if one of
//! the classes or properties its body reads gained a fact in pass *n - 1*.
//! Rules whose inputs are unchanged would derive nothing new, so the final
//! store is the same as with naive evaluation.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::classify::Hierarchy;
use crate::entity::EntityId;
use crate::error::RuleError;
use crate::registry::EntityRegistry;
use crate::rules::{Atom, Rule, Term};
use crate::store::{Fact, FactStore};

use super::binding::Binding;
use super::matcher::Matcher;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the forward-chaining rule engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleEngineConfig {
    /// Skip rules whose body inputs did not change last pass (default: true).
    pub semi_naive: bool,
    /// Evaluate rule bodies on the rayon pool (default: false).
    pub parallel: bool,
    /// Stop after this many passes even without a fixpoint (default: none).
    pub max_passes: Option<usize>,
}

impl Default for RuleEngineConfig {
    fn default() -> Self {
        Self {
            semi_naive: true,
            parallel: false,
            max_passes: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// A single derived fact with provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedFact {
    pub fact: Fact,
    pub rule: String,
    pub pass: usize,
}

/// Outcome of a saturation run.
#[derive(Debug, Clone, Default)]
pub struct SaturationResult {
    /// Number of facts newly asserted.
    pub applied: usize,
    pub passes: usize,
    pub reached_fixpoint: bool,
    pub derived: Vec<DerivedFact>,
    /// Per-rule derivation counts.
    pub rule_stats: HashMap<String, usize>,
}

// ---------------------------------------------------------------------------
// Rule engine
// ---------------------------------------------------------------------------

/// Forward-chaining rule engine.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    config: RuleEngineConfig,
    rules: Vec<Rule>,
}

impl RuleEngine {
    pub fn new(config: RuleEngineConfig) -> Self {
        Self {
            config,
            rules: Vec::new(),
        }
    }

    pub fn with_rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn config(&self) -> &RuleEngineConfig {
        &self.config
    }

    /// Apply every rule until no pass adds a fact.
    pub fn saturate(&self, store: &mut FactStore, registry: &EntityRegistry) -> SaturationResult {
        let mut result = SaturationResult::default();
        // `None` means every rule is active.
        let mut changed: Option<HashSet<EntityId>> = None;

        tracing::info!(
            rules = self.rules.len(),
            facts = store.len(),
            semi_naive = self.config.semi_naive,
            parallel = self.config.parallel,
            "saturating fact store"
        );

        loop {
            if self.config.max_passes.is_some_and(|max| result.passes >= max) {
                tracing::warn!(passes = result.passes, "pass limit reached before fixpoint");
                break;
            }
            result.passes += 1;
            let pass = result.passes;

            let active: Vec<&Rule> = self
                .rules
                .iter()
                .filter(|rule| match &changed {
                    None => true,
                    Some(changed) => rule.body_predicates().any(|p| changed.contains(&p)),
                })
                .collect();

            let mut touched = HashSet::new();
            let mut added = 0;
            let mut record = |rule: &Rule, fact: Fact, store: &mut FactStore| {
                if store.assert(fact) {
                    touched.insert(fact.predicate());
                    added += 1;
                    *result.rule_stats.entry(rule.name().to_string()).or_insert(0) += 1;
                    result.derived.push(DerivedFact {
                        fact,
                        rule: rule.name().to_string(),
                        pass,
                    });
                }
            };

            if self.config.parallel {
                let snapshot: &FactStore = store;
                let heads: Vec<Vec<Fact>> = active
                    .par_iter()
                    .map(|rule| derive_heads(rule, snapshot, registry))
                    .collect();
                for (rule, facts) in active.iter().zip(heads) {
                    for fact in facts {
                        record(*rule, fact, store);
                    }
                }
            } else {
                for rule in &active {
                    for fact in derive_heads(rule, store, registry) {
                        record(*rule, fact, store);
                    }
                }
            }

            tracing::debug!(pass, active = active.len(), added, "rule pass complete");
            result.applied += added;

            if added == 0 {
                result.reached_fixpoint = true;
                break;
            }
            changed = self.config.semi_naive.then_some(touched);
        }

        tracing::info!(
            applied = result.applied,
            passes = result.passes,
            reached_fixpoint = result.reached_fixpoint,
            "saturation finished"
        );
        result
    }
}

/// Ground every head atom of `rule` under every body solution.
fn derive_heads(rule: &Rule, store: &FactStore, registry: &EntityRegistry) -> Vec<Fact> {
    Matcher::new(store, registry)
        .solve(rule.plan(), Binding::new())
        .flat_map(|binding| {
            rule.head()
                .iter()
                .filter_map(|atom| atom.ground(&binding))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Turn the named class hierarchy into membership rules.
///
/// Every strict subsumption `A ⊑ B` between named classes, including those
/// entailed through complex expressions, becomes `A(?x) -> B(?x)`.
pub fn subsumption_rules(hierarchy: &Hierarchy) -> Result<Vec<Rule>, RuleError> {
    let x = || Term::var("x");
    hierarchy
        .subsumptions()
        .into_iter()
        .map(|(a, b)| {
            Rule::new(
                format!("sub-class-of:{}:{}", a.get(), b.get()),
                vec![Atom::class(a, x())],
                vec![Atom::class(b, x())],
            )
        })
        .collect()
}
