//! The fact store: a set of ground facts with secondary indexes.
//!
//! Facts live in an append-only vector; the indexes hold positions into it,
//! so every lookup yields facts in insertion order. That order is what makes
//! rule and query evaluation deterministic.
//!
//! Indexes:
//!
//! - class memberships by class and by individual
//! - property links by property, by (property, subject) and by (property, object)
//!
//! The store only grows. [`FactStore::assert`] takes `&mut self`, so a
//! saturating rule engine is the single writer while queries share `&FactStore`.

pub mod fact;

use std::collections::HashMap;
use std::hash::Hash;

use crate::entity::EntityId;

pub use fact::{Fact, FactPattern};

/// Deduplicating, indexed set of ground facts.
#[derive(Debug, Default, Clone)]
pub struct FactStore {
    facts: Vec<Fact>,
    positions: HashMap<Fact, usize>,
    memberships: Vec<usize>,
    links: Vec<usize>,
    by_class: HashMap<EntityId, Vec<usize>>,
    by_individual: HashMap<EntityId, Vec<usize>>,
    by_property: HashMap<EntityId, Vec<usize>>,
    by_property_subject: HashMap<(EntityId, EntityId), Vec<usize>>,
    by_property_object: HashMap<(EntityId, EntityId), Vec<usize>>,
}

impl FactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fact. Returns `true` if it was not already present.
    pub fn assert(&mut self, fact: Fact) -> bool {
        if self.positions.contains_key(&fact) {
            return false;
        }
        let pos = self.facts.len();
        self.facts.push(fact);
        self.positions.insert(fact, pos);

        match fact {
            Fact::ClassMembership { individual, class } => {
                self.memberships.push(pos);
                self.by_class.entry(class).or_default().push(pos);
                self.by_individual.entry(individual).or_default().push(pos);
            }
            Fact::PropertyLink {
                property,
                subject,
                object,
            } => {
                self.links.push(pos);
                self.by_property.entry(property).or_default().push(pos);
                self.by_property_subject
                    .entry((property, subject))
                    .or_default()
                    .push(pos);
                self.by_property_object
                    .entry((property, object))
                    .or_default()
                    .push(pos);
            }
        }
        true
    }

    /// Add many facts, returning how many were new.
    pub fn extend(&mut self, facts: impl IntoIterator<Item = Fact>) -> usize {
        facts.into_iter().filter(|f| self.assert(*f)).count()
    }

    pub fn contains(&self, fact: &Fact) -> bool {
        self.positions.contains_key(fact)
    }

    /// Lazily yield every fact matching `pattern`, in insertion order.
    ///
    /// Uses the narrowest index the bound slots allow.
    pub fn iterate(&self, pattern: FactPattern) -> impl Iterator<Item = &Fact> + '_ {
        self.candidates(pattern)
            .iter()
            .map(move |&pos| &self.facts[pos])
            .filter(move |fact| pattern.matches(fact))
    }

    fn candidates(&self, pattern: FactPattern) -> &[usize] {
        match pattern {
            FactPattern::Class { class, individual } => match (class, individual) {
                (Some(c), Some(i)) => narrowest(
                    slice(&self.by_class, &c),
                    slice(&self.by_individual, &i),
                ),
                (Some(c), None) => slice(&self.by_class, &c),
                (None, Some(i)) => slice(&self.by_individual, &i),
                (None, None) => &self.memberships,
            },
            FactPattern::Property {
                property,
                subject,
                object,
            } => match (property, subject, object) {
                (Some(p), Some(s), Some(o)) => narrowest(
                    slice(&self.by_property_subject, &(p, s)),
                    slice(&self.by_property_object, &(p, o)),
                ),
                (Some(p), Some(s), None) => slice(&self.by_property_subject, &(p, s)),
                (Some(p), None, Some(o)) => slice(&self.by_property_object, &(p, o)),
                (Some(p), None, None) => slice(&self.by_property, &p),
                // Variable-property patterns only come from direct inspection.
                (None, _, _) => &self.links,
            },
        }
    }

    /// All facts in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Fact> + '_ {
        self.facts.iter()
    }

    /// Individuals asserted to be members of `class`.
    pub fn class_members(&self, class: EntityId) -> Vec<EntityId> {
        self.iterate(FactPattern::membership(Some(class), None))
            .filter_map(|f| match *f {
                Fact::ClassMembership { individual, .. } => Some(individual),
                Fact::PropertyLink { .. } => None,
            })
            .collect()
    }

    /// Objects linked from `subject` through `property`.
    pub fn property_values(&self, property: EntityId, subject: EntityId) -> Vec<EntityId> {
        self.iterate(FactPattern::link(Some(property), Some(subject), None))
            .filter_map(|f| match *f {
                Fact::PropertyLink { object, .. } => Some(object),
                Fact::ClassMembership { .. } => None,
            })
            .collect()
    }

    /// Classes `individual` is asserted (or derived) to belong to.
    pub fn types_of(&self, individual: EntityId) -> Vec<EntityId> {
        self.iterate(FactPattern::membership(None, Some(individual)))
            .map(Fact::predicate)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

fn slice<'a, K: Eq + Hash>(index: &'a HashMap<K, Vec<usize>>, key: &K) -> &'a [usize] {
    index.get(key).map(Vec::as_slice).unwrap_or(&[])
}

fn narrowest<'a>(a: &'a [usize], b: &'a [usize]) -> &'a [usize] {
    if a.len() <= b.len() { a } else { b }
}
