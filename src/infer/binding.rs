//! Variable bindings built up while matching a body.

use std::collections::BTreeMap;

use crate::entity::EntityId;
use crate::rules::{Term, Variable};

/// A mapping from variables to entities.
///
/// Extending a binding produces a new value; alternatives explored by the
/// matcher never see each other's extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Binding {
    slots: BTreeMap<Variable, EntityId>,
}

impl Binding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, var: &Variable) -> Option<EntityId> {
        self.slots.get(var).copied()
    }

    /// The entity a term denotes under this binding, if any.
    pub fn resolve(&self, term: &Term) -> Option<EntityId> {
        match term {
            Term::Constant(id) => Some(*id),
            Term::Variable(var) => self.get(var),
        }
    }

    /// Unify `term` with a ground `value`.
    ///
    /// Constants must be equal; bound variables must agree; free variables
    /// are bound. Returns `None` on conflict.
    pub fn unify(mut self, term: &Term, value: EntityId) -> Option<Self> {
        match term {
            Term::Constant(id) => (*id == value).then_some(self),
            Term::Variable(var) => match self.slots.get(var) {
                Some(&bound) => (bound == value).then_some(self),
                None => {
                    self.slots.insert(var.clone(), value);
                    Some(self)
                }
            },
        }
    }

    pub fn is_bound(&self, var: &Variable) -> bool {
        self.slots.contains_key(var)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, EntityId)> + '_ {
        self.slots.iter().map(|(v, id)| (v, *id))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl FromIterator<(Variable, EntityId)> for Binding {
    fn from_iter<I: IntoIterator<Item = (Variable, EntityId)>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().collect(),
        }
    }
}
