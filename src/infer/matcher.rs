//! Unification of atoms against the fact store, and conjunctive body search.
//!
//! Facts are flat, so unification never recurses: each argument slot is
//! either a constant that must equal the fact's entity or a variable that is
//! bound (or checked) against it. Bodies are solved by a lazy, left-to-right
//! nested-loop join: every binding produced for atom *i* seeds the lookup for
//! atom *i + 1*, with the already-bound slots narrowing the index used.

use std::iter;

use crate::registry::EntityRegistry;
use crate::rules::Atom;
use crate::store::{Fact, FactPattern, FactStore};

use super::binding::Binding;

/// Lazy stream of bindings produced by matching.
pub type Bindings<'a> = Box<dyn Iterator<Item = Binding> + 'a>;

/// Read-only view over a fact store used for matching.
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'a> {
    store: &'a FactStore,
    registry: &'a EntityRegistry,
}

impl<'a> Matcher<'a> {
    pub fn new(store: &'a FactStore, registry: &'a EntityRegistry) -> Self {
        Self { store, registry }
    }

    /// Every extension of `binding` under which `atom` holds in the store.
    pub fn match_atom(&self, atom: &'a Atom, binding: Binding) -> Bindings<'a> {
        match atom {
            Atom::Class { class, arg } => {
                let pattern = FactPattern::membership(Some(*class), binding.resolve(arg));
                Box::new(self.store.iterate(pattern).filter_map(move |fact| match *fact {
                    Fact::ClassMembership { individual, .. } => binding.clone().unify(arg, individual),
                    Fact::PropertyLink { .. } => None,
                }))
            }
            Atom::Property {
                property,
                subject,
                object,
            } => {
                let pattern = FactPattern::link(
                    Some(*property),
                    binding.resolve(subject),
                    binding.resolve(object),
                );
                Box::new(self.store.iterate(pattern).filter_map(move |fact| match *fact {
                    Fact::PropertyLink {
                        subject: s,
                        object: o,
                        ..
                    } => binding
                        .clone()
                        .unify(subject, s)
                        .and_then(|b| b.unify(object, o)),
                    Fact::ClassMembership { .. } => None,
                }))
            }
            Atom::Builtin { op, args } => match op.evaluate(args, &binding, self.registry) {
                Ok(true) => Box::new(iter::once(binding)),
                Ok(false) => Box::new(iter::empty()),
                Err(e) => {
                    tracing::trace!(error = %e, "builtin branch pruned");
                    Box::new(iter::empty())
                }
            },
        }
    }

    /// Every extension of `binding` satisfying all of `body`, left to right.
    pub fn solve(&self, body: &'a [Atom], binding: Binding) -> Bindings<'a> {
        match body.split_first() {
            None => Box::new(iter::once(binding)),
            Some((first, rest)) => {
                let matcher = *self;
                Box::new(
                    self.match_atom(first, binding)
                        .flat_map(move |b| matcher.solve(rest, b)),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityId, EntityKind};
    use crate::infer::builtin::BuiltinOp;
    use crate::rules::{Term, Variable};

    struct Kb {
        registry: EntityRegistry,
        store: FactStore,
        person: EntityId,
        speaks: EntityId,
        john: EntityId,
        mary: EntityId,
        english: EntityId,
        french: EntityId,
    }

    fn kb() -> Kb {
        let registry = EntityRegistry::new();
        let person = registry.intern("Person", EntityKind::Class).unwrap();
        let speaks = registry.intern("speaksLanguage", EntityKind::ObjectProperty).unwrap();
        let john = registry.intern("John", EntityKind::Individual).unwrap();
        let mary = registry.intern("Mary", EntityKind::Individual).unwrap();
        let english = registry.intern("English", EntityKind::Individual).unwrap();
        let french = registry.intern("French", EntityKind::Individual).unwrap();

        let mut store = FactStore::new();
        store.assert(Fact::membership(john, person));
        store.assert(Fact::membership(mary, person));
        store.assert(Fact::link(speaks, john, english));
        store.assert(Fact::link(speaks, mary, french));
        store.assert(Fact::link(speaks, mary, english));

        Kb {
            registry,
            store,
            person,
            speaks,
            john,
            mary,
            english,
            french,
        }
    }

    fn collect(kb: &Kb, body: &[Atom], var: &str) -> Vec<EntityId> {
        let v = Variable::new(var);
        Matcher::new(&kb.store, &kb.registry)
            .solve(body, Binding::new())
            .filter_map(|b| b.get(&v))
            .collect()
    }

    #[test]
    fn single_atom_binds_each_match() {
        let kb = kb();
        let body = [Atom::class(kb.person, Term::var("x"))];
        assert_eq!(collect(&kb, &body, "x"), vec![kb.john, kb.mary]);
    }

    #[test]
    fn join_carries_bindings_forward() {
        let kb = kb();
        let body = [
            Atom::class(kb.person, Term::var("x")),
            Atom::property(kb.speaks, Term::var("x"), Term::var("y")),
        ];
        assert_eq!(collect(&kb, &body, "y"), vec![kb.english, kb.french, kb.english]);
    }

    #[test]
    fn constants_filter_matches() {
        let kb = kb();
        let body = [Atom::property(kb.speaks, Term::var("x"), kb.french)];
        assert_eq!(collect(&kb, &body, "x"), vec![kb.mary]);
    }

    #[test]
    fn repeated_variable_must_agree() {
        let mut kb = kb();
        kb.store.assert(Fact::link(kb.speaks, kb.john, kb.john));
        let body = [Atom::property(kb.speaks, Term::var("x"), Term::var("x"))];
        assert_eq!(collect(&kb, &body, "x"), vec![kb.john]);
    }

    #[test]
    fn builtin_filters_complete_bindings() {
        let kb = kb();
        let body = [
            Atom::property(kb.speaks, Term::var("x"), Term::var("y")),
            Atom::builtin(BuiltinOp::NotEqual, vec![Term::var("y"), Term::from(kb.english)]),
        ];
        assert_eq!(collect(&kb, &body, "x"), vec![kb.mary]);
    }

    #[test]
    fn builtin_with_unbound_argument_prunes_branch() {
        let kb = kb();
        let body = [
            Atom::builtin(BuiltinOp::Equal, vec![Term::var("x"), Term::var("x")]),
            Atom::class(kb.person, Term::var("x")),
        ];
        assert!(collect(&kb, &body, "x").is_empty());
    }

    #[test]
    fn seeded_binding_restricts_search() {
        let kb = kb();
        let body = [Atom::property(kb.speaks, Term::var("x"), Term::var("y"))];
        let seed = Binding::new().unify(&Term::var("x"), kb.john).unwrap();
        let results: Vec<Binding> = Matcher::new(&kb.store, &kb.registry)
            .solve(&body, seed)
            .collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].get(&Variable::new("y")), Some(kb.english));
    }

    #[test]
    fn empty_body_yields_the_seed() {
        let kb = kb();
        let results: Vec<Binding> = Matcher::new(&kb.store, &kb.registry)
            .solve(&[], Binding::new())
            .collect();
        assert_eq!(results, vec![Binding::new()]);
    }
}
