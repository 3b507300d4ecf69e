//! Rules and queries: terms, atoms and validated Horn clauses.
//!
//! [`Rule`] and [`Query`] are only constructed through their validating
//! constructors, so every value in circulation is range-restricted: each
//! head (or projected) variable is bound by some class or property atom in
//! the body.
//!
//! Both also carry an evaluation *plan*: the body with relational atoms in
//! their written order and each builtin moved to just after the first atom
//! that binds all of its variables. The written order still decides the
//! join order; the plan only keeps builtins from running too early.

pub mod parse;

use std::collections::HashSet;
use std::sync::Arc;

use crate::entity::EntityId;
use crate::error::RuleError;
use crate::infer::binding::Binding;
use crate::infer::builtin::BuiltinOp;
use crate::store::Fact;

pub use parse::{parse_query, parse_rule};

/// A named placeholder, scoped to one rule or query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(Arc<str>);

impl Variable {
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    /// The name without the `?` sigil.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "?{}", self.0)
    }
}

/// An atom argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Constant(EntityId),
    Variable(Variable),
}

impl Term {
    pub fn var(name: &str) -> Self {
        Term::Variable(Variable::new(name))
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Term::Variable(v) => Some(v),
            Term::Constant(_) => None,
        }
    }
}

impl From<EntityId> for Term {
    fn from(id: EntityId) -> Self {
        Term::Constant(id)
    }
}

/// The unit of matching in rules and queries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Atom {
    /// `class(arg)`
    Class { class: EntityId, arg: Term },
    /// `property(subject, object)`
    Property {
        property: EntityId,
        subject: Term,
        object: Term,
    },
    /// A filter such as `swrlb:lessThan(?a, ?b)`.
    Builtin { op: BuiltinOp, args: Vec<Term> },
}

impl Atom {
    pub fn class(class: EntityId, arg: impl Into<Term>) -> Self {
        Atom::Class {
            class,
            arg: arg.into(),
        }
    }

    pub fn property(property: EntityId, subject: impl Into<Term>, object: impl Into<Term>) -> Self {
        Atom::Property {
            property,
            subject: subject.into(),
            object: object.into(),
        }
    }

    pub fn builtin(op: BuiltinOp, args: Vec<Term>) -> Self {
        Atom::Builtin { op, args }
    }

    /// Class and property atoms match facts; builtins only filter.
    pub fn is_relational(&self) -> bool {
        !matches!(self, Atom::Builtin { .. })
    }

    /// The class or property a relational atom ranges over.
    pub fn predicate(&self) -> Option<EntityId> {
        match self {
            Atom::Class { class, .. } => Some(*class),
            Atom::Property { property, .. } => Some(*property),
            Atom::Builtin { .. } => None,
        }
    }

    pub fn terms(&self) -> Vec<&Term> {
        match self {
            Atom::Class { arg, .. } => vec![arg],
            Atom::Property {
                subject, object, ..
            } => vec![subject, object],
            Atom::Builtin { args, .. } => args.iter().collect(),
        }
    }

    /// Rewrite every constant argument through `f`.
    pub(crate) fn map_constants(self, f: &impl Fn(EntityId) -> EntityId) -> Self {
        let term = |t: Term| match t {
            Term::Constant(id) => Term::Constant(f(id)),
            var => var,
        };
        match self {
            Atom::Class { class, arg } => Atom::Class {
                class,
                arg: term(arg),
            },
            Atom::Property {
                property,
                subject,
                object,
            } => Atom::Property {
                property,
                subject: term(subject),
                object: term(object),
            },
            Atom::Builtin { op, args } => Atom::Builtin {
                op,
                args: args.into_iter().map(term).collect(),
            },
        }
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> + '_ {
        self.terms().into_iter().filter_map(Term::as_variable)
    }

    /// Instantiate a relational atom into a ground fact.
    ///
    /// Returns `None` for builtins or when a variable is unbound.
    pub fn ground(&self, binding: &Binding) -> Option<Fact> {
        match self {
            Atom::Class { class, arg } => Some(Fact::membership(binding.resolve(arg)?, *class)),
            Atom::Property {
                property,
                subject,
                object,
            } => Some(Fact::link(
                *property,
                binding.resolve(subject)?,
                binding.resolve(object)?,
            )),
            Atom::Builtin { .. } => None,
        }
    }
}

/// A Horn rule: when every body atom matches, assert every head atom.
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    body: Vec<Atom>,
    head: Vec<Atom>,
    plan: Vec<Atom>,
}

impl Rule {
    /// Build a rule, rejecting it unless it is range-restricted.
    pub fn new(name: impl Into<String>, body: Vec<Atom>, head: Vec<Atom>) -> Result<Self, RuleError> {
        let name = name.into();
        check_body(&name, &body)?;

        let mut seen = HashSet::new();
        let head: Vec<Atom> = head.into_iter().filter(|a| seen.insert(a.clone())).collect();

        let bound = relational_variables(&body);
        for atom in &head {
            if let Atom::Builtin { op, .. } = atom {
                return Err(RuleError::BuiltinInHead {
                    rule: name,
                    builtin: op.name().to_string(),
                });
            }
            if let Some(var) = atom.variables().find(|v| !bound.contains(*v)) {
                return Err(RuleError::MalformedRule {
                    rule: name,
                    variable: var.name().to_string(),
                });
            }
        }

        let plan = plan(&body);
        Ok(Self {
            name,
            body,
            head,
            plan,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The body as written.
    pub fn body(&self) -> &[Atom] {
        &self.body
    }

    pub fn head(&self) -> &[Atom] {
        &self.head
    }

    /// The body in evaluation order.
    pub fn plan(&self) -> &[Atom] {
        &self.plan
    }

    /// Classes and properties the body reads.
    pub fn body_predicates(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.body.iter().filter_map(Atom::predicate)
    }

    /// Rewrite constants without revalidating; validity only depends on
    /// variables and atom shapes.
    pub(crate) fn map_constants(self, f: impl Fn(EntityId) -> EntityId) -> Self {
        Self {
            name: self.name,
            body: map_atoms(self.body, &f),
            head: map_atoms(self.head, &f),
            plan: map_atoms(self.plan, &f),
        }
    }

    /// Variables appearing in the head, in first-occurrence order.
    pub fn head_variables(&self) -> Vec<Variable> {
        let mut seen = HashSet::new();
        self.head
            .iter()
            .flat_map(Atom::variables)
            .filter(|v| seen.insert((*v).clone()))
            .cloned()
            .collect()
    }
}

/// A conjunctive query projecting selected variables.
#[derive(Debug, Clone)]
pub struct Query {
    name: String,
    body: Vec<Atom>,
    projection: Vec<Variable>,
    distinct: bool,
    plan: Vec<Atom>,
}

impl Query {
    /// Build a query, rejecting projections that the body cannot bind.
    pub fn new(
        name: impl Into<String>,
        body: Vec<Atom>,
        projection: Vec<Variable>,
    ) -> Result<Self, RuleError> {
        let name = name.into();
        check_body(&name, &body)?;

        let bound = relational_variables(&body);
        if let Some(var) = projection.iter().find(|v| !bound.contains(*v)) {
            return Err(RuleError::MalformedQuery {
                query: name,
                variable: var.name().to_string(),
            });
        }

        let plan = plan(&body);
        Ok(Self {
            name,
            body,
            projection,
            distinct: false,
            plan,
        })
    }

    /// Drop duplicate result rows, keeping the first occurrence.
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> &[Atom] {
        &self.body
    }

    pub fn projection(&self) -> &[Variable] {
        &self.projection
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn plan(&self) -> &[Atom] {
        &self.plan
    }

    pub(crate) fn map_constants(self, f: impl Fn(EntityId) -> EntityId) -> Self {
        Self {
            body: map_atoms(self.body, &f),
            plan: map_atoms(self.plan, &f),
            ..self
        }
    }
}

fn map_atoms(atoms: Vec<Atom>, f: &impl Fn(EntityId) -> EntityId) -> Vec<Atom> {
    atoms.into_iter().map(|a| a.map_constants(f)).collect()
}

fn check_body(name: &str, body: &[Atom]) -> Result<(), RuleError> {
    if body.is_empty() {
        return Err(RuleError::EmptyBody {
            name: name.to_string(),
        });
    }
    for atom in body {
        if let Atom::Builtin { op, args } = atom {
            if args.len() != op.arity() {
                return Err(RuleError::BuiltinArity {
                    name: name.to_string(),
                    builtin: op.name().to_string(),
                    expected: op.arity(),
                    actual: args.len(),
                });
            }
        }
    }
    Ok(())
}

fn relational_variables(body: &[Atom]) -> HashSet<&Variable> {
    body.iter()
        .filter(|a| a.is_relational())
        .flat_map(Atom::variables)
        .collect()
}

/// Order the body for evaluation: relational atoms as written, builtins as
/// soon as their variables are bound.
fn plan(body: &[Atom]) -> Vec<Atom> {
    let mut bound: HashSet<&Variable> = HashSet::new();
    let mut pending: Vec<&Atom> = Vec::new();
    let mut plan = Vec::with_capacity(body.len());

    let flush = |bound: &HashSet<&Variable>, pending: &mut Vec<&Atom>, plan: &mut Vec<Atom>| {
        pending.retain(|atom| {
            if atom.variables().all(|v| bound.contains(v)) {
                plan.push((*atom).clone());
                false
            } else {
                true
            }
        });
    };

    for atom in body {
        if atom.is_relational() {
            flush(&bound, &mut pending, &mut plan);
            plan.push(atom.clone());
            bound.extend(atom.variables());
        } else {
            pending.push(atom);
        }
    }
    flush(&bound, &mut pending, &mut plan);
    if !pending.is_empty() {
        tracing::warn!(
            count = pending.len(),
            "builtin arguments never bound by the body; these atoms always fail"
        );
    }
    // Unbindable builtins stay at the end, where they prune every branch.
    plan.extend(pending.into_iter().cloned());
    plan
}
