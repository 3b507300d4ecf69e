//! Text syntax for rules and queries.
//!
//! ```text
//! Person(?x) ^ speaksLanguage(?x, English) -> EnglishSpeaker(?x)
//! Person(?x) ^ speaksLanguage(?x, ?y) -> sqwrl:select(?y)
//! ```
//!
//! Predicates must already be registered as classes or properties; builtins
//! carry the `swrlb:` prefix. Any other argument that is not a `?variable`
//! names an individual. Quoted literals such as `"42"^^xsd:int` are reduced
//! to their lexical form (`42`).
//!
//! Names resolve through [`EntityRegistry::resolve`], so `Man`, `#Man` and
//! `http://example.org/onto#Man` all name the same class when the local name
//! is unique. Individuals not yet registered are interned only once the rule
//! or query has validated; rejected text leaves the registry unchanged.

use std::collections::HashMap;

use crate::entity::{EntityId, EntityKind};
use crate::error::{OntoResult, ParseError, RegistryError};
use crate::infer::builtin::BuiltinOp;
use crate::registry::EntityRegistry;

use super::{Atom, Query, Rule, Term, Variable};

const SELECT: &str = "sqwrl:select";
const SELECT_DISTINCT: &str = "sqwrl:selectDistinct";

/// Parse `body -> head` into a validated [`Rule`].
pub fn parse_rule(name: &str, text: &str, registry: &EntityRegistry) -> OntoResult<Rule> {
    let (body, head) = split_arrow(text)?;
    let mut constants = Constants::new(registry);
    let body = parse_conjunction(text, body, &mut constants)?;
    let head = parse_conjunction(text, head, &mut constants)?;
    let rule = Rule::new(name, body, head)?;

    let interned = constants.commit()?;
    Ok(rule.map_constants(|id| interned.get(&id).copied().unwrap_or(id)))
}

/// Parse `body -> sqwrl:select(?v, ...)` into a validated [`Query`].
pub fn parse_query(name: &str, text: &str, registry: &EntityRegistry) -> OntoResult<Query> {
    let (body, head) = split_arrow(text)?;
    let mut constants = Constants::new(registry);
    let body = parse_conjunction(text, body, &mut constants)?;

    let (select, args) = split_atom(text, head.trim())?;
    let distinct = match select {
        SELECT => false,
        SELECT_DISTINCT => true,
        other => {
            return Err(syntax(
                text,
                format!("query head must be {SELECT} or {SELECT_DISTINCT}, found '{other}'"),
            )
            .into());
        }
    };
    let projection = args
        .iter()
        .map(|arg| {
            variable(arg).ok_or_else(|| syntax(text, format!("cannot select constant '{arg}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let query = Query::new(name, body, projection)?;
    let interned = constants.commit()?;
    let query = query.map_constants(|id| interned.get(&id).copied().unwrap_or(id));
    Ok(if distinct { query.distinct() } else { query })
}

/// Constants named by the text being parsed.
///
/// Names not yet registered get placeholder ids from the top of the id
/// space; [`Constants::commit`] interns them and maps each placeholder to
/// its real id.
struct Constants<'r> {
    registry: &'r EntityRegistry,
    fresh: Vec<(EntityId, String)>,
    next: u32,
}

impl<'r> Constants<'r> {
    fn new(registry: &'r EntityRegistry) -> Self {
        Self {
            registry,
            fresh: Vec::new(),
            next: u32::MAX,
        }
    }

    fn resolve(&mut self, name: &str) -> Result<EntityId, RegistryError> {
        match self.registry.resolve(name) {
            // Re-interning an existing name only checks its kind.
            Ok(id) => self
                .registry
                .intern(&self.registry.name(id), EntityKind::Individual),
            Err(RegistryError::NotFound { .. }) => {
                if let Some((id, _)) = self.fresh.iter().find(|(_, n)| n == name) {
                    return Ok(*id);
                }
                let id = self.placeholder()?;
                self.fresh.push((id, name.to_string()));
                Ok(id)
            }
            Err(e) => Err(e),
        }
    }

    fn placeholder(&mut self) -> Result<EntityId, RegistryError> {
        loop {
            let id = EntityId::new(self.next).ok_or(RegistryError::Exhausted)?;
            self.next -= 1;
            if self.registry.get(id).is_none() {
                return Ok(id);
            }
        }
    }

    fn commit(self) -> Result<HashMap<EntityId, EntityId>, RegistryError> {
        let registry = self.registry;
        self.fresh
            .into_iter()
            .map(|(placeholder, name)| {
                Ok((placeholder, registry.intern(&name, EntityKind::Individual)?))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

fn syntax(input: &str, message: impl Into<String>) -> ParseError {
    ParseError::Syntax {
        input: input.to_string(),
        message: message.into(),
    }
}

fn split_arrow(text: &str) -> Result<(&str, &str), ParseError> {
    match split_top_level(text, "->")?.as_slice() {
        [body, head] => Ok((*body, *head)),
        [_] => Err(syntax(text, "missing '->'")),
        _ => Err(syntax(text, "more than one '->'")),
    }
}

/// Split on `sep` outside parentheses and double quotes.
fn split_top_level<'a>(text: &'a str, sep: &str) -> Result<Vec<&'a str>, ParseError> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quoted = false;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => quoted = !quoted,
            b'(' if !quoted => depth += 1,
            b')' if !quoted => {
                depth -= 1;
                if depth < 0 {
                    return Err(syntax(text, "unbalanced ')'"));
                }
            }
            _ if depth == 0 && !quoted && bytes[i..].starts_with(sep.as_bytes()) => {
                parts.push(&text[start..i]);
                i += sep.len();
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    if depth != 0 {
        return Err(syntax(text, "unbalanced '('"));
    }
    if quoted {
        return Err(syntax(text, "unterminated string literal"));
    }
    parts.push(&text[start..]);
    Ok(parts)
}

/// `name(a, b)` into its name and trimmed arguments.
fn split_atom<'a>(input: &str, atom: &'a str) -> Result<(&'a str, Vec<&'a str>), ParseError> {
    let (name, rest) = atom
        .split_once('(')
        .ok_or_else(|| syntax(input, format!("expected '(' in atom '{atom}'")))?;
    let args = rest
        .strip_suffix(')')
        .ok_or_else(|| syntax(input, format!("atom '{atom}' must end with ')'")))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(syntax(input, format!("atom '{atom}' has no predicate name")));
    }

    let args = if args.trim().is_empty() {
        Vec::new()
    } else {
        split_top_level(args, ",")?.into_iter().map(str::trim).collect()
    };
    if args.iter().any(|a| a.is_empty()) {
        return Err(syntax(input, format!("empty argument in '{atom}'")));
    }
    Ok((name, args))
}

fn parse_conjunction(
    input: &str,
    side: &str,
    constants: &mut Constants<'_>,
) -> OntoResult<Vec<Atom>> {
    split_top_level(side, "^")?
        .into_iter()
        .map(str::trim)
        .map(|atom| {
            if atom.is_empty() {
                Err(syntax(input, "empty atom").into())
            } else {
                parse_atom(input, atom, constants)
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Atoms and terms
// ---------------------------------------------------------------------------

fn parse_atom(input: &str, atom: &str, constants: &mut Constants<'_>) -> OntoResult<Atom> {
    let (name, args) = split_atom(input, atom)?;

    if name.starts_with("swrlb:") {
        let op = BuiltinOp::parse(name).ok_or_else(|| ParseError::UnknownBuiltin {
            name: name.to_string(),
        })?;
        let args = args
            .iter()
            .map(|arg| term(arg, constants))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Atom::builtin(op, args));
    }

    let name = name.trim_start_matches('#');
    let unknown = || ParseError::UnknownPredicate {
        name: name.to_string(),
    };
    let registry = constants.registry;
    let predicate = match registry.resolve(name) {
        Ok(id) => id,
        Err(RegistryError::NotFound { .. }) => return Err(unknown().into()),
        Err(e) => return Err(e.into()),
    };
    let kind = registry.kind(predicate).ok_or_else(unknown)?;

    match (kind, args.as_slice()) {
        (EntityKind::Individual, _) => Err(unknown().into()),
        (EntityKind::Class, [arg]) => Ok(Atom::class(predicate, term(arg, constants)?)),
        (EntityKind::ObjectProperty | EntityKind::DataProperty, [subject, object]) => {
            Ok(Atom::property(
                predicate,
                term(subject, constants)?,
                term(object, constants)?,
            ))
        }
        (kind, args) => Err(ParseError::Arity {
            name: name.to_string(),
            kind,
            expected: if kind == EntityKind::Class { 1 } else { 2 },
            actual: args.len(),
        }
        .into()),
    }
}

fn variable(arg: &str) -> Option<Variable> {
    arg.strip_prefix('?')
        .filter(|name| !name.is_empty())
        .map(Variable::new)
}

fn term(arg: &str, constants: &mut Constants<'_>) -> Result<Term, RegistryError> {
    if let Some(var) = variable(arg) {
        return Ok(Term::Variable(var));
    }
    Ok(Term::Constant(constants.resolve(literal(arg))?))
}

/// Lexical form of a constant: quotes, `^^datatype` and a leading `#` dropped.
fn literal(arg: &str) -> &str {
    if let Some(quoted) = arg.strip_prefix('"') {
        if let Some((value, _)) = quoted.split_once('"') {
            return value;
        }
    }
    let value = arg.split("^^").next().unwrap_or(arg);
    value.trim_start_matches('#')
}
