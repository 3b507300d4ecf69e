//! Display strings for entities, facts, atoms, rules, queries and axioms.
//!
//! Entities are shown by their short name (text after the last `#` or `/`)
//! when that name resolves back to them, and by their qualified name
//! otherwise. Rules and queries render back into the syntax accepted by
//! [`crate::rules::parse`].

use crate::axiom::{Axiom, ClassExpr};
use crate::entity::{EntityId, short_name};
use crate::infer::builtin::BuiltinOp;
use crate::registry::EntityRegistry;
use crate::rules::{Atom, Query, Rule, Term};
use crate::store::Fact;

pub fn render_entity(registry: &EntityRegistry, id: EntityId) -> String {
    let name = registry.name(id);
    let short = short_name(&name);
    if registry.resolve(short).ok() == Some(id) {
        short.to_string()
    } else {
        name
    }
}

pub fn render_fact(registry: &EntityRegistry, fact: &Fact) -> String {
    match *fact {
        Fact::ClassMembership { individual, class } => format!(
            "{}({})",
            render_entity(registry, class),
            render_entity(registry, individual)
        ),
        Fact::PropertyLink {
            property,
            subject,
            object,
        } => format!(
            "{}({}, {})",
            render_entity(registry, property),
            render_entity(registry, subject),
            render_entity(registry, object)
        ),
    }
}

pub fn render_term(registry: &EntityRegistry, term: &Term) -> String {
    match term {
        Term::Constant(id) => render_entity(registry, *id),
        Term::Variable(var) => var.to_string(),
    }
}

pub fn render_atom(registry: &EntityRegistry, atom: &Atom) -> String {
    let (name, terms) = match atom {
        Atom::Class { class, .. } => (render_entity(registry, *class), atom.terms()),
        Atom::Property { property, .. } => (render_entity(registry, *property), atom.terms()),
        Atom::Builtin { op, .. } => (BuiltinOp::name(*op).to_string(), atom.terms()),
    };
    let args: Vec<String> = terms.into_iter().map(|t| render_term(registry, t)).collect();
    format!("{name}({})", args.join(", "))
}

fn conjunction(registry: &EntityRegistry, atoms: &[Atom]) -> String {
    atoms
        .iter()
        .map(|a| render_atom(registry, a))
        .collect::<Vec<_>>()
        .join(" ^ ")
}

pub fn render_rule(registry: &EntityRegistry, rule: &Rule) -> String {
    format!(
        "{} -> {}",
        conjunction(registry, rule.body()),
        conjunction(registry, rule.head())
    )
}

pub fn render_query(registry: &EntityRegistry, query: &Query) -> String {
    let select = if query.is_distinct() {
        "sqwrl:selectDistinct"
    } else {
        "sqwrl:select"
    };
    let vars: Vec<String> = query.projection().iter().map(ToString::to_string).collect();
    format!(
        "{} -> {select}({})",
        conjunction(registry, query.body()),
        vars.join(", ")
    )
}

/// Description-logic notation: `Man ⊑ Person`, `A ≡ B ⊓ ∃p.{v}`.
pub fn render_class_expr(registry: &EntityRegistry, expr: &ClassExpr) -> String {
    match expr {
        ClassExpr::Named(id) => render_entity(registry, *id),
        ClassExpr::Intersection(parts) => {
            let parts: Vec<String> = parts
                .iter()
                .map(|p| match p {
                    ClassExpr::Intersection(_) => format!("({})", render_class_expr(registry, p)),
                    _ => render_class_expr(registry, p),
                })
                .collect();
            parts.join(" ⊓ ")
        }
        ClassExpr::HasValue { property, value } => format!(
            "∃{}.{{{}}}",
            render_entity(registry, *property),
            render_entity(registry, *value)
        ),
    }
}

pub fn render_axiom(registry: &EntityRegistry, axiom: &Axiom) -> String {
    let list = |classes: &[ClassExpr], sep: &str| {
        classes
            .iter()
            .map(|c| render_class_expr(registry, c))
            .collect::<Vec<_>>()
            .join(sep)
    };
    match axiom {
        Axiom::Declaration(id) => format!(
            "Declaration({} {})",
            registry
                .kind(*id)
                .map(|k| k.to_string())
                .unwrap_or_else(|| "Entity".to_string()),
            render_entity(registry, *id)
        ),
        Axiom::SubClassOf { sub, sup } => format!(
            "{} ⊑ {}",
            render_class_expr(registry, sub),
            render_class_expr(registry, sup)
        ),
        Axiom::EquivalentClasses(classes) => list(classes, " ≡ "),
        Axiom::DisjointClasses(classes) => {
            let named: Vec<ClassExpr> = classes.iter().copied().map(ClassExpr::from).collect();
            format!("Disjoint({})", list(&named, ", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;
    use crate::rules::{Variable, parse_query, parse_rule};

    fn registry() -> EntityRegistry {
        let registry = EntityRegistry::new();
        registry
            .intern("http://example.org/family#Person", EntityKind::Class)
            .unwrap();
        registry.intern("EnglishSpeaker", EntityKind::Class).unwrap();
        registry.intern("speaksLanguage", EntityKind::ObjectProperty).unwrap();
        registry
            .intern("http://example.org/people/John", EntityKind::Individual)
            .unwrap();
        registry
    }

    #[test]
    fn entities_use_short_names() {
        let reg = registry();
        let person = reg.lookup("http://example.org/family#Person").unwrap();
        let john = reg.lookup("http://example.org/people/John").unwrap();
        assert_eq!(render_entity(&reg, person), "Person");
        assert_eq!(render_fact(&reg, &Fact::membership(john, person)), "Person(John)");
    }

    #[test]
    fn rules_render_in_parseable_syntax() {
        let reg = registry();
        let text = "speaksLanguage(?x, English) ^ swrlb:notEqual(?x, English) -> EnglishSpeaker(?x)";
        let rule = parse_rule("r", text, &reg).unwrap();
        assert_eq!(render_rule(&reg, &rule), text);
    }

    #[test]
    fn iri_named_rules_round_trip() {
        let reg = registry();
        reg.intern("http://example.org/family#Man", EntityKind::Class).unwrap();
        let rule = parse_rule(
            "r",
            "http://example.org/family#Man(?x) ^ speaksLanguage(?x, http://example.org/people/John) -> Person(?x)",
            &reg,
        )
        .unwrap();

        let text = render_rule(&reg, &rule);
        assert_eq!(text, "Man(?x) ^ speaksLanguage(?x, John) -> Person(?x)");
        let reparsed = parse_rule("r", &text, &reg).unwrap();
        assert_eq!(reparsed.body(), rule.body());
        assert_eq!(reparsed.head(), rule.head());
    }

    #[test]
    fn clashing_local_names_render_qualified() {
        let reg = registry();
        let other = reg
            .intern("http://example.org/robots#Person", EntityKind::Class)
            .unwrap();
        assert_eq!(render_entity(&reg, other), "http://example.org/robots#Person");

        let rule = parse_rule("r", "http://example.org/robots#Person(?x) -> EnglishSpeaker(?x)", &reg)
            .unwrap();
        let reparsed = parse_rule("r", &render_rule(&reg, &rule), &reg).unwrap();
        assert_eq!(reparsed.body(), rule.body());
    }

    #[test]
    fn queries_render_select_head() {
        let reg = registry();
        let text = "speaksLanguage(?x, ?y) -> sqwrl:selectDistinct(?y, ?x)";
        let query = parse_query("q", text, &reg).unwrap();
        assert_eq!(render_query(&reg, &query), text);
        assert_eq!(query.projection()[0], Variable::new("y"));
    }

    #[test]
    fn axioms_use_dl_notation() {
        let reg = registry();
        let person = reg.lookup("http://example.org/family#Person").unwrap();
        let speaker = reg.lookup("EnglishSpeaker").unwrap();
        let speaks = reg.lookup("speaksLanguage").unwrap();
        let english = reg.intern("English", EntityKind::Individual).unwrap();

        let sub = Axiom::SubClassOf {
            sub: speaker.into(),
            sup: person.into(),
        };
        assert_eq!(render_axiom(&reg, &sub), "EnglishSpeaker ⊑ Person");

        let eq = Axiom::EquivalentClasses(vec![
            speaker.into(),
            ClassExpr::Intersection(vec![
                person.into(),
                ClassExpr::HasValue {
                    property: speaks,
                    value: english,
                },
            ]),
        ]);
        assert_eq!(
            render_axiom(&reg, &eq),
            "EnglishSpeaker ≡ Person ⊓ ∃speaksLanguage.{English}"
        );
        assert_eq!(
            render_axiom(&reg, &Axiom::DisjointClasses(vec![person, speaker])),
            "Disjoint(Person, EnglishSpeaker)"
        );
    }
}
