//! Comparison builtins.
//!
//! Builtins are filters: they never bind variables, and every argument must
//! already be bound when they run. Ordering compares the entities' local
//! names, numerically when both parse as finite numbers and lexically
//! otherwise.
//!
//! Equality is entity identity, not numeric value: `42` and `42.0` are
//! distinct entities, so `equal` rejects them even though both
//! `lessThanOrEqual` and `greaterThanOrEqual` accept the pair.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::entity::short_name;
use crate::error::MatchError;
use crate::registry::EntityRegistry;
use crate::rules::Term;

use super::binding::Binding;

/// The supported builtin predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl BuiltinOp {
    /// Parse a builtin name, with or without the `swrlb:` prefix.
    pub fn parse(name: &str) -> Option<Self> {
        let local = name.strip_prefix("swrlb:").unwrap_or(name);
        match local {
            "equal" => Some(Self::Equal),
            "notEqual" => Some(Self::NotEqual),
            "lessThan" => Some(Self::LessThan),
            "lessThanOrEqual" => Some(Self::LessThanOrEqual),
            "greaterThan" => Some(Self::GreaterThan),
            "greaterThanOrEqual" => Some(Self::GreaterThanOrEqual),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Equal => "swrlb:equal",
            Self::NotEqual => "swrlb:notEqual",
            Self::LessThan => "swrlb:lessThan",
            Self::LessThanOrEqual => "swrlb:lessThanOrEqual",
            Self::GreaterThan => "swrlb:greaterThan",
            Self::GreaterThanOrEqual => "swrlb:greaterThanOrEqual",
        }
    }

    pub fn arity(self) -> usize {
        2
    }

    /// Evaluate against a binding that must cover every variable argument.
    pub fn evaluate(
        self,
        args: &[Term],
        binding: &Binding,
        registry: &EntityRegistry,
    ) -> Result<bool, MatchError> {
        let values = args
            .iter()
            .map(|term| {
                binding.resolve(term).ok_or_else(|| MatchError::UnboundBuiltinArgument {
                    builtin: self.name().to_string(),
                    variable: match term {
                        Term::Variable(var) => var.name().to_string(),
                        Term::Constant(id) => id.to_string(),
                    },
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let [left, right] = values[..] else {
            return Ok(false);
        };

        Ok(match self {
            Self::Equal => left == right,
            Self::NotEqual => left != right,
            ordering_op => {
                let ordering = compare_names(&registry.name(left), &registry.name(right));
                match (ordering_op, ordering) {
                    (_, None) => false,
                    (Self::LessThan, Some(o)) => o == Ordering::Less,
                    (Self::LessThanOrEqual, Some(o)) => o != Ordering::Greater,
                    (Self::GreaterThan, Some(o)) => o == Ordering::Greater,
                    (Self::GreaterThanOrEqual, Some(o)) => o != Ordering::Less,
                    _ => false,
                }
            }
        })
    }
}

impl std::fmt::Display for BuiltinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn compare_names(a: &str, b: &str) -> Option<Ordering> {
    let (a, b) = (short_name(a), short_name(b));
    match (finite(a), finite(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y),
        _ => Some(a.cmp(b)),
    }
}

/// `inf`, `infinity` and `NaN` are names, not numbers.
fn finite(name: &str) -> Option<f64> {
    name.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;
    use crate::rules::Variable;

    fn setup() -> (EntityRegistry, Term, Term, Term) {
        let reg = EntityRegistry::new();
        let nine = reg.intern("9", EntityKind::Individual).unwrap();
        let ten = reg.intern("10", EntityKind::Individual).unwrap();
        let alice = reg.intern("Alice", EntityKind::Individual).unwrap();
        (
            reg,
            Term::Constant(nine),
            Term::Constant(ten),
            Term::Constant(alice),
        )
    }

    #[test]
    fn parse_accepts_prefixed_and_bare_names() {
        assert_eq!(BuiltinOp::parse("swrlb:lessThan"), Some(BuiltinOp::LessThan));
        assert_eq!(BuiltinOp::parse("notEqual"), Some(BuiltinOp::NotEqual));
        assert_eq!(BuiltinOp::parse("swrlb:add"), None);
    }

    #[test]
    fn numeric_names_compare_numerically() {
        let (reg, nine, ten, _) = setup();
        let b = Binding::new();
        assert!(BuiltinOp::LessThan.evaluate(&[nine.clone(), ten.clone()], &b, &reg).unwrap());
        assert!(!BuiltinOp::GreaterThan.evaluate(&[nine, ten], &b, &reg).unwrap());
    }

    #[test]
    fn mixed_names_compare_lexically() {
        let (reg, _, ten, alice) = setup();
        let b = Binding::new();
        assert!(BuiltinOp::LessThan.evaluate(&[ten, alice], &b, &reg).unwrap());
    }

    #[test]
    fn equality_is_identity() {
        let (reg, nine, ten, _) = setup();
        let b = Binding::new();
        assert!(BuiltinOp::Equal.evaluate(&[nine.clone(), nine.clone()], &b, &reg).unwrap());
        assert!(BuiltinOp::NotEqual.evaluate(&[nine, ten], &b, &reg).unwrap());
    }

    #[test]
    fn unbound_argument_is_reported() {
        let (reg, nine, _, _) = setup();
        let err = BuiltinOp::Equal
            .evaluate(&[Term::Variable(Variable::new("x")), nine], &Binding::new(), &reg)
            .unwrap_err();
        assert_eq!(
            err,
            MatchError::UnboundBuiltinArgument {
                builtin: "swrlb:equal".into(),
                variable: "x".into(),
            }
        );
    }

    #[test]
    fn non_finite_names_compare_lexically() {
        let reg = EntityRegistry::new();
        let b = Binding::new();
        let neg_inf = Term::Constant(reg.intern("-inf", EntityKind::Individual).unwrap());
        let neg_five = Term::Constant(reg.intern("-5", EntityKind::Individual).unwrap());
        let nan = Term::Constant(reg.intern("NaN", EntityKind::Individual).unwrap());
        let ten = Term::Constant(reg.intern("10", EntityKind::Individual).unwrap());

        assert!(BuiltinOp::GreaterThan.evaluate(&[neg_inf, neg_five], &b, &reg).unwrap());
        assert!(BuiltinOp::LessThan.evaluate(&[ten, nan.clone()], &b, &reg).unwrap());
        assert!(BuiltinOp::Equal.evaluate(&[nan.clone(), nan.clone()], &b, &reg).unwrap());
        assert!(BuiltinOp::LessThanOrEqual.evaluate(&[nan.clone(), nan], &b, &reg).unwrap());
    }

    #[test]
    fn equal_is_identity_while_ordering_is_numeric() {
        let reg = EntityRegistry::new();
        let b = Binding::new();
        let int = Term::Constant(reg.intern("42", EntityKind::Individual).unwrap());
        let dec = Term::Constant(reg.intern("42.0", EntityKind::Individual).unwrap());
        let pair = [int, dec];

        assert!(!BuiltinOp::Equal.evaluate(&pair, &b, &reg).unwrap());
        assert!(BuiltinOp::LessThanOrEqual.evaluate(&pair, &b, &reg).unwrap());
        assert!(BuiltinOp::GreaterThanOrEqual.evaluate(&pair, &b, &reg).unwrap());
    }
}
