//! CTL abstract syntax

use serde::{Deserialize, Serialize};
use std::fmt;

/// A Computation Tree Logic formula
///
/// The set of variants is closed; every operator has a dedicated
/// evaluation rule in [`crate::eval`], so there is no "unknown operator"
/// case at runtime. Formulas are immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Formula {
    /// Holds in every state
    True,
    /// Holds in no state
    False,
    /// Atomic proposition, true where the state is labeled with it
    Atom(String),
    Not(Box<Formula>),
    And(Box<Formula>, Box<Formula>),
    Or(Box<Formula>, Box<Formula>),
    /// Some successor satisfies the operand
    Ex(Box<Formula>),
    /// Every successor satisfies the operand
    Ax(Box<Formula>),
    /// Some path eventually reaches the operand
    Ef(Box<Formula>),
    /// Every path eventually reaches the operand
    Af(Box<Formula>),
    /// Some path satisfies the operand forever
    Eg(Box<Formula>),
    /// Every path satisfies the operand forever
    Ag(Box<Formula>),
    /// `E[f U g]`
    Eu(Box<Formula>, Box<Formula>),
    /// `A[f U g]`
    Au(Box<Formula>, Box<Formula>),
}

impl Formula {
    pub fn atom(name: impl Into<String>) -> Self {
        Self::Atom(name.into())
    }

    pub fn and(lhs: Formula, rhs: Formula) -> Self {
        Self::And(Box::new(lhs), Box::new(rhs))
    }

    pub fn or(lhs: Formula, rhs: Formula) -> Self {
        Self::Or(Box::new(lhs), Box::new(rhs))
    }

    /// `lhs -> rhs`, lowered to `!lhs | rhs`
    pub fn implies(lhs: Formula, rhs: Formula) -> Self {
        Self::or(lhs.not(), rhs)
    }

    pub fn eu(hold: Formula, until: Formula) -> Self {
        Self::Eu(Box::new(hold), Box::new(until))
    }

    pub fn au(hold: Formula, until: Formula) -> Self {
        Self::Au(Box::new(hold), Box::new(until))
    }

    // The fluent forms below read left to right: `atom("p").ef().ag()` is AG EF p.

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    pub fn ex(self) -> Self {
        Self::Ex(Box::new(self))
    }

    pub fn ax(self) -> Self {
        Self::Ax(Box::new(self))
    }

    pub fn ef(self) -> Self {
        Self::Ef(Box::new(self))
    }

    pub fn af(self) -> Self {
        Self::Af(Box::new(self))
    }

    pub fn eg(self) -> Self {
        Self::Eg(Box::new(self))
    }

    pub fn ag(self) -> Self {
        Self::Ag(Box::new(self))
    }

    /// Number of nodes in the syntax tree
    pub fn size(&self) -> usize {
        match self {
            Self::True | Self::False | Self::Atom(_) => 1,
            Self::Not(f)
            | Self::Ex(f)
            | Self::Ax(f)
            | Self::Ef(f)
            | Self::Af(f)
            | Self::Eg(f)
            | Self::Ag(f) => 1 + f.size(),
            Self::And(f, g) | Self::Or(f, g) | Self::Eu(f, g) | Self::Au(f, g) => {
                1 + f.size() + g.size()
            }
        }
    }

    /// Atomic propositions mentioned anywhere in the formula, sorted and deduplicated
    pub fn atoms(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_atoms(&mut out);
        out.sort_unstable();
        out.dedup();
        out
    }

    fn collect_atoms<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::True | Self::False => {}
            Self::Atom(name) => out.push(name),
            Self::Not(f)
            | Self::Ex(f)
            | Self::Ax(f)
            | Self::Ef(f)
            | Self::Af(f)
            | Self::Eg(f)
            | Self::Ag(f) => f.collect_atoms(out),
            Self::And(f, g) | Self::Or(f, g) | Self::Eu(f, g) | Self::Au(f, g) => {
                f.collect_atoms(out);
                g.collect_atoms(out);
            }
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => write!(f, "true"),
            Self::False => write!(f, "false"),
            Self::Atom(name) => write!(f, "{}", name),
            Self::Not(inner) => write!(f, "!{}", inner),
            Self::And(lhs, rhs) => write!(f, "({} & {})", lhs, rhs),
            Self::Or(lhs, rhs) => write!(f, "({} | {})", lhs, rhs),
            Self::Ex(inner) => write!(f, "EX {}", inner),
            Self::Ax(inner) => write!(f, "AX {}", inner),
            Self::Ef(inner) => write!(f, "EF {}", inner),
            Self::Af(inner) => write!(f, "AF {}", inner),
            Self::Eg(inner) => write!(f, "EG {}", inner),
            Self::Ag(inner) => write!(f, "AG {}", inner),
            Self::Eu(lhs, rhs) => write!(f, "E[{} U {}]", lhs, rhs),
            Self::Au(lhs, rhs) => write!(f, "A[{} U {}]", lhs, rhs),
        }
    }
}
