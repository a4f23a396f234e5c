use std::fmt;

use crate::{expr::{ArithmeticOp, Column, Function, Literal, Predicate}, query::Query};

/// Untyped expression tree shared by the builder, the analyzer, the
/// translator and the in-memory executor.
#[derive(Clone, PartialEq)]
pub enum ScalarExpr {
    Literal(Literal),
    Column(Column),
    /// A whole entity in scope, by alias.
    Entity(String),
    Function(Function),
    Arithmetic { left: Box<ScalarExpr>, op: ArithmeticOp, right: Box<ScalarExpr> },
    Case(CaseExpr),
    /// A nested query whose single projected column is used as a value.
    Subquery(Box<Query>),
    /// `*`, only meaningful inside `count`.
    WildCard,
}

/// Searched case: the first branch whose condition holds wins.
#[derive(Clone, PartialEq)]
pub struct CaseExpr {
    pub branches: Vec<(Predicate, ScalarExpr)>,
    pub otherwise: Box<ScalarExpr>,
}

impl ScalarExpr {
    pub fn column(alias: &str, field: &str) -> Self {
        ScalarExpr::Column(Column::attribute(alias, field))
    }

    pub fn function(name: &str, args: Vec<ScalarExpr>) -> Self {
        ScalarExpr::Function(Function::new(name, args))
    }

    /// Visits this node and every descendant expression, including the ones
    /// nested in case conditions. Subqueries are reported but not entered.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a ScalarExpr)) {
        visit(self);
        match self {
            ScalarExpr::Function(fun) => fun.args.iter().for_each(|a| a.walk(visit)),
            ScalarExpr::Arithmetic { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            ScalarExpr::Case(case) => {
                for (when, then) in &case.branches {
                    when.walk_scalars(visit);
                    then.walk(visit);
                }
                case.otherwise.walk(visit);
            }
            ScalarExpr::Literal(_)
            | ScalarExpr::Column(_)
            | ScalarExpr::Entity(_)
            | ScalarExpr::Subquery(_)
            | ScalarExpr::WildCard => {}
        }
    }

    /// Rebuilds the tree bottom-up, letting `rewrite` replace any node. A
    /// node replaced by `rewrite` is not descended into.
    pub fn transform(&self, rewrite: &mut dyn FnMut(&ScalarExpr) -> Option<ScalarExpr>) -> ScalarExpr {
        if let Some(replaced) = rewrite(self) {
            return replaced;
        }
        match self {
            ScalarExpr::Function(fun) => ScalarExpr::Function(Function {
                name: fun.name.clone(),
                args: fun.args.iter().map(|a| a.transform(rewrite)).collect(),
                distinct: fun.distinct,
            }),
            ScalarExpr::Arithmetic { left, op, right } => ScalarExpr::Arithmetic {
                left: Box::new(left.transform(rewrite)),
                op: *op,
                right: Box::new(right.transform(rewrite)),
            },
            ScalarExpr::Case(case) => ScalarExpr::Case(CaseExpr {
                branches: case
                    .branches
                    .iter()
                    .map(|(when, then)| (when.transform(rewrite), then.transform(rewrite)))
                    .collect(),
                otherwise: Box::new(case.otherwise.transform(rewrite)),
            }),
            other => other.clone(),
        }
    }
}

impl fmt::Display for ScalarExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarExpr::Literal(l) => write!(f, "{}", l),
            ScalarExpr::Column(c) => write!(f, "{}", c),
            ScalarExpr::Entity(alias) => write!(f, "{}", alias),
            ScalarExpr::Function(fun) => write!(f, "{}", fun),
            ScalarExpr::Arithmetic { left, op, right } => write!(f, "({} {} {})", left, op, right),
            ScalarExpr::Case(case) => {
                write!(f, "case")?;
                for (when, then) in &case.branches {
                    write!(f, " when {:?} then {}", when, then)?;
                }
                write!(f, " else {} end", case.otherwise)
            }
            ScalarExpr::Subquery(q) => write!(f, "({})", q),
            ScalarExpr::WildCard => write!(f, "*"),
        }
    }
}

impl fmt::Debug for ScalarExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarExpr::Literal(l) => write!(f, "Literal({:?})", l),
            ScalarExpr::Column(_) => write!(f, "Column({})", self),
            ScalarExpr::Entity(_) => write!(f, "Entity({})", self),
            ScalarExpr::Function(_) => write!(f, "Function({})", self),
            ScalarExpr::Arithmetic { .. } => write!(f, "Arithmetic{}", self),
            ScalarExpr::Case(_) => write!(f, "Case({})", self),
            ScalarExpr::Subquery(q) => write!(f, "Subquery({:?})", q),
            ScalarExpr::WildCard => write!(f, "WildCard(*)"),
        }
    }
}

impl fmt::Debug for CaseExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", ScalarExpr::Case(self.clone()))
    }
}
