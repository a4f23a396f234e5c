use std::fmt;

use crate::{expr::{ComparatorOp, ScalarExpr, Truth}, query::Query};

#[derive(Clone, PartialEq)]
pub enum Predicate {
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    Compare { left: ScalarExpr, op: ComparatorOp, right: ScalarExpr },
    Between { expr: ScalarExpr, low: ScalarExpr, high: ScalarExpr, negated: bool },
    IsNull { expr: ScalarExpr, negated: bool },
    InList { expr: ScalarExpr, list: Vec<ScalarExpr>, negated: bool },
    InSubquery { expr: ScalarExpr, query: Box<Query>, negated: bool },
    Like { expr: ScalarExpr, pattern: ScalarExpr, negated: bool },
    Const3(Truth),
}

impl Predicate {
    pub fn compare(left: ScalarExpr, op: ComparatorOp, right: ScalarExpr) -> Self {
        Predicate::Compare { left, op, right }
    }

    pub fn eq(left: ScalarExpr, right: ScalarExpr) -> Self {
        Predicate::compare(left, ComparatorOp::Eq, right)
    }

    /// Conjunction; nested conjunctions are flattened.
    pub fn and(self, other: Predicate) -> Predicate {
        let mut items = match self {
            Predicate::And(items) => items,
            p => vec![p],
        };
        match other {
            Predicate::And(more) => items.extend(more),
            p => items.push(p),
        }
        Predicate::And(items)
    }

    /// Disjunction; nested disjunctions are flattened.
    pub fn or(self, other: Predicate) -> Predicate {
        let mut items = match self {
            Predicate::Or(items) => items,
            p => vec![p],
        };
        match other {
            Predicate::Or(more) => items.extend(more),
            p => items.push(p),
        }
        Predicate::Or(items)
    }

    /// Negation. Negating a negation yields the inner predicate.
    pub fn not(self) -> Predicate {
        match self {
            Predicate::Not(inner) => *inner,
            p => Predicate::Not(Box::new(p)),
        }
    }

    /// Conjunction of every item; `None` when there are none.
    pub fn all<I: IntoIterator<Item = Predicate>>(items: I) -> Option<Predicate> {
        items.into_iter().reduce(Predicate::and)
    }

    /// Disjunction of every item; `None` when there are none.
    pub fn any<I: IntoIterator<Item = Predicate>>(items: I) -> Option<Predicate> {
        items.into_iter().reduce(Predicate::or)
    }

    /// Visits every scalar operand, recursively. Subqueries are not entered.
    pub fn walk_scalars<'a>(&'a self, visit: &mut dyn FnMut(&'a ScalarExpr)) {
        match self {
            Predicate::And(items) | Predicate::Or(items) => items.iter().for_each(|p| p.walk_scalars(visit)),
            Predicate::Not(inner) => inner.walk_scalars(visit),
            Predicate::Compare { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            Predicate::Between { expr, low, high, .. } => {
                expr.walk(visit);
                low.walk(visit);
                high.walk(visit);
            }
            Predicate::IsNull { expr, .. } | Predicate::InSubquery { expr, .. } => expr.walk(visit),
            Predicate::InList { expr, list, .. } => {
                expr.walk(visit);
                list.iter().for_each(|e| e.walk(visit));
            }
            Predicate::Like { expr, pattern, .. } => {
                expr.walk(visit);
                pattern.walk(visit);
            }
            Predicate::Const3(_) => {}
        }
    }

    /// Visits every subquery reachable from this predicate, including the
    /// ones nested inside scalar operands.
    pub fn walk_subqueries<'a>(&'a self, visit: &mut dyn FnMut(&'a Query)) {
        if let Predicate::InSubquery { query, .. } = self {
            visit(query);
        }
        match self {
            Predicate::And(items) | Predicate::Or(items) => items.iter().for_each(|p| p.walk_subqueries(visit)),
            Predicate::Not(inner) => inner.walk_subqueries(visit),
            _ => self.walk_scalars(&mut |e| {
                if let ScalarExpr::Subquery(q) = e {
                    visit(q);
                }
            }),
        }
    }

    /// Applies `rewrite` to every scalar operand.
    pub fn transform(&self, rewrite: &mut dyn FnMut(&ScalarExpr) -> Option<ScalarExpr>) -> Predicate {
        match self {
            Predicate::And(items) => Predicate::And(items.iter().map(|p| p.transform(rewrite)).collect()),
            Predicate::Or(items) => Predicate::Or(items.iter().map(|p| p.transform(rewrite)).collect()),
            Predicate::Not(inner) => Predicate::Not(Box::new(inner.transform(rewrite))),
            Predicate::Compare { left, op, right } => Predicate::Compare {
                left: left.transform(rewrite),
                op: *op,
                right: right.transform(rewrite),
            },
            Predicate::Between { expr, low, high, negated } => Predicate::Between {
                expr: expr.transform(rewrite),
                low: low.transform(rewrite),
                high: high.transform(rewrite),
                negated: *negated,
            },
            Predicate::IsNull { expr, negated } => Predicate::IsNull { expr: expr.transform(rewrite), negated: *negated },
            Predicate::InList { expr, list, negated } => Predicate::InList {
                expr: expr.transform(rewrite),
                list: list.iter().map(|e| e.transform(rewrite)).collect(),
                negated: *negated,
            },
            Predicate::InSubquery { expr, query, negated } => Predicate::InSubquery {
                expr: expr.transform(rewrite),
                query: query.clone(),
                negated: *negated,
            },
            Predicate::Like { expr, pattern, negated } => Predicate::Like {
                expr: expr.transform(rewrite),
                pattern: pattern.transform(rewrite),
                negated: *negated,
            },
            Predicate::Const3(t) => Predicate::Const3(*t),
        }
    }
}

fn not_kw(negated: bool) -> &'static str {
    if negated { "not " } else { "" }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::And(items) => write!(f, "And{:?}", items),
            Predicate::Or(items) => write!(f, "Or{:?}", items),
            Predicate::Not(inner) => write!(f, "Not({:?})", inner),
            Predicate::Compare { left, op, right } => write!(f, "({} {} {})", left, op, right),
            Predicate::Between { expr, low, high, negated } => {
                write!(f, "({} {}between {} and {})", expr, not_kw(*negated), low, high)
            }
            Predicate::IsNull { expr, negated } => write!(f, "({} is {}null)", expr, not_kw(*negated)),
            Predicate::InList { expr, list, negated } => write!(f, "({} {}in {:?})", expr, not_kw(*negated), list),
            Predicate::InSubquery { expr, query, negated } => write!(f, "({} {}in ({}))", expr, not_kw(*negated), query),
            Predicate::Like { expr, pattern, negated } => write!(f, "({} {}like {})", expr, not_kw(*negated), pattern),
            Predicate::Const3(t) => write!(f, "{:?}", t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Literal;

    fn age_gt(n: i64) -> Predicate {
        Predicate::compare(ScalarExpr::column("member1", "age"), ComparatorOp::Gt, ScalarExpr::Literal(Literal::Int(n)))
    }

    #[test]
    pub fn test_and_flattens() {
        let p = age_gt(1).and(age_gt(2)).and(age_gt(3));
        match p {
            Predicate::And(items) => assert_eq!(items.len(), 3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    pub fn test_double_not_collapses() {
        let p = age_gt(10);
        assert_eq!(p.clone().not().not(), p);
    }

    #[test]
    pub fn test_all_of_nothing_is_none() {
        assert!(Predicate::all(Vec::new()).is_none());
        assert_eq!(Predicate::all(vec![age_gt(1)]), Some(age_gt(1)));
    }
}
