use std::marker::PhantomData;

use crate::expr::{CaseExpr, Expr, IntoExpr, Predicate, ScalarExpr, SqlType};

/// Entry point for searched case expressions:
/// `CaseBuilder::new().when(p).then(v)...otherwise(v)`.
///
/// Each step returns a different type, so a case without a fallback or a
/// `when` without its `then` does not compile.
#[derive(Debug, Default, Clone, Copy)]
pub struct CaseBuilder;

impl CaseBuilder {
    pub fn new() -> Self {
        CaseBuilder
    }

    pub fn when(self, condition: Predicate) -> CaseWhen {
        CaseWhen { condition }
    }
}

/// First `when`, waiting for its result. The result type is fixed here.
#[derive(Debug, Clone)]
pub struct CaseWhen {
    condition: Predicate,
}

impl CaseWhen {
    pub fn then<R: SqlType>(self, value: impl IntoExpr<R>) -> Cases<R> {
        Cases { branches: vec![(self.condition, value.into_operand())], _ty: PhantomData }
    }
}

/// One or more complete branches.
pub struct Cases<R> {
    branches: Vec<(Predicate, ScalarExpr)>,
    _ty: PhantomData<fn() -> R>,
}

impl<R: SqlType> Cases<R> {
    pub fn when(self, condition: Predicate) -> CasesWhen<R> {
        CasesWhen { branches: self.branches, condition, _ty: PhantomData }
    }

    pub fn otherwise(self, value: impl IntoExpr<R>) -> Expr<R> {
        Expr::from_scalar(ScalarExpr::Case(CaseExpr { branches: self.branches, otherwise: Box::new(value.into_operand()) }))
    }
}

pub struct CasesWhen<R> {
    branches: Vec<(Predicate, ScalarExpr)>,
    condition: Predicate,
    _ty: PhantomData<fn() -> R>,
}

impl<R: SqlType> CasesWhen<R> {
    pub fn then(mut self, value: impl IntoExpr<R>) -> Cases<R> {
        self.branches.push((self.condition, value.into_operand()));
        Cases { branches: self.branches, _ty: PhantomData }
    }
}

impl<T: SqlType> Expr<T> {
    /// Simple case over this expression: `age.when(10).then("ten")...`.
    /// Each branch is an equality test against the subject.
    pub fn when(&self, value: impl IntoExpr<T>) -> SimpleCaseWhen<T> {
        SimpleCaseWhen { subject: self.clone(), condition: self.eq(value) }
    }
}

pub struct SimpleCaseWhen<T> {
    subject: Expr<T>,
    condition: Predicate,
}

impl<T: SqlType> SimpleCaseWhen<T> {
    pub fn then<R: SqlType>(self, value: impl IntoExpr<R>) -> SimpleCases<T, R> {
        SimpleCases { subject: self.subject, branches: vec![(self.condition, value.into_operand())], _ty: PhantomData }
    }
}

pub struct SimpleCases<T, R> {
    subject: Expr<T>,
    branches: Vec<(Predicate, ScalarExpr)>,
    _ty: PhantomData<fn() -> R>,
}

impl<T: SqlType, R: SqlType> SimpleCases<T, R> {
    pub fn when(self, value: impl IntoExpr<T>) -> SimpleCasesWhen<T, R> {
        let condition = self.subject.eq(value);
        SimpleCasesWhen { cases: self, condition }
    }

    pub fn otherwise(self, value: impl IntoExpr<R>) -> Expr<R> {
        Expr::from_scalar(ScalarExpr::Case(CaseExpr { branches: self.branches, otherwise: Box::new(value.into_operand()) }))
    }
}

pub struct SimpleCasesWhen<T, R> {
    cases: SimpleCases<T, R>,
    condition: Predicate,
}

impl<T: SqlType, R: SqlType> SimpleCasesWhen<T, R> {
    pub fn then(self, value: impl IntoExpr<R>) -> SimpleCases<T, R> {
        let mut cases = self.cases;
        cases.branches.push((self.condition, value.into_operand()));
        cases
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Literal;

    #[test]
    pub fn test_simple_case_becomes_searched_case() {
        let age: Expr<i64> = Expr::attribute("member1", "age");
        let label = age.when(10).then("ten").when(20).then("twenty").otherwise("other");

        match label.scalar() {
            ScalarExpr::Case(case) => {
                assert_eq!(case.branches.len(), 2);
                assert_eq!(case.branches[0].0, age.eq(10));
                assert_eq!(case.branches[1].1, ScalarExpr::Literal(Literal::from("twenty")));
                assert_eq!(*case.otherwise, ScalarExpr::Literal(Literal::from("other")));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    pub fn test_searched_case_keeps_branch_order() {
        let age: Expr<i64> = Expr::attribute("member1", "age");
        let rank = CaseBuilder::new()
            .when(age.between(0, 20))
            .then(2i64)
            .when(age.between(21, 30))
            .then(1i64)
            .otherwise(3i64);

        match rank.scalar() {
            ScalarExpr::Case(case) => {
                assert_eq!(case.branches[0].1, ScalarExpr::Literal(Literal::Int(2)));
                assert_eq!(case.branches[1].1, ScalarExpr::Literal(Literal::Int(1)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
