use crate::expr::{Expr, IntoExpr, SqlType};

/// Free-standing expression constructors.
pub struct Expressions;

impl Expressions {
    /// A constant column. It is bound as a parameter like any other literal.
    pub fn constant<T: SqlType>(value: impl IntoExpr<T>) -> Expr<T> {
        Expr::from_scalar(value.into_operand())
    }

    pub fn path<T: SqlType>(alias: &str, field: &str) -> Expr<T> {
        Expr::attribute(alias, field)
    }
}
