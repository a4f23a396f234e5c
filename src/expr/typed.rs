use std::{fmt, marker::PhantomData};

use serde_json::Value;

use crate::{
    entity::EntityPath,
    error::{QueryError, Result},
    expr::{ArithmeticOp, ComparatorOp, Function, Literal, Predicate, ScalarExpr, ValueType},
    query::{OrderBy, QueryBuilder},
};

/// Rust types an expression can evaluate to.
pub trait SqlType: Sized + Send + Sync + 'static {
    fn value_type() -> ValueType;

    /// Reads one column of a result row.
    fn from_value(value: &Value) -> Result<Self>;
}

fn unexpected<T>(expected: ValueType, value: &Value) -> Result<T> {
    QueryError::mismatch(format!("expected {:?} column, got {}", expected, value)).err()
}

impl SqlType for String {
    fn value_type() -> ValueType {
        ValueType::String
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => unexpected(ValueType::String, other),
        }
    }
}

impl SqlType for i64 {
    fn value_type() -> ValueType {
        ValueType::Int
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Ok(i),
                (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
                _ => unexpected(ValueType::Int, value),
            },
            other => unexpected(ValueType::Int, other),
        }
    }
}

impl SqlType for f64 {
    fn value_type() -> ValueType {
        ValueType::Float
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value.as_f64() {
            Some(f) => Ok(f),
            None => unexpected(ValueType::Float, value),
        }
    }
}

impl SqlType for bool {
    fn value_type() -> ValueType {
        ValueType::Bool
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => unexpected(ValueType::Bool, other),
        }
    }
}

impl<T: SqlType> SqlType for Option<T> {
    fn value_type() -> ValueType {
        T::value_type()
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Types that support ordering comparisons and `min`/`max`.
pub trait Comparable: SqlType {}
impl Comparable for i64 {}
impl Comparable for f64 {}
impl Comparable for String {}
impl<T: Comparable> Comparable for Option<T> {}

/// Types that support arithmetic and `sum`/`avg`.
pub trait Numeric: Comparable {}
impl Numeric for i64 {}
impl Numeric for f64 {}

/// Operand types accepted where a `T` is expected. Integers and floats mix
/// freely, as they do in the generated query text.
pub trait Compatible<T> {}
impl<T> Compatible<T> for T {}
impl Compatible<f64> for i64 {}
impl Compatible<i64> for f64 {}

/// A typed expression. `T` is the Rust type the expression evaluates to;
/// operations only accept operands of a compatible type.
pub struct Expr<T> {
    expr: ScalarExpr,
    _ty: PhantomData<fn() -> T>,
}

impl<T> Clone for Expr<T> {
    fn clone(&self) -> Self {
        Self { expr: self.expr.clone(), _ty: PhantomData }
    }
}

impl<T> fmt::Debug for Expr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expr({})", self.expr)
    }
}

impl<T> fmt::Display for Expr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)
    }
}

/// Anything usable as an operand of type `T`: typed expressions, plain
/// Rust values (bound as parameters) and scalar subqueries.
pub trait IntoExpr<T> {
    fn into_operand(self) -> ScalarExpr;
}

impl<T, U: Compatible<T>> IntoExpr<T> for Expr<U> {
    fn into_operand(self) -> ScalarExpr {
        self.expr
    }
}

impl<T, U: Compatible<T>> IntoExpr<T> for &Expr<U> {
    fn into_operand(self) -> ScalarExpr {
        self.expr.clone()
    }
}

impl<T, U: Compatible<T>> IntoExpr<T> for QueryBuilder<U> {
    fn into_operand(self) -> ScalarExpr {
        ScalarExpr::Subquery(Box::new(self.into_query()))
    }
}

macro_rules! literal_operand {
    ($target:ty => $($source:ty),+) => {
        $(
            impl IntoExpr<$target> for $source {
                fn into_operand(self) -> ScalarExpr {
                    ScalarExpr::Literal(Literal::from(self))
                }
            }
        )+
    };
}

literal_operand!(String => &str, String);
literal_operand!(i64 => i64);
literal_operand!(f64 => f64);
literal_operand!(bool => bool);

impl IntoExpr<String> for &String {
    fn into_operand(self) -> ScalarExpr {
        ScalarExpr::Literal(Literal::String(self.clone()))
    }
}

impl IntoExpr<i64> for i32 {
    fn into_operand(self) -> ScalarExpr {
        ScalarExpr::Literal(Literal::Int(self as i64))
    }
}

/// Untyped conversion for grouping keys.
pub trait IntoScalar {
    fn into_scalar_expr(self) -> ScalarExpr;
}

impl<T> IntoScalar for Expr<T> {
    fn into_scalar_expr(self) -> ScalarExpr {
        self.expr
    }
}

impl<T> IntoScalar for &Expr<T> {
    fn into_scalar_expr(self) -> ScalarExpr {
        self.expr.clone()
    }
}

impl<P: EntityPath> IntoScalar for &P {
    fn into_scalar_expr(self) -> ScalarExpr {
        ScalarExpr::Entity(self.alias().to_string())
    }
}

/// An expression carrying an output alias (`expr as alias`).
pub struct Named<T> {
    pub(crate) expr: ScalarExpr,
    pub(crate) alias: String,
    _ty: PhantomData<fn() -> T>,
}

impl<T> Named<T> {
    pub(crate) fn new(expr: ScalarExpr, alias: &str) -> Self {
        Self { expr, alias: alias.to_string(), _ty: PhantomData }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn scalar(&self) -> &ScalarExpr {
        &self.expr
    }
}

impl<T> Clone for Named<T> {
    fn clone(&self) -> Self {
        Self::new(self.expr.clone(), &self.alias)
    }
}

impl<T> fmt::Debug for Named<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Named({} as {})", self.expr, self.alias)
    }
}

impl<T> Expr<T> {
    /// Wraps an untyped tree. The caller vouches for `T`.
    pub fn from_scalar(expr: ScalarExpr) -> Self {
        Self { expr, _ty: PhantomData }
    }

    /// Path to an attribute of the entity bound to `alias`.
    pub fn attribute(alias: &str, field: &str) -> Self {
        Self::from_scalar(ScalarExpr::column(alias, field))
    }

    pub fn scalar(&self) -> &ScalarExpr {
        &self.expr
    }

    pub fn into_scalar(self) -> ScalarExpr {
        self.expr
    }

    fn function<R>(&self, name: &str, extra: Vec<ScalarExpr>) -> Expr<R> {
        let mut args = vec![self.expr.clone()];
        args.extend(extra);
        Expr::from_scalar(ScalarExpr::function(name, args))
    }

    fn compare(&self, op: ComparatorOp, rhs: ScalarExpr) -> Predicate {
        Predicate::compare(self.expr.clone(), op, rhs)
    }

    fn arithmetic(&self, op: ArithmeticOp, rhs: ScalarExpr) -> Expr<T> {
        Expr::from_scalar(ScalarExpr::Arithmetic { left: Box::new(self.expr.clone()), op, right: Box::new(rhs) })
    }
}

impl<T: SqlType> Expr<T> {
    pub fn eq(&self, rhs: impl IntoExpr<T>) -> Predicate {
        self.compare(ComparatorOp::Eq, rhs.into_operand())
    }

    pub fn ne(&self, rhs: impl IntoExpr<T>) -> Predicate {
        self.compare(ComparatorOp::NotEq, rhs.into_operand())
    }

    pub fn is_null(&self) -> Predicate {
        Predicate::IsNull { expr: self.expr.clone(), negated: false }
    }

    pub fn is_not_null(&self) -> Predicate {
        Predicate::IsNull { expr: self.expr.clone(), negated: true }
    }

    pub fn in_list<I, V>(&self, values: I) -> Predicate
    where
        I: IntoIterator<Item = V>,
        V: IntoExpr<T>,
    {
        Predicate::InList {
            expr: self.expr.clone(),
            list: values.into_iter().map(IntoExpr::into_operand).collect(),
            negated: false,
        }
    }

    pub fn not_in<I, V>(&self, values: I) -> Predicate
    where
        I: IntoIterator<Item = V>,
        V: IntoExpr<T>,
    {
        match self.in_list(values) {
            Predicate::InList { expr, list, .. } => Predicate::InList { expr, list, negated: true },
            other => other.not(),
        }
    }

    pub fn in_subquery<U: Compatible<T>>(&self, subquery: QueryBuilder<U>) -> Predicate {
        Predicate::InSubquery { expr: self.expr.clone(), query: Box::new(subquery.into_query()), negated: false }
    }

    pub fn not_in_subquery<U: Compatible<T>>(&self, subquery: QueryBuilder<U>) -> Predicate {
        Predicate::InSubquery { expr: self.expr.clone(), query: Box::new(subquery.into_query()), negated: true }
    }

    pub fn count(&self) -> Expr<i64> {
        self.function("count", vec![])
    }

    pub fn count_distinct(&self) -> Expr<i64> {
        Expr::from_scalar(ScalarExpr::Function(Function::distinct("count", vec![self.expr.clone()])))
    }

    /// String rendering of the value (`str(x)` in JPQL).
    pub fn string_value(&self) -> Expr<String> {
        self.function("str", vec![])
    }

    pub fn coalesce(&self, fallback: impl IntoExpr<T>) -> Expr<T> {
        self.function("coalesce", vec![fallback.into_operand()])
    }

    pub fn as_(&self, alias: &str) -> Named<T> {
        Named::new(self.expr.clone(), alias)
    }

    /// The same expression typed as possibly null, for projections that
    /// may produce nulls (left joins, empty aggregates).
    pub fn nullable(&self) -> Expr<Option<T>> {
        Expr::from_scalar(self.expr.clone())
    }

    pub fn asc(&self) -> OrderBy {
        OrderBy::asc(self.expr.clone())
    }

    pub fn desc(&self) -> OrderBy {
        OrderBy::desc(self.expr.clone())
    }
}

impl<T: Comparable> Expr<T> {
    pub fn gt(&self, rhs: impl IntoExpr<T>) -> Predicate {
        self.compare(ComparatorOp::Gt, rhs.into_operand())
    }

    pub fn goe(&self, rhs: impl IntoExpr<T>) -> Predicate {
        self.compare(ComparatorOp::GtEq, rhs.into_operand())
    }

    pub fn lt(&self, rhs: impl IntoExpr<T>) -> Predicate {
        self.compare(ComparatorOp::Lt, rhs.into_operand())
    }

    pub fn loe(&self, rhs: impl IntoExpr<T>) -> Predicate {
        self.compare(ComparatorOp::LtEq, rhs.into_operand())
    }

    pub fn between(&self, low: impl IntoExpr<T>, high: impl IntoExpr<T>) -> Predicate {
        Predicate::Between { expr: self.expr.clone(), low: low.into_operand(), high: high.into_operand(), negated: false }
    }

    pub fn not_between(&self, low: impl IntoExpr<T>, high: impl IntoExpr<T>) -> Predicate {
        Predicate::Between { expr: self.expr.clone(), low: low.into_operand(), high: high.into_operand(), negated: true }
    }

    /// Null over zero rows, like `min`, `sum` and `avg`. Select it through
    /// `nullable()` when the input may be empty; reading a null into `T`
    /// fails with `ProjectionMismatch`.
    pub fn max(&self) -> Expr<T> {
        self.function("max", vec![])
    }

    pub fn min(&self) -> Expr<T> {
        self.function("min", vec![])
    }
}

impl<T: Numeric> Expr<T> {
    pub fn sum(&self) -> Expr<T> {
        self.function("sum", vec![])
    }

    pub fn avg(&self) -> Expr<f64> {
        self.function("avg", vec![])
    }

    pub fn add(&self, rhs: impl IntoExpr<T>) -> Expr<T> {
        self.arithmetic(ArithmeticOp::Add, rhs.into_operand())
    }

    pub fn subtract(&self, rhs: impl IntoExpr<T>) -> Expr<T> {
        self.arithmetic(ArithmeticOp::Sub, rhs.into_operand())
    }

    pub fn multiply(&self, rhs: impl IntoExpr<T>) -> Expr<T> {
        self.arithmetic(ArithmeticOp::Mul, rhs.into_operand())
    }

    pub fn divide(&self, rhs: impl IntoExpr<T>) -> Expr<T> {
        self.arithmetic(ArithmeticOp::Div, rhs.into_operand())
    }
}

impl Expr<String> {
    pub fn like(&self, pattern: impl IntoExpr<String>) -> Predicate {
        Predicate::Like { expr: self.expr.clone(), pattern: pattern.into_operand(), negated: false }
    }

    pub fn not_like(&self, pattern: impl IntoExpr<String>) -> Predicate {
        Predicate::Like { expr: self.expr.clone(), pattern: pattern.into_operand(), negated: true }
    }

    pub fn contains(&self, part: &str) -> Predicate {
        self.like(format!("%{part}%"))
    }

    pub fn starts_with(&self, prefix: &str) -> Predicate {
        self.like(format!("{prefix}%"))
    }

    pub fn ends_with(&self, suffix: &str) -> Predicate {
        self.like(format!("%{suffix}"))
    }

    pub fn concat(&self, rhs: impl IntoExpr<String>) -> Expr<String> {
        self.function("concat", vec![rhs.into_operand()])
    }

    pub fn upper(&self) -> Expr<String> {
        self.function("upper", vec![])
    }

    pub fn lower(&self) -> Expr<String> {
        self.function("lower", vec![])
    }

    pub fn trim(&self) -> Expr<String> {
        self.function("trim", vec![])
    }

    pub fn length(&self) -> Expr<i64> {
        self.function("length", vec![])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn age() -> Expr<i64> {
        Expr::attribute("member1", "age")
    }

    fn username() -> Expr<String> {
        Expr::attribute("member1", "username")
    }

    #[test]
    pub fn test_comparison_binds_literal() {
        match age().goe(30) {
            Predicate::Compare { left, op, right } => {
                assert_eq!(left, ScalarExpr::column("member1", "age"));
                assert_eq!(op, ComparatorOp::GtEq);
                assert_eq!(right, ScalarExpr::Literal(Literal::Int(30)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    pub fn test_expressions_are_immutable_values() {
        let base = username();
        let longer = base.concat("_");
        assert_eq!(base.scalar(), &ScalarExpr::column("member1", "username"));
        assert_eq!(longer.to_string(), "concat(member1.username, '_')");
    }

    #[test]
    pub fn test_integer_and_float_operands_mix() {
        let avg: Expr<f64> = age().avg();
        match age().goe(&avg) {
            Predicate::Compare { right, .. } => assert_eq!(&right, avg.scalar()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    pub fn test_sql_type_decoding() {
        assert_eq!(i64::from_value(&json!(40)).unwrap(), 40);
        assert_eq!(i64::from_value(&json!(40.0)).unwrap(), 40);
        assert_eq!(f64::from_value(&json!(25)).unwrap(), 25.0);
        assert_eq!(Option::<String>::from_value(&Value::Null).unwrap(), None);
        assert!(matches!(String::from_value(&json!(1)), Err(QueryError::ProjectionMismatch(_))));
    }

    #[test]
    pub fn test_not_in_is_negated_in_list() {
        match age().not_in([10, 20]) {
            Predicate::InList { list, negated, .. } => {
                assert!(negated);
                assert_eq!(list.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
