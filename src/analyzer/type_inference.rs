use crate::{
    aggregates::DEFAULT_AGGREGATES,
    analyzer::{AnalysisContext, Analyzer},
    error::{QueryError, Result},
    expr::{Column, Function, Predicate, ScalarExpr, ValueType},
};

#[derive(Default)]
pub struct TypeInference;

impl TypeInference {
    /// Type and nullability of an expression. Resolves every attribute
    /// against `ctx` and validates nested subqueries on the way.
    pub fn infer(expr: &ScalarExpr, ctx: &AnalysisContext) -> Result<(ValueType, bool)> {
        match expr {
            ScalarExpr::Literal(literal) => {
                let ty = literal.value_type();
                Ok((ty, ty == ValueType::Null))
            }
            ScalarExpr::Column(Column::Attribute { alias, field }) => {
                let info = ctx.resolve_field(alias, field)?;
                Ok((info.ty, info.nullable))
            }
            ScalarExpr::Column(Column::Derived { name }) => {
                QueryError::invalid(format!("internal column '{}' cannot appear in a query", name)).err()
            }
            ScalarExpr::Entity(alias) => {
                ctx.resolve_entity(alias)?;
                Ok((ValueType::Object, true))
            }
            ScalarExpr::Function(function) => match DEFAULT_AGGREGATES.get(&function.name) {
                Some(aggregate) => aggregate.infer_type(function, ctx),
                None => Self::infer_function_type(function, ctx),
            },
            ScalarExpr::Arithmetic { left, op, right } => {
                let (lt, ln) = Self::infer(left, ctx)?;
                let (rt, rn) = Self::infer(right, ctx)?;
                let numeric = |t: ValueType| t.is_numeric() || t == ValueType::Null;
                if !numeric(lt) || !numeric(rt) {
                    return QueryError::invalid(format!("'{}' needs numeric operands, got {:?} and {:?}", op, lt, rt))
                        .err();
                }
                Ok((ValueType::promote(lt, rt), ln || rn))
            }
            ScalarExpr::Case(case) => {
                let mut ty = ValueType::Null;
                let mut nullable = false;
                for (when, _) in &case.branches {
                    Self::check_predicate(when, ctx)?;
                }
                let results = case.branches.iter().map(|(_, then)| then).chain(std::iter::once(&*case.otherwise));
                for result in results {
                    let (t, n) = Self::infer(result, ctx)?;
                    if !ty.is_comparable_with(t) {
                        return QueryError::invalid(format!("case branches mix {:?} and {:?}", ty, t)).err();
                    }
                    ty = ValueType::promote(ty, t);
                    nullable |= n;
                }
                Ok((ty, nullable))
            }
            ScalarExpr::Subquery(query) => {
                let (ty, _) = Analyzer::validate_scalar_subquery(query, ctx)?;
                // an empty subquery yields null
                Ok((ty, true))
            }
            ScalarExpr::WildCard => QueryError::invalid("* is only valid inside count").err(),
        }
    }

    fn infer_function_type(function: &Function, ctx: &AnalysisContext) -> Result<(ValueType, bool)> {
        let mut arg_types = Vec::with_capacity(function.args.len());
        for arg in &function.args {
            arg_types.push(Self::infer(arg, ctx)?);
        }
        let is_text = |t: &ValueType| matches!(t, ValueType::String | ValueType::Null);

        match (function.name.as_str(), arg_types.as_slice()) {
            ("upper" | "lower" | "trim", [(t, nullable)]) if is_text(t) => Ok((ValueType::String, *nullable)),
            ("length", [(t, nullable)]) if is_text(t) => Ok((ValueType::Int, *nullable)),
            ("str", [(t, nullable)]) if *t != ValueType::Object && *t != ValueType::Array => {
                Ok((ValueType::String, *nullable))
            }
            ("concat", many) if many.len() >= 2 && many.iter().all(|(t, _)| is_text(t)) => {
                Ok((ValueType::String, many.iter().any(|(_, n)| *n)))
            }
            ("coalesce", many) if !many.is_empty() => {
                let mut ty = ValueType::Null;
                let mut all_nullable = true;
                for (t, nullable) in many.iter().copied() {
                    if !ty.is_comparable_with(t) {
                        return QueryError::invalid(format!("coalesce mixes {:?} and {:?}", ty, t)).err();
                    }
                    ty = ValueType::promote(ty, t);
                    all_nullable &= nullable;
                }
                Ok((ty, all_nullable))
            }
            (name, args) => QueryError::invalid(format!(
                "function {}({}) is not supported",
                name,
                args.iter().map(|(t, _)| format!("{:?}", t)).collect::<Vec<_>>().join(", ")
            ))
            .err(),
        }
    }

    fn expect_comparable(left: ValueType, right: ValueType, what: &str) -> Result<()> {
        if left.is_comparable_with(right) {
            Ok(())
        } else {
            QueryError::invalid(format!("{} compares {:?} with {:?}", what, left, right)).err()
        }
    }

    /// Resolves and type-checks every operand of a predicate.
    pub fn check_predicate(predicate: &Predicate, ctx: &AnalysisContext) -> Result<()> {
        match predicate {
            Predicate::And(items) | Predicate::Or(items) => {
                for item in items {
                    Self::check_predicate(item, ctx)?;
                }
                Ok(())
            }
            Predicate::Not(inner) => Self::check_predicate(inner, ctx),
            Predicate::Compare { left, op, right } => {
                let (lt, _) = Self::infer(left, ctx)?;
                let (rt, _) = Self::infer(right, ctx)?;
                Self::expect_comparable(lt, rt, "comparison")?;
                let ordered = |t: ValueType| t.is_ordered() || t == ValueType::Null;
                if !op.is_equality() && !(ordered(lt) && ordered(rt)) {
                    return QueryError::invalid(format!("'{}' cannot order {:?} values", op, lt)).err();
                }
                Ok(())
            }
            Predicate::Between { expr, low, high, .. } => {
                let (t, _) = Self::infer(expr, ctx)?;
                if !t.is_ordered() {
                    return QueryError::invalid(format!("between cannot order {:?} values", t)).err();
                }
                Self::expect_comparable(t, Self::infer(low, ctx)?.0, "between")?;
                Self::expect_comparable(t, Self::infer(high, ctx)?.0, "between")
            }
            Predicate::IsNull { expr, .. } => Self::infer(expr, ctx).map(|_| ()),
            Predicate::InList { expr, list, .. } => {
                let (t, _) = Self::infer(expr, ctx)?;
                for item in list {
                    Self::expect_comparable(t, Self::infer(item, ctx)?.0, "in list")?;
                }
                Ok(())
            }
            Predicate::InSubquery { expr, query, .. } => {
                let (t, _) = Self::infer(expr, ctx)?;
                let (st, _) = Analyzer::validate_scalar_subquery(query, ctx)?;
                Self::expect_comparable(t, st, "in subquery")
            }
            Predicate::Like { expr, pattern, .. } => {
                let (t, _) = Self::infer(expr, ctx)?;
                let (pt, _) = Self::infer(pattern, ctx)?;
                if t != ValueType::String || !matches!(pt, ValueType::String | ValueType::Null) {
                    return QueryError::invalid(format!("like needs strings, got {:?} and {:?}", t, pt)).err();
                }
                Ok(())
            }
            Predicate::Const3(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Member, QMember},
        entity::EntityRef,
        expr::Expr,
    };

    fn ctx() -> AnalysisContext<'static> {
        let mut ctx = AnalysisContext::new(None);
        ctx.bind(&EntityRef::of::<Member>("member1")).unwrap();
        ctx
    }

    #[test]
    pub fn test_infer_attribute_and_aggregates() {
        let member = QMember::default();
        let ctx = ctx();
        assert_eq!(TypeInference::infer(member.age.scalar(), &ctx).unwrap(), (ValueType::Int, false));
        assert_eq!(TypeInference::infer(member.username.scalar(), &ctx).unwrap(), (ValueType::String, true));
        assert_eq!(TypeInference::infer(member.age.avg().scalar(), &ctx).unwrap(), (ValueType::Float, true));
        assert_eq!(TypeInference::infer(member.age.count().scalar(), &ctx).unwrap(), (ValueType::Int, false));
        assert_eq!(
            TypeInference::infer(member.username.concat("_").concat(member.age.string_value()).scalar(), &ctx).unwrap(),
            (ValueType::String, true)
        );
    }

    #[test]
    pub fn test_untyped_mismatches_are_rejected() {
        let ctx = ctx();
        let age: Expr<i64> = Expr::attribute("member1", "age");
        let name_as_int: Expr<i64> = Expr::attribute("member1", "username");

        assert!(TypeInference::check_predicate(&age.goe(10), &ctx).is_ok());
        assert!(matches!(
            TypeInference::check_predicate(&name_as_int.eq(&age), &ctx),
            Err(QueryError::InvalidQuery(_))
        ));
        assert!(matches!(
            TypeInference::infer(&ScalarExpr::WildCard, &ctx),
            Err(QueryError::InvalidQuery(_))
        ));
    }
}
