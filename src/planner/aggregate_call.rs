use crate::{
    aggregates::is_aggregate_call,
    expr::{Column, Function, Predicate, ScalarExpr},
};

/// An aggregate call computed by an `Aggregate` node, stored under `name`.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateCall {
    pub func: String,
    pub args: Vec<ScalarExpr>,
    pub distinct: bool,
    pub name: String,
}

impl AggregateCall {
    fn matches(&self, fun: &Function) -> bool {
        self.func == fun.name && self.args == fun.args && self.distinct == fun.distinct
    }

    /// `count(*)` is fed no arguments.
    pub fn is_count_star(&self) -> bool {
        self.func == "count" && matches!(self.args.as_slice(), [ScalarExpr::WildCard])
    }

    /// Adds every aggregate call in `expr` not yet in `calls`.
    pub fn collect(expr: &ScalarExpr, calls: &mut Vec<AggregateCall>) {
        expr.walk(&mut |e| {
            if let ScalarExpr::Function(fun) = e {
                if is_aggregate_call(e) && !calls.iter().any(|c| c.matches(fun)) {
                    let name = format!("__agg{}", calls.len());
                    calls.push(AggregateCall {
                        func: fun.name.clone(),
                        args: fun.args.clone(),
                        distinct: fun.distinct,
                        name,
                    });
                }
            }
        });
    }

    pub fn collect_in_predicate(predicate: &Predicate, calls: &mut Vec<AggregateCall>) {
        predicate.walk_scalars(&mut |e| {
            if is_aggregate_call(e) {
                Self::collect(e, calls);
            }
        });
    }

    /// Replaces each collected call by a reference to its output.
    pub fn rewrite(expr: &ScalarExpr, calls: &[AggregateCall]) -> ScalarExpr {
        expr.transform(&mut |e| Self::replacement(e, calls))
    }

    pub fn rewrite_predicate(predicate: &Predicate, calls: &[AggregateCall]) -> Predicate {
        predicate.transform(&mut |e| Self::replacement(e, calls))
    }

    pub(crate) fn replacement(expr: &ScalarExpr, calls: &[AggregateCall]) -> Option<ScalarExpr> {
        match expr {
            ScalarExpr::Function(fun) => calls
                .iter()
                .find(|c| c.matches(fun))
                .map(|c| ScalarExpr::Column(Column::derived(c.name.clone()))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QMember;

    #[test]
    pub fn test_calls_are_deduplicated_and_rewritten() {
        let member = QMember::default();
        let mut calls = vec![];
        AggregateCall::collect(member.age.sum().scalar(), &mut calls);
        AggregateCall::collect(member.age.sum().add(member.age.max()).scalar(), &mut calls);

        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].name, "__agg0");
        assert_eq!(calls[1].func, "max");

        let rewritten = AggregateCall::rewrite(member.age.sum().add(member.age.max()).scalar(), &calls);
        assert_eq!(rewritten.to_string(), "(__agg0 + __agg1)");
    }

    #[test]
    pub fn test_count_star_is_recognised() {
        let mut calls = vec![];
        AggregateCall::collect(&ScalarExpr::function("count", vec![ScalarExpr::WildCard]), &mut calls);
        assert!(calls[0].is_count_star());
    }
}
