use std::{collections::HashMap, sync::Arc};

use once_cell::sync::Lazy;

use crate::{
    aggregates::{AggregateImpl, AvgImpl, CountImpl, MaxImpl, MinImpl, SumImpl},
    analyzer::AnalysisContext,
    error::{QueryError, Result},
    expr::{Function, ScalarExpr, ValueType},
};

/// Case-insensitive registry of aggregates.
#[derive(Default)]
pub struct AggregateRegistry {
    by_name: HashMap<String, Arc<dyn AggregateImpl>>,
}

/// The aggregates understood by the analyzer and the in-memory executor.
pub static DEFAULT_AGGREGATES: Lazy<AggregateRegistry> = Lazy::new(AggregateRegistry::default_aggregate_registry);

/// True when `expr` is a call to a registered aggregate.
pub fn is_aggregate_call(expr: &ScalarExpr) -> bool {
    matches!(expr, ScalarExpr::Function(fun) if DEFAULT_AGGREGATES.get(&fun.name).is_some())
}

impl AggregateRegistry {
    pub fn new() -> Self {
        Self { by_name: HashMap::new() }
    }

    pub fn register<I: AggregateImpl + 'static>(&mut self, impl_: I) {
        self.by_name.insert(impl_.name().to_string(), Arc::new(impl_));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn AggregateImpl>> {
        self.by_name.get(&name.to_ascii_lowercase()).cloned()
    }

    pub fn list(&self) -> Vec<String> {
        let mut v: Vec<_> = self.by_name.keys().cloned().collect();
        v.sort();
        v
    }

    pub fn infer_type(&self, fun: &Function, ctx: &AnalysisContext) -> Result<(ValueType, bool)> {
        let imp = self
            .get(&fun.name)
            .ok_or_else(|| QueryError::invalid(format!("unknown aggregate {}", fun.name)))?;
        imp.infer_type(fun, ctx)
    }

    pub fn default_aggregate_registry() -> Self {
        let mut registry = Self::new();
        registry.register(CountImpl);
        registry.register(SumImpl);
        registry.register(AvgImpl);
        registry.register(MinImpl);
        registry.register(MaxImpl);
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Number, Value, json};

    fn num_f(f: f64) -> Value {
        Value::Number(Number::from_f64(f).unwrap())
    }

    #[test]
    fn registry_contains_all_and_lookup_is_case_insensitive() {
        let r = AggregateRegistry::default_aggregate_registry();
        assert_eq!(r.list(), vec!["avg", "count", "max", "min", "sum"]);
        assert!(r.get("COUNT").is_some());
        assert!(r.get("sUm").is_some());
        assert!(r.get("coalesce").is_none());
    }

    #[test]
    fn aggregate_calls_are_recognized() {
        assert!(is_aggregate_call(&ScalarExpr::function("max", vec![ScalarExpr::column("member1", "age")])));
        assert!(!is_aggregate_call(&ScalarExpr::function("upper", vec![ScalarExpr::column("member1", "username")])));
        assert!(!is_aggregate_call(&ScalarExpr::column("member1", "age")));
    }

    #[test]
    fn count_ignores_nulls_unless_star() {
        let mut acc = CountImpl.create_accumulator();
        acc.update(&[]).unwrap();
        acc.update(&[Value::Null]).unwrap();
        acc.update(&[json!(1)]).unwrap();
        assert_eq!(acc.finalize(), json!(2));
    }

    #[test]
    fn sum_widens_to_float() {
        let mut a = SumImpl.create_accumulator();
        a.update(&[Value::Null]).unwrap();
        a.update(&[json!(10)]).unwrap();
        a.update(&[json!(20)]).unwrap();
        assert_eq!(a.finalize(), json!(30));

        let mut b = SumImpl.create_accumulator();
        b.update(&[json!(1)]).unwrap();
        b.update(&[num_f(2.5)]).unwrap();
        assert_eq!(b.finalize(), num_f(3.5));

        assert_eq!(SumImpl.create_accumulator().finalize(), Value::Null);
    }

    #[test]
    fn avg_returns_float() {
        let mut a = AvgImpl.create_accumulator();
        for v in [10, 20, 30, 40] {
            a.update(&[json!(v)]).unwrap();
        }
        assert_eq!(a.finalize(), num_f(25.0));
        assert_eq!(AvgImpl.create_accumulator().finalize(), Value::Null);
    }

    #[test]
    fn min_max_numeric_and_string() {
        let mut min_i = MinImpl.create_accumulator();
        for v in [json!(5), json!(2.5), json!(9)] {
            min_i.update(&[v]).unwrap();
        }
        assert_eq!(min_i.finalize(), num_f(2.5));

        let mut max_s = MaxImpl.create_accumulator();
        for v in ["pear", "apple", "plum"].map(|s| Value::String(s.into())) {
            max_s.update(&[v]).unwrap();
        }
        assert_eq!(max_s.finalize(), json!("plum"));

        let mut mixed = MaxImpl.create_accumulator();
        mixed.update(&[json!(1)]).unwrap();
        assert!(mixed.update(&[json!("a")]).is_err());
    }
}
