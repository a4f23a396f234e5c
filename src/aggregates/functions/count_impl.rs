use serde_json::Value;

use crate::{
    aggregates::{Accumulator, AggregateImpl},
    analyzer::{AnalysisContext, TypeInference},
    error::{QueryError, Result},
    executor::ExecutionError,
    expr::{Function, ScalarExpr, ValueType},
};

pub struct CountImpl;

impl AggregateImpl for CountImpl {
    fn name(&self) -> &'static str {
        "count"
    }

    /// `count(*)`, `count(expr)`, `count(distinct expr)` and `count(entity)`
    /// are all non-null integers.
    fn infer_type(&self, fun: &Function, ctx: &AnalysisContext) -> Result<(ValueType, bool)> {
        match fun.args.as_slice() {
            [ScalarExpr::WildCard] => Ok((ValueType::Int, false)),
            [arg] => {
                TypeInference::infer(arg, ctx)?;
                Ok((ValueType::Int, false))
            }
            _ => QueryError::invalid("count takes exactly one argument").err(),
        }
    }

    fn create_accumulator(&self) -> Box<dyn Accumulator> {
        Box::new(CountAcc { cnt: 0 })
    }
}

struct CountAcc {
    cnt: i64,
}

impl Accumulator for CountAcc {
    fn update(&mut self, args: &[Value]) -> std::result::Result<(), ExecutionError> {
        match args {
            [] => self.cnt += 1,
            [Value::Null] => {}
            [_] => self.cnt += 1,
            _ => return Err(ExecutionError::new("count takes exactly one argument")),
        }
        Ok(())
    }

    fn finalize(&self) -> Value {
        Value::Number(serde_json::Number::from(self.cnt))
    }
}
