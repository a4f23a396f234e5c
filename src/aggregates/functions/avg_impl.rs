use serde_json::Value;

use crate::{
    aggregates::{Accumulator, AggregateImpl},
    analyzer::{AnalysisContext, TypeInference},
    error::{QueryError, Result},
    executor::ExecutionError,
    expr::{Function, ValueType},
};

pub struct AvgImpl;

impl AggregateImpl for AvgImpl {
    fn name(&self) -> &'static str {
        "avg"
    }

    fn infer_type(&self, fun: &Function, ctx: &AnalysisContext) -> Result<(ValueType, bool)> {
        let arg = fun.args.first().ok_or_else(|| QueryError::invalid("avg takes one argument"))?;
        match TypeInference::infer(arg, ctx)?.0 {
            ValueType::Int | ValueType::Float => Ok((ValueType::Float, true)),
            other => QueryError::invalid(format!("avg needs a numeric argument, got {:?}", other)).err(),
        }
    }

    fn create_accumulator(&self) -> Box<dyn Accumulator> {
        Box::new(AvgAcc { sum: 0.0, cnt: 0 })
    }
}

struct AvgAcc {
    sum: f64,
    cnt: i64,
}

impl Accumulator for AvgAcc {
    fn update(&mut self, args: &[Value]) -> std::result::Result<(), ExecutionError> {
        let [v] = args else {
            return Err(ExecutionError::new("avg takes one argument"));
        };
        match v {
            Value::Null => {}
            Value::Number(n) => match n.as_f64() {
                Some(f) => {
                    self.sum += f;
                    self.cnt += 1;
                }
                None => return Err(ExecutionError::new(format!("avg got unrepresentable number {}", n))),
            },
            other => return Err(ExecutionError::new(format!("avg got non numeric value {}", other))),
        }
        Ok(())
    }

    fn finalize(&self) -> Value {
        if self.cnt == 0 {
            Value::Null
        } else {
            serde_json::Number::from_f64(self.sum / self.cnt as f64).map(Value::Number).unwrap_or(Value::Null)
        }
    }
}
