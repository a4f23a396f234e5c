use serde_json::Value;

use crate::{
    aggregates::{Accumulator, AggregateImpl},
    analyzer::{AnalysisContext, TypeInference},
    error::{QueryError, Result},
    executor::ExecutionError,
    expr::{Function, ValueType},
};

pub struct SumImpl;

impl AggregateImpl for SumImpl {
    fn name(&self) -> &'static str {
        "sum"
    }

    fn infer_type(&self, fun: &Function, ctx: &AnalysisContext) -> Result<(ValueType, bool)> {
        let arg = fun.args.first().ok_or_else(|| QueryError::invalid("sum takes one argument"))?;
        match TypeInference::infer(arg, ctx)?.0 {
            ValueType::Int => Ok((ValueType::Int, true)),
            ValueType::Float => Ok((ValueType::Float, true)),
            other => QueryError::invalid(format!("sum needs a numeric argument, got {:?}", other)).err(),
        }
    }

    fn create_accumulator(&self) -> Box<dyn Accumulator> {
        Box::new(SumAcc::Empty)
    }
}

// Integer until the first float arrives.
enum SumAcc {
    Empty,
    Int(i128),
    Float(f64),
}

impl Accumulator for SumAcc {
    fn update(&mut self, args: &[Value]) -> std::result::Result<(), ExecutionError> {
        let [v] = args else {
            return Err(ExecutionError::new("sum takes one argument"));
        };
        let n = match v {
            Value::Null => return Ok(()),
            Value::Number(n) => n,
            other => return Err(ExecutionError::new(format!("sum got non numeric value {}", other))),
        };

        *self = match (&*self, n.as_i64(), n.as_f64()) {
            (SumAcc::Empty, Some(i), _) => SumAcc::Int(i as i128),
            (SumAcc::Empty, None, Some(f)) => SumAcc::Float(f),
            (SumAcc::Int(acc), Some(i), _) => SumAcc::Int(acc + i as i128),
            (SumAcc::Int(acc), None, Some(f)) => SumAcc::Float(*acc as f64 + f),
            (SumAcc::Float(acc), _, Some(f)) => SumAcc::Float(acc + f),
            _ => return Err(ExecutionError::new(format!("sum got unrepresentable number {}", n))),
        };
        Ok(())
    }

    fn finalize(&self) -> Value {
        match self {
            SumAcc::Empty => Value::Null,
            SumAcc::Int(i) => match i64::try_from(*i) {
                Ok(i) => Value::Number(serde_json::Number::from(i)),
                Err(_) => serde_json::Number::from_f64(*i as f64).map(Value::Number).unwrap_or(Value::Null),
            },
            SumAcc::Float(f) => serde_json::Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        }
    }
}
