use std::cmp::Ordering;

use serde_json::Value;

use crate::{
    aggregates::{Accumulator, AggregateImpl},
    analyzer::{AnalysisContext, TypeInference},
    error::{QueryError, Result},
    executor::ExecutionError,
    expr::{Function, ValueType},
};

pub struct MinImpl;
pub struct MaxImpl;

fn infer_extrema(fun: &Function, ctx: &AnalysisContext) -> Result<(ValueType, bool)> {
    let arg = fun
        .args
        .first()
        .ok_or_else(|| QueryError::invalid(format!("{} takes one argument", fun.name)))?;
    let (ty, _) = TypeInference::infer(arg, ctx)?;
    if !ty.is_ordered() {
        return QueryError::invalid(format!("{} needs an ordered argument, got {:?}", fun.name, ty)).err();
    }
    Ok((ty, true))
}

impl AggregateImpl for MinImpl {
    fn name(&self) -> &'static str {
        "min"
    }

    fn infer_type(&self, fun: &Function, ctx: &AnalysisContext) -> Result<(ValueType, bool)> {
        infer_extrema(fun, ctx)
    }

    fn create_accumulator(&self) -> Box<dyn Accumulator> {
        Box::new(ExtremaAcc { keep: Ordering::Less, current: None })
    }
}

impl AggregateImpl for MaxImpl {
    fn name(&self) -> &'static str {
        "max"
    }

    fn infer_type(&self, fun: &Function, ctx: &AnalysisContext) -> Result<(ValueType, bool)> {
        infer_extrema(fun, ctx)
    }

    fn create_accumulator(&self) -> Box<dyn Accumulator> {
        Box::new(ExtremaAcc { keep: Ordering::Greater, current: None })
    }
}

/// Keeps the value that compares as `keep` against every other.
struct ExtremaAcc {
    keep: Ordering,
    current: Option<Value>,
}

fn compare(a: &Value, b: &Value) -> std::result::Result<Ordering, ExecutionError> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(ix), Some(iy)) => Ok(ix.cmp(&iy)),
            _ => x
                .as_f64()
                .zip(y.as_f64())
                .and_then(|(fx, fy)| fx.partial_cmp(&fy))
                .ok_or_else(|| ExecutionError::new("min/max cannot order these numbers")),
        },
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Ok(x.cmp(y)),
        _ => Err(ExecutionError::new(format!("min/max cannot compare {} with {}", a, b))),
    }
}

impl Accumulator for ExtremaAcc {
    fn update(&mut self, args: &[Value]) -> std::result::Result<(), ExecutionError> {
        let [v] = args else {
            return Err(ExecutionError::new("min/max takes one argument"));
        };
        if v.is_null() {
            return Ok(());
        }
        match &mut self.current {
            None => self.current = Some(v.clone()),
            Some(cur) => {
                if compare(v, cur)? == self.keep {
                    *cur = v.clone();
                }
            }
        }
        Ok(())
    }

    fn finalize(&self) -> Value {
        self.current.clone().unwrap_or(Value::Null)
    }
}
