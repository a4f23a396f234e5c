use crate::{
    aggregates::Accumulator,
    analyzer::AnalysisContext,
    error::Result,
    expr::{Function, ValueType},
};

/// Metadata and accumulator factory for one aggregate function. Instances
/// are stateless and shared.
pub trait AggregateImpl: Send + Sync {
    /// Lowercase function name.
    fn name(&self) -> &'static str;

    /// Result type and nullability for a call.
    fn infer_type(&self, fun: &Function, ctx: &AnalysisContext) -> Result<(ValueType, bool)>;

    fn create_accumulator(&self) -> Box<dyn Accumulator>;
}
