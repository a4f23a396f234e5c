use indexmap::IndexMap;

use crate::{
    entity::{EntityRef, FieldInfo},
    error::{QueryError, Result},
};

/// Aliases visible while analyzing one query. Subqueries get their own
/// context chained to the enclosing one.
pub struct AnalysisContext<'a> {
    /// alias -> bound entity, in binding order
    pub bindings: IndexMap<String, EntityRef>,
    pub outer: Option<&'a AnalysisContext<'a>>,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(outer: Option<&'a AnalysisContext<'a>>) -> Self {
        Self { bindings: IndexMap::new(), outer }
    }

    /// Binds an entity. An alias may appear only once across the whole
    /// chain, so subqueries cannot shadow outer aliases.
    pub fn bind(&mut self, entity: &EntityRef) -> Result<()> {
        if self.resolve(entity.alias()).is_some() {
            return QueryError::invalid(format!("alias '{}' is bound more than once", entity.alias())).err();
        }
        self.bindings.insert(entity.alias().to_string(), entity.clone());
        Ok(())
    }

    pub fn resolve(&self, alias: &str) -> Option<&EntityRef> {
        match self.bindings.get(alias) {
            Some(entity) => Some(entity),
            None => self.outer.and_then(|outer| outer.resolve(alias)),
        }
    }

    pub fn resolve_entity(&self, alias: &str) -> Result<&EntityRef> {
        self.resolve(alias)
            .ok_or_else(|| QueryError::unresolved(format!("alias '{}' is not bound by any from or join", alias)))
    }

    pub fn resolve_field(&self, alias: &str, field: &str) -> Result<FieldInfo> {
        let entity = self.resolve_entity(alias)?;
        entity
            .schema()
            .field_info(field)
            .copied()
            .ok_or_else(|| QueryError::unresolved(format!("{} has no attribute '{}'", entity.entity_name(), field)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Member, Team};

    #[test]
    pub fn test_outer_aliases_are_visible_but_not_rebindable() {
        let mut outer = AnalysisContext::new(None);
        outer.bind(&EntityRef::of::<Member>("member1")).unwrap();

        let mut inner = AnalysisContext::new(Some(&outer));
        inner.bind(&EntityRef::of::<Member>("memberSub")).unwrap();
        assert!(inner.resolve("member1").is_some());
        assert!(matches!(inner.bind(&EntityRef::of::<Team>("member1")), Err(QueryError::InvalidQuery(_))));
    }

    #[test]
    pub fn test_unknown_field_is_unresolved() {
        let mut ctx = AnalysisContext::new(None);
        ctx.bind(&EntityRef::of::<Member>("member1")).unwrap();
        assert!(ctx.resolve_field("member1", "age").is_ok());
        assert!(matches!(ctx.resolve_field("member1", "salary"), Err(QueryError::UnresolvedReference(_))));
        assert!(matches!(ctx.resolve_field("team", "name"), Err(QueryError::UnresolvedReference(_))));
    }
}
