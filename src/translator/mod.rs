use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{error::Result, query::Query};

pub mod statement;
pub use statement::*;

pub mod writer;
use writer::StatementWriter;

/// Target query language.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dialect {
    /// Entity names, association paths and `?1` placeholders.
    #[default]
    Jpql,
    /// Table names, explicit key conditions and `?` placeholders.
    Sql,
}

#[derive(Debug, Clone, Copy)]
pub struct Translator {
    dialect: Dialect,
}

impl Translator {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Renders the descriptor. The output depends only on the descriptor and
    /// the dialect.
    pub fn translate(&self, query: &Arc<Query>) -> Result<Statement> {
        let mut writer = StatementWriter::new(self.dialect);
        writer.query(query)?;
        let (text, params) = writer.finish();
        debug!(dialect = ?self.dialect, text = %text, params = params.len(), "query translated");
        Ok(Statement { text, params, query: Arc::clone(query) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{QMember, QTeam},
        entity::EntityPath,
        expr::{CaseBuilder, Literal},
        query::{JpaExpressions, QueryFactory},
        Config,
    };

    fn jpql(query: Query) -> Statement {
        Translator::new(Dialect::Jpql).translate(&Arc::new(query)).unwrap()
    }

    fn sql(query: Query) -> Statement {
        Translator::new(Dialect::Sql).translate(&Arc::new(query)).unwrap()
    }

    #[test]
    pub fn test_simple_filter() {
        let member = QMember::new("member1");
        let query = QueryFactory::default()
            .select_from(&member)
            .r#where(member.username.eq("member1").and(member.age.eq(10)))
            .into_query();

        let statement = jpql(query.clone());
        assert_eq!(
            statement.text(),
            "select member1 from Member member1 where member1.username = ?1 and member1.age = ?2"
        );
        assert_eq!(statement.params(), &[Literal::from("member1"), Literal::Int(10)]);

        let statement = sql(query);
        assert_eq!(
            statement.text(),
            "select member1.id, member1.username, member1.age, member1.team_id from member member1 \
             where member1.username = ? and member1.age = ?"
        );
    }

    #[test]
    pub fn test_translation_is_deterministic() {
        let member = QMember::new("member1");
        let query = QueryFactory::default()
            .select_from(&member)
            .r#where(member.age.between(10, 30).or(member.username.in_list(["a", "b"])))
            .order_by(member.age.desc())
            .offset(1)
            .limit(2)
            .into_query();

        let first = jpql(query.clone());
        let second = jpql(query);
        assert_eq!(first.text(), second.text());
        assert_eq!(first.params(), second.params());
        assert_eq!(
            first.text(),
            "select member1 from Member member1 where member1.age between ?1 and ?2 or member1.username in (?3, ?4) \
             order by member1.age desc limit 2 offset 1"
        );
    }

    #[test]
    pub fn test_null_ordering_only_when_requested() {
        let member = QMember::new("member1");
        let query = QueryFactory::default()
            .select_from(&member)
            .order_by(member.age.desc())
            .order_by(member.username.asc().nulls_last())
            .into_query();

        assert_eq!(
            jpql(query).text(),
            "select member1 from Member member1 order by member1.age desc, member1.username asc nulls last"
        );
    }

    #[test]
    pub fn test_association_join_in_both_dialects() {
        let member = QMember::new("member1");
        let team = QTeam::new("team");
        let query = QueryFactory::default()
            .select_from(&member)
            .left_join(member.team(), &team)
            .on(team.name.eq("teamA"))
            .into_query();

        assert_eq!(
            jpql(query.clone()).text(),
            "select member1 from Member member1 left join member1.team team on team.name = ?1"
        );
        assert_eq!(
            sql(query).text(),
            "select member1.id, member1.username, member1.age, member1.team_id from member member1 \
             left join team team on member1.team_id = team.id and (team.name = ?)"
        );
    }

    #[test]
    pub fn test_theta_join_has_no_key_condition() {
        let member = QMember::new("member1");
        let team = QTeam::new("team");
        let query = QueryFactory::new(Config::sql())
            .select((&member, &team))
            .from(&member)
            .left_join_entity(&team)
            .on(member.username.eq(&team.name))
            .into_query();

        let text = sql(query).text().to_string();
        assert!(text.ends_with("from member member1 left join team team on member1.username = team.name"));
        let (_, on) = text.split_once(" on ").unwrap();
        assert_eq!(on, "member1.username = team.name");
        assert!(!on.contains("team_id"));
    }

    #[test]
    pub fn test_fetch_join_and_subquery() {
        let member = QMember::new("member1");
        let sub = QMember::new("memberSub");
        let team = QTeam::new("team");
        let query = QueryFactory::default()
            .select_from(&member)
            .join(member.team(), &team)
            .fetch_join()
            .r#where(member.age.eq(JpaExpressions::select(sub.age.max()).from(&sub)))
            .into_query();

        assert_eq!(
            jpql(query).text(),
            "select member1 from Member member1 inner join fetch member1.team team \
             where member1.age = (select max(memberSub.age) from Member memberSub)"
        );
    }

    #[test]
    pub fn test_case_and_string_value() {
        let member = QMember::new("member1");
        let rank = CaseBuilder::new().when(member.age.between(0, 20)).then(2i64).otherwise(1i64);
        let query = QueryFactory::default()
            .select((member.username.concat("_").concat(member.age.string_value()), rank.as_("rank")))
            .from(&member)
            .into_query();

        assert_eq!(
            jpql(query.clone()).text(),
            "select concat(concat(member1.username, ?1), str(member1.age)), \
             case when member1.age between ?2 and ?3 then ?4 else ?5 end as rank from Member member1"
        );
        assert!(sql(query).text().contains("cast(member1.age as varchar)"));
    }

    #[test]
    pub fn test_count_and_empty_in_list() {
        let member = QMember::new("member1");
        let query = QueryFactory::default()
            .select(member.count())
            .from(&member)
            .r#where(member.username.in_list(Vec::<String>::new()))
            .into_query();

        assert_eq!(jpql(query.clone()).text(), "select count(member1) from Member member1 where 1 = 0");
        assert_eq!(sql(query).text(), "select count(member1.id) from member member1 where 1 = 0");
    }

    #[test]
    pub fn test_negation_and_grouping_parentheses() {
        let member = QMember::new("member1");
        let team = QTeam::new("team");
        let query = QueryFactory::default()
            .select((&team.name, member.age.avg()))
            .from(&member)
            .join(member.team(), &team)
            .r#where(member.age.gt(5).and(member.age.lt(10).or(member.age.is_null())).not())
            .group_by(&team.name)
            .having(member.age.avg().goe(10.0))
            .into_query();

        assert_eq!(
            jpql(query).text(),
            "select team.name, avg(member1.age) from Member member1 inner join member1.team team \
             where not (member1.age > ?1 and (member1.age < ?2 or member1.age is null)) \
             group by team.name having avg(member1.age) >= ?3"
        );
    }
}
