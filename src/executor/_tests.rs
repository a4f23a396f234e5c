use serde_json::{Value, json};

use crate::{
    database::{Db, DbCommon, DbConfig},
    domain::{QMember, QTeam},
    entity::EntityPath,
    executor::{PlanExecutor, Row},
    query::{JpaExpressions, Query, QueryFactory},
};

fn mk_db() -> Db {
    let db = Db::new_db_with_config(DbConfig::none("id"));
    db.load_from_json("team", json!([{ "id": 1, "name": "teamA" }, { "id": 2, "name": "teamB" }])).unwrap();
    db.load_from_json(
        "member",
        json!([
            { "id": 1, "username": "member1", "age": 10, "team_id": 1 },
            { "id": 2, "username": "member2", "age": 20, "team_id": 1 },
            { "id": 3, "username": "member3", "age": 30, "team_id": 2 },
            { "id": 4, "username": "member4", "age": 40, "team_id": 2 },
            { "id": 5, "username": null, "age": 100, "team_id": null }
        ]),
    )
    .unwrap();
    db
}

fn run(db: &Db, query: Query) -> Vec<Vec<Value>> {
    let guard = db.read().unwrap();
    PlanExecutor::run_query(&query, &guard).unwrap().into_iter().map(Row::into_values).collect()
}

#[test]
fn scan_filter_sort_and_page() {
    let db = mk_db();
    let member = QMember::default();
    let query = QueryFactory::default()
        .select(&member.username)
        .from(&member)
        .r#where(member.age.goe(20))
        .order_by(member.age.desc())
        .offset(1)
        .limit(2)
        .into_query();

    assert_eq!(run(&db, query), vec![vec![json!("member4")], vec![json!("member3")]]);
}

#[test]
fn left_join_null_extends_unmatched_rows() {
    let db = mk_db();
    let member = QMember::default();
    let team = QTeam::default();
    let query = QueryFactory::default()
        .select((&member.username, &team.name))
        .from(&member)
        .left_join(member.team(), &team)
        .on(team.name.eq("teamA"))
        .order_by(member.age.asc())
        .into_query();

    let rows = run(&db, query);
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0], vec![json!("member1"), json!("teamA")]);
    assert_eq!(rows[2], vec![json!("member3"), Value::Null]);
    assert_eq!(rows[4], vec![Value::Null, Value::Null]);
}

#[test]
fn group_by_with_having_keeps_first_seen_group_order() {
    let db = mk_db();
    let member = QMember::default();
    let team = QTeam::default();
    let query = QueryFactory::default()
        .select((&team.name, member.age.avg(), member.count()))
        .from(&member)
        .join(member.team(), &team)
        .group_by(&team.name)
        .having(member.age.avg().gt(10.0))
        .into_query();

    assert_eq!(
        run(&db, query),
        vec![vec![json!("teamA"), json!(15.0), json!(2)], vec![json!("teamB"), json!(35.0), json!(2)]]
    );
}

#[test]
fn aggregates_without_rows_yield_a_single_row() {
    let db = mk_db();
    let member = QMember::default();
    let query = QueryFactory::default()
        .select((member.count(), member.age.sum()))
        .from(&member)
        .r#where(member.age.gt(1000))
        .into_query();

    assert_eq!(run(&db, query), vec![vec![json!(0), Value::Null]]);
}

#[test]
fn uncorrelated_subqueries_are_inlined() {
    let db = mk_db();
    let member = QMember::default();
    let sub = QMember::new("memberSub");
    let query = QueryFactory::default()
        .select(&member.username)
        .from(&member)
        .r#where(member.age.in_subquery(JpaExpressions::select(&sub.age).from(&sub).r#where(sub.age.gt(25))))
        .r#where(member.age.lt(JpaExpressions::select(sub.age.max()).from(&sub)))
        .into_query();

    assert_eq!(run(&db, query), vec![vec![json!("member3")], vec![json!("member4")]]);
}

#[test]
fn correlated_subqueries_are_rejected() {
    let db = mk_db();
    let member = QMember::default();
    let sub = QMember::new("memberSub");
    let query = QueryFactory::default()
        .select(&member.username)
        .from(&member)
        .r#where(member.age.eq(JpaExpressions::select(sub.age.max()).from(&sub).r#where(sub.team_id.eq(&member.team_id))))
        .into_query();

    let guard = db.read().unwrap();
    let err = PlanExecutor::run_query(&query, &guard).unwrap_err();
    assert!(err.to_string().contains("correlated"));
}

#[test]
fn fetch_join_embeds_the_association() {
    let db = mk_db();
    let member = QMember::default();
    let team = QTeam::default();
    let query = QueryFactory::default()
        .select_from(&member)
        .join(member.team(), &team)
        .fetch_join()
        .r#where(member.username.eq("member1"))
        .into_query();

    let rows = run(&db, query);
    assert_eq!(rows[0][0]["team"], json!({ "id": 1, "name": "teamA" }));
}
