//! End-to-end integration tests for the dugout engine.
//!
//! These tests exercise the full pipeline from free-text question through
//! extraction, classification, resolution, query building, stubbed
//! execution, and answer formatting.

use std::sync::Arc;

use serde_json::Value;

use dugout::engine::{Engine, EngineConfig, HistoryTurn};
use dugout::graph::{Row, StubClient, ValueCategory, value_row};

fn seeded_client() -> StubClient {
    StubClient::new("2023/24")
        .with_known_values(
            ValueCategory::Players,
            ["Luke Bangs", "Sam Hartley", "Jim Cole"],
        )
        .with_known_values(ValueCategory::Teams, ["1s", "2s", "3s"])
        .with_known_values(ValueCategory::Oppositions, ["Ashford Town", "Borden Village"])
}

fn engine_with(client: StubClient) -> Engine {
    Engine::new(Arc::new(client), EngineConfig::default()).unwrap()
}

fn row(pairs: &[(&str, Value)]) -> Row {
    let mut row = Row::new();
    for (k, v) in pairs {
        row.insert((*k).to_string(), v.clone());
    }
    row
}

#[test]
fn player_goal_total_reads_summary_node() {
    let client = seeded_client().with_response("p.totalGoals", vec![value_row("value", 42)]);
    let engine = engine_with(client);

    let answer = engine
        .answer_question("How many goals has Luke Bangs scored?", None, &[])
        .unwrap();

    assert_eq!(answer.text, "Luke Bangs has 42 goals.");
    assert_eq!(answer.value, Some(Value::from(42)));

    let debug = answer.debug.unwrap();
    assert_eq!(debug.question_type, "player");
    assert_eq!(debug.route, "player-summary");
    assert!(!debug.rendered_query.contains("MatchDetail"));
    assert!(debug.rendered_query.contains("'Luke Bangs'"));
    assert!(!debug.cache_hit);
}

#[test]
fn team_season_goals_aggregate_fixtures() {
    let client = seeded_client().with_response("sum(f.goalsFor)", vec![value_row("value", 57)]);
    let engine = engine_with(client);

    let answer = engine
        .answer_question("How many goals did the 2nd team score in 2017/18?", None, &[])
        .unwrap();

    assert_eq!(answer.text, "2s has 57 goals.");
    let debug = answer.debug.unwrap();
    assert_eq!(debug.question_type, "team");
    assert_eq!(debug.route, "team-aggregate");
    assert!(debug.rendered_query.contains("'2017/18'"));
    assert!(debug.rendered_query.contains("'2s'"));
}

#[test]
fn executed_query_is_parameterized() {
    let client = seeded_client().with_response("p.totalGoals", vec![value_row("value", 42)]);
    let engine = engine_with(client.clone());

    engine
        .answer_question("How many goals has Luke Bangs scored?", None, &[])
        .unwrap();

    let executed = client.executed();
    assert_eq!(executed.len(), 1);
    let (query, params) = &executed[0];
    assert!(query.contains("$player"));
    assert!(!query.contains("Luke Bangs"));
    assert_eq!(params["player"], Value::String("Luke Bangs".into()));
}

#[test]
fn bare_stat_question_asks_for_clarification() {
    let client = seeded_client();
    let engine = engine_with(client.clone());

    let answer = engine.answer_question("goals", None, &[]).unwrap();

    assert!(answer.text.contains("Which player or team"));
    assert_eq!(answer.debug.unwrap().route, "clarification");
    assert!(client.executed().is_empty());
}

#[test]
fn misspelled_player_is_resolved_before_querying() {
    let client = seeded_client().with_response("p.totalGoals", vec![value_row("value", 42)]);
    let engine = engine_with(client);

    let answer = engine
        .answer_question("How many goals has Luke Bnags scored?", None, &[])
        .unwrap();

    assert_eq!(answer.text, "Luke Bangs has 42 goals.");
}

#[test]
fn unknown_player_returns_not_found_without_querying() {
    let client = seeded_client();
    let engine = engine_with(client.clone());

    let answer = engine
        .answer_question("How many goals has Zzyzx Quux scored?", None, &[])
        .unwrap();

    assert!(answer.text.contains("don't recognise"));
    assert!(client.executed().is_empty());
}

#[test]
fn empty_result_set_is_a_polite_not_found() {
    let client = seeded_client().with_response("p.totalGoals", vec![]);
    let engine = engine_with(client);

    let answer = engine
        .answer_question("How many goals has Sam Hartley scored?", None, &[])
        .unwrap();

    assert!(answer.text.contains("couldn't find"));
    assert!(answer.text.contains("Sam Hartley"));
}

#[test]
fn graph_failure_is_reported_not_propagated() {
    let client = seeded_client().failing("connection refused");
    let engine = engine_with(client);

    let answer = engine
        .answer_question("How many goals has Luke Bangs scored?", None, &[])
        .unwrap();

    assert!(answer.text.contains("went wrong"));
    assert!(answer.debug.unwrap().rendered_query.contains("connection refused"));
}

#[test]
fn repeat_question_hits_the_cache() {
    let client = seeded_client().with_response("p.totalGoals", vec![value_row("value", 42)]);
    let engine = engine_with(client.clone());

    let question = "How many goals has Luke Bangs scored?";
    engine.answer_question(question, None, &[]).unwrap();
    let second = engine.answer_question(question, None, &[]).unwrap();

    assert!(second.debug.unwrap().cache_hit);
    // Only the first ask reached the graph.
    assert_eq!(client.executed().len(), 1);
}

#[test]
fn cache_keys_include_user_context() {
    let client = seeded_client().with_response("p.totalGoals", vec![value_row("value", 42)]);
    let engine = engine_with(client.clone());

    let question = "How many goals have I scored?";
    engine
        .answer_question(question, Some("Luke Bangs"), &[])
        .unwrap();
    engine
        .answer_question(question, Some("Sam Hartley"), &[])
        .unwrap();

    assert_eq!(client.executed().len(), 2);
}

#[test]
fn first_person_question_uses_context_player() {
    let client = seeded_client().with_response("p.totalGoals", vec![value_row("value", 7)]);
    let engine = engine_with(client);

    let answer = engine
        .answer_question("How many goals have I scored?", Some("Luke Bangs"), &[])
        .unwrap();

    assert_eq!(answer.text, "Luke Bangs has 7 goals.");
}

#[test]
fn follow_up_borrows_subject_and_keeps_new_filter() {
    let client = seeded_client().with_response("MatchDetail", vec![value_row("value", 9)]);
    let engine = engine_with(client.clone());

    let history = vec![HistoryTurn {
        question: "How many goals has Luke Bangs scored?".to_string(),
        entities: vec!["Luke Bangs".to_string()],
        metrics: vec!["Goals".to_string()],
        asked_at: chrono::Utc::now(),
    }];
    let answer = engine
        .answer_question("what about in 2017/18?", None, &history)
        .unwrap();

    assert_eq!(answer.text, "Luke Bangs has 9 goals.");
    let (query, params) = &client.executed()[0];
    assert!(query.contains("m.season = $season"));
    assert_eq!(params["season"], Value::String("2017/18".into()));
}

#[test]
fn comparison_question_ranks_players() {
    let rows = vec![
        row(&[("name", "Luke Bangs".into()), ("value", 42.into())]),
        row(&[("name", "Sam Hartley".into()), ("value", 31.into())]),
    ];
    let client = seeded_client().with_response("IN $players", rows);
    let engine = engine_with(client);

    let answer = engine
        .answer_question("Compare goals for Luke Bangs and Sam Hartley", None, &[])
        .unwrap();

    assert!(answer.text.contains("Luke Bangs: 42"));
    assert!(answer.text.contains("Sam Hartley: 31"));
    assert!(answer.visualization.is_some());
}

#[test]
fn streak_question_computes_run_from_ordered_results() {
    let results: Vec<Row> = ["W", "D", "W", "W", "L", "W"]
        .iter()
        .enumerate()
        .map(|(i, r)| {
            row(&[
                ("date", format!("2023-09-{:02}", i + 1).into()),
                ("result", Value::from(*r)),
            ])
        })
        .collect();
    let client = seeded_client().with_response("ORDER BY f.date", results);
    let engine = engine_with(client);

    let answer = engine
        .answer_question("What is the longest unbeaten run of the 1s?", None, &[])
        .unwrap();

    assert_eq!(answer.value, Some(Value::from(4u64)));
    assert!(answer.text.contains("unbeaten run"));
}

#[test]
fn last_season_resolves_through_current_season() {
    let client = seeded_client().with_response("MatchDetail", vec![value_row("value", 11)]);
    let engine = engine_with(client.clone());

    engine
        .answer_question("How many goals did Luke Bangs score last season?", None, &[])
        .unwrap();

    let (_, params) = &client.executed()[0];
    // Current season is 2023/24, so last season is 2022/23.
    assert_eq!(params["season"], Value::String("2022/23".into()));
}

#[test]
fn plan_is_buildable_without_execution() {
    let client = seeded_client();
    let engine = engine_with(client.clone());

    let report = engine
        .plan_question("How many goals has Luke Bangs scored?", None)
        .unwrap();

    let plan = report.plan.unwrap();
    assert_eq!(plan.route, "player-summary");
    assert!(plan.display_text().contains("'Luke Bangs'"));
    assert!(client.executed().is_empty());
}
