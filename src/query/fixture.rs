//! Fixture-domain query routes: head-to-head records, most recent results,
//! fixture lists, and double game weeks (calendar weeks with two or more
//! fixtures for one team).

use serde_json::Value;

use crate::error::QueryError;
use crate::query::{
    BuildContext, FragmentKind, QueryPlan, Route, WhereFragment, assemble_where,
    standard_filters,
};

fn team_name(ctx: &BuildContext) -> String {
    ctx.analysis
        .team_entities
        .first()
        .cloned()
        .unwrap_or_else(|| "1s".to_string())
}

fn fixture_fragments(
    ctx: &BuildContext,
    plan: &mut QueryPlan,
) -> Result<Vec<WhereFragment>, QueryError> {
    plan.bind("team", Value::String(team_name(ctx)))?;
    let mut fragments = vec![WhereFragment::new(
        FragmentKind::IndexedEquality,
        "toLower(t.name) = toLower($team)",
    )];
    standard_filters(plan, &mut fragments, ctx, "f");
    Ok(fragments)
}

pub static ROUTES: &[Route] = &[
    Route {
        name: "fixture-head-to-head",
        matches: |ctx| {
            (ctx.has_phrase("head to head") || ctx.has_phrase("record against"))
                && !ctx.analysis.opposition_entities.is_empty()
        },
        build: build_head_to_head,
    },
    Route {
        name: "fixture-last-result",
        matches: |ctx| {
            ctx.has_any_word(&["last", "latest", "recent"])
                && !ctx.analysis.opposition_entities.is_empty()
        },
        build: build_last_result,
    },
    Route {
        name: "fixture-list",
        matches: |_| true,
        build: build_list,
    },
];

pub static DOUBLE_WEEK_ROUTES: &[Route] = &[Route {
    name: "fixture-double-game-week",
    matches: |_| true,
    build: build_double_game_week,
}];

/// Win/draw/loss tallies against a named opposition.
fn build_head_to_head(ctx: &BuildContext) -> Result<QueryPlan, QueryError> {
    let mut plan = QueryPlan::new("fixture-head-to-head");
    let fragments = fixture_fragments(ctx, &mut plan)?;
    plan.text = format!(
        "MATCH (t:Team)-[:PLAYED]->(f:Fixture) WHERE {} \
         RETURN count(CASE WHEN f.result = 'W' THEN 1 END) AS wins, \
         count(CASE WHEN f.result = 'D' THEN 1 END) AS draws, \
         count(CASE WHEN f.result = 'L' THEN 1 END) AS losses",
        assemble_where(fragments)
    );
    Ok(plan)
}

fn build_last_result(ctx: &BuildContext) -> Result<QueryPlan, QueryError> {
    let mut plan = QueryPlan::new("fixture-last-result");
    let fragments = fixture_fragments(ctx, &mut plan)?;
    plan.text = format!(
        "MATCH (t:Team)-[:PLAYED]->(f:Fixture) WHERE {} \
         RETURN f.date AS date, f.opposition AS opposition, \
         f.goalsFor AS goalsFor, f.goalsAgainst AS goalsAgainst, f.result AS result \
         ORDER BY f.date DESC LIMIT 1",
        assemble_where(fragments)
    );
    Ok(plan)
}

fn build_list(ctx: &BuildContext) -> Result<QueryPlan, QueryError> {
    let mut plan = QueryPlan::new("fixture-list");
    let fragments = fixture_fragments(ctx, &mut plan)?;
    plan.text = format!(
        "MATCH (t:Team)-[:PLAYED]->(f:Fixture) WHERE {} \
         RETURN f.date AS date, f.opposition AS opposition, \
         f.goalsFor AS goalsFor, f.goalsAgainst AS goalsAgainst, f.result AS result \
         ORDER BY f.date",
        assemble_where(fragments)
    );
    Ok(plan)
}

/// Calendar weeks where the team played twice or more.
fn build_double_game_week(ctx: &BuildContext) -> Result<QueryPlan, QueryError> {
    let mut plan = QueryPlan::new("fixture-double-game-week");
    let fragments = fixture_fragments(ctx, &mut plan)?;
    plan.text = format!(
        "MATCH (t:Team)-[:PLAYED]->(f:Fixture) WHERE {} \
         WITH f.week AS week, collect(f) AS fs WHERE size(fs) >= 2 \
         UNWIND fs AS f \
         RETURN week, f.date AS date, f.opposition AS opposition, f.result AS result \
         ORDER BY week, date",
        assemble_where(fragments)
    );
    Ok(plan)
}
