//! Team, club, and streak query routes.
//!
//! Team questions aggregate over `Fixture` rows hung off a `Team` node.
//! Unlike player stats, team goals live on the fixture (`goalsFor` /
//! `goalsAgainst`), so the metric mapping here is its own table rather than
//! the player one. Streak questions fetch the ordered result sequence and
//! leave run-length computation to the answer layer.

use serde_json::Value;

use crate::error::QueryError;
use crate::query::{
    BuildContext, FragmentKind, QueryPlan, Route, WhereFragment, assemble_where,
    standard_filters,
};

/// Team the question is about, defaulting to the first team.
fn team_name(ctx: &BuildContext) -> String {
    ctx.analysis
        .team_entities
        .first()
        .cloned()
        .unwrap_or_else(|| "1s".to_string())
}

/// Aggregate expression for a team metric over fixture rows.
fn team_value(metric: &str, alias: &str) -> Result<String, QueryError> {
    let expr = match metric {
        "Goals" => format!("coalesce(sum({alias}.goalsFor), 0)"),
        "Goals Conceded" => format!("coalesce(sum({alias}.goalsAgainst), 0)"),
        "Wins" => format!("count(CASE WHEN {alias}.result = 'W' THEN 1 END)"),
        "Draws" => format!("count(CASE WHEN {alias}.result = 'D' THEN 1 END)"),
        "Losses" => format!("count(CASE WHEN {alias}.result = 'L' THEN 1 END)"),
        "Points" => format!(
            "coalesce(sum(CASE {alias}.result WHEN 'W' THEN 3 WHEN 'D' THEN 1 ELSE 0 END), 0)"
        ),
        "Clean Sheets" => format!("count(CASE WHEN {alias}.goalsAgainst = 0 THEN 1 END)"),
        "Appearances" => format!("count({alias})"),
        "Win Rate" => format!(
            "CASE WHEN count({alias}) = 0 THEN 0.0 \
             ELSE toFloat(count(CASE WHEN {alias}.result = 'W' THEN 1 END)) / count({alias}) END"
        ),
        other => {
            return Err(QueryError::UnknownMetric {
                metric: other.to_string(),
            });
        }
    };
    Ok(expr)
}

fn metric_or_goals(ctx: &BuildContext) -> String {
    ctx.analysis
        .metrics
        .first()
        .cloned()
        .unwrap_or_else(|| "Goals".to_string())
}

fn team_fragments(ctx: &BuildContext, plan: &mut QueryPlan) -> Result<Vec<WhereFragment>, QueryError> {
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
        name: "team-biggest-win",
        matches: |ctx| {
            ctx.has_phrase("biggest win")
                || ctx.has_phrase("record win")
                || ctx.has_phrase("largest win")
                || ctx.has_phrase("biggest victory")
        },
        build: build_biggest_win,
    },
    Route {
        name: "team-league-position",
        matches: |ctx| {
            ctx.has_phrase("league position")
                || ctx.has_any_word(&["table", "standings", "finish", "finished"])
        },
        build: build_league_position,
    },
    Route {
        name: "team-season-breakdown",
        matches: |ctx| {
            ctx.has_phrase("per season")
                || ctx.has_phrase("each season")
                || ctx.has_phrase("by season")
        },
        build: build_season_breakdown,
    },
    Route {
        name: "team-aggregate",
        matches: |_| true,
        build: build_aggregate,
    },
];

pub static CLUB_ROUTES: &[Route] = &[
    Route {
        name: "club-captain",
        matches: |ctx| ctx.has_word("captain"),
        build: build_captain,
    },
    Route {
        name: "club-awards",
        matches: |ctx| {
            ctx.has_any_word(&["award", "awards", "totw"]) || ctx.has_phrase("team of the week")
        },
        build: build_awards,
    },
    Route {
        name: "club-aggregate",
        matches: |_| true,
        build: build_club_aggregate,
    },
];

pub static STREAK_ROUTES: &[Route] = &[Route {
    name: "team-result-sequence",
    matches: |_| true,
    build: build_result_sequence,
}];

fn build_aggregate(ctx: &BuildContext) -> Result<QueryPlan, QueryError> {
    let mut plan = QueryPlan::new("team-aggregate");
    let value = team_value(&metric_or_goals(ctx), "f")?;
    let fragments = team_fragments(ctx, &mut plan)?;
    plan.text = format!(
        "MATCH (t:Team)-[:PLAYED]->(f:Fixture) WHERE {} RETURN {value} AS value",
        assemble_where(fragments)
    );
    Ok(plan)
}

fn build_season_breakdown(ctx: &BuildContext) -> Result<QueryPlan, QueryError> {
    let mut plan = QueryPlan::new("team-season-breakdown");
    let value = team_value(&metric_or_goals(ctx), "f")?;
    let fragments = team_fragments(ctx, &mut plan)?;
    plan.text = format!(
        "MATCH (t:Team)-[:PLAYED]->(f:Fixture) WHERE {} \
         RETURN f.season AS season, {value} AS value ORDER BY season",
        assemble_where(fragments)
    );
    Ok(plan)
}

fn build_biggest_win(ctx: &BuildContext) -> Result<QueryPlan, QueryError> {
    let mut plan = QueryPlan::new("team-biggest-win");
    let mut fragments = team_fragments(ctx, &mut plan)?;
    fragments.push(WhereFragment::new(
        FragmentKind::IndexedEquality,
        "f.result = 'W'",
    ));
    plan.text = format!(
        "MATCH (t:Team)-[:PLAYED]->(f:Fixture) WHERE {} \
         RETURN f.date AS date, f.opposition AS opposition, \
         f.goalsFor AS goalsFor, f.goalsAgainst AS goalsAgainst \
         ORDER BY f.goalsFor - f.goalsAgainst DESC, f.goalsFor DESC LIMIT 1",
        assemble_where(fragments)
    );
    Ok(plan)
}

fn build_league_position(ctx: &BuildContext) -> Result<QueryPlan, QueryError> {
    let mut plan = QueryPlan::new("team-league-position");
    plan.bind("team", Value::String(team_name(ctx)))?;
    let mut fragments = vec![WhereFragment::new(
        FragmentKind::IndexedEquality,
        "toLower(t.name) = toLower($team)",
    )];
    standard_filters(&mut plan, &mut fragments, ctx, "l");
    plan.text = format!(
        "MATCH (t:Team)-[:COMPETED_IN]->(l:LeagueSeason) WHERE {} \
         RETURN l.season AS season, l.position AS value ORDER BY season",
        assemble_where(fragments)
    );
    Ok(plan)
}

/// Ordered result sequence for streak questions; the answer layer walks the
/// rows to find the run.
fn build_result_sequence(ctx: &BuildContext) -> Result<QueryPlan, QueryError> {
    let mut plan = QueryPlan::new("team-result-sequence");
    let fragments = team_fragments(ctx, &mut plan)?;
    plan.text = format!(
        "MATCH (t:Team)-[:PLAYED]->(f:Fixture) WHERE {} \
         RETURN f.date AS date, f.result AS result ORDER BY f.date",
        assemble_where(fragments)
    );
    Ok(plan)
}

fn build_captain(ctx: &BuildContext) -> Result<QueryPlan, QueryError> {
    let mut plan = QueryPlan::new("club-captain");
    let mut fragments = Vec::new();
    standard_filters(&mut plan, &mut fragments, ctx, "r");
    let clause = assemble_where(fragments);
    let where_part = if clause.is_empty() {
        String::new()
    } else {
        format!("WHERE {clause} ")
    };
    plan.text = format!(
        "MATCH (p:Player)-[r:CAPTAIN_OF]->(c:Club) {where_part}\
         RETURN p.name AS value ORDER BY r.season DESC LIMIT 1"
    );
    Ok(plan)
}

fn build_awards(ctx: &BuildContext) -> Result<QueryPlan, QueryError> {
    let mut plan = QueryPlan::new("club-awards");
    let mut fragments = Vec::new();
    if let Some(name) = ctx.analysis.entities.first() {
        plan.bind("player", Value::String(name.clone()))?;
        fragments.push(WhereFragment::new(
            FragmentKind::IndexedEquality,
            "toLower(p.name) = toLower($player)",
        ));
    }
    standard_filters(&mut plan, &mut fragments, ctx, "w");
    let clause = assemble_where(fragments);
    let where_part = if clause.is_empty() {
        String::new()
    } else {
        format!("WHERE {clause} ")
    };
    plan.text = format!(
        "MATCH (p:Player)-[w:WON]->(a:Award) {where_part}\
         RETURN a.name AS award, p.name AS name, w.season AS season ORDER BY w.season DESC"
    );
    Ok(plan)
}

/// Club-wide aggregate across every team.
fn build_club_aggregate(ctx: &BuildContext) -> Result<QueryPlan, QueryError> {
    let mut plan = QueryPlan::new("club-aggregate");
    let value = team_value(&metric_or_goals(ctx), "f")?;
    let mut fragments = Vec::new();
    standard_filters(&mut plan, &mut fragments, ctx, "f");
    let clause = assemble_where(fragments);
    let where_part = if clause.is_empty() {
        String::new()
    } else {
        format!("WHERE {clause} ")
    };
    plan.text = format!(
        "MATCH (t:Team)-[:PLAYED]->(f:Fixture) {where_part}RETURN {value} AS value"
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::Analyzer;
    use crate::extract::Extractor;
    use crate::query::QueryRouter;

    fn plan_for(question: &str) -> QueryPlan {
        let extraction = Extractor::new().extract(question);
        let analysis = Analyzer::new().analyze(question, &extraction, None);
        let lower = question.to_lowercase();
        let ctx = BuildContext {
            analysis: &analysis,
            question: &lower,
            current_season: Some("2023/24".to_string()),
        };
        QueryRouter::new().build(&ctx).unwrap()
    }

    #[test]
    fn team_season_goals_aggregate_fixtures() {
        let plan = plan_for("How many goals did the 2nd team score in 2017/18?");
        assert_eq!(plan.route, "team-aggregate");
        assert!(plan.text.contains("coalesce(sum(f.goalsFor), 0)"));
        assert!(plan.text.contains("toLower(t.name) = toLower($team)"));
        assert!(plan.text.contains("f.season = $season"));
        assert_eq!(plan.params["team"], Value::String("2s".into()));
        assert_eq!(plan.params["season"], Value::String("2017/18".into()));
    }

    #[test]
    fn points_use_three_one_zero() {
        let plan = plan_for("How many points did the 1s get in 2019/20?");
        assert!(plan.text.contains("WHEN 'W' THEN 3 WHEN 'D' THEN 1 ELSE 0"));
    }

    #[test]
    fn win_rate_guards_empty_fixture_set() {
        let plan = plan_for("What is the win rate of the 3s?");
        assert!(plan.text.contains("CASE WHEN count(f) = 0 THEN 0.0"));
    }

    #[test]
    fn biggest_win_orders_by_margin() {
        let plan = plan_for("What was the biggest win for the 1s?");
        assert_eq!(plan.route, "team-biggest-win");
        assert!(plan.text.contains("ORDER BY f.goalsFor - f.goalsAgainst DESC"));
        assert!(plan.text.contains("LIMIT 1"));
    }

    #[test]
    fn league_position_reads_league_season() {
        let plan = plan_for("Where did the 2s finish in 2018/19?");
        assert_eq!(plan.route, "team-league-position");
        assert!(plan.text.contains("l.position AS value"));
        assert_eq!(plan.params["season"], Value::String("2018/19".into()));
    }

    #[test]
    fn streak_fetches_ordered_results() {
        let plan = plan_for("What is the longest unbeaten run of the 1s?");
        assert_eq!(plan.route, "team-result-sequence");
        assert!(plan.text.ends_with("ORDER BY f.date"));
    }

    #[test]
    fn captain_question_routes_to_club() {
        let plan = plan_for("Who is the club captain?");
        assert_eq!(plan.route, "club-captain");
        assert!(plan.text.contains("CAPTAIN_OF"));
    }

    #[test]
    fn home_filter_is_applied() {
        let plan = plan_for("How many goals did the 1s score at home?");
        assert!(plan.text.contains("f.venue = $venue"));
        assert_eq!(plan.params["venue"], Value::String("Home".into()));
    }
}
