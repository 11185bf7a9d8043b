//! Player-domain query routes.
//!
//! Ordered routing table: the most specific intents (hat-trick counts,
//! per-season breakdowns, rankings) sit above the filtered aggregate, with
//! the plain summary lookup as the catch-all. A summary lookup reads the
//! pre-aggregated field on the `Player` node; anything with a filter joins
//! through the per-match `MatchDetail` rows.

use serde_json::Value;

use crate::error::QueryError;
use crate::query::metrics::metric_spec;
use crate::query::{
    BuildContext, FragmentKind, QueryPlan, Route, WhereFragment, assemble_where,
    standard_filters,
};

pub static ROUTES: &[Route] = &[
    Route {
        name: "player-hat-trick-count",
        matches: |ctx| ctx.analysis.metrics.iter().any(|m| m == "Hat-tricks"),
        build: build_hat_trick_count,
    },
    Route {
        name: "player-season-breakdown",
        matches: |ctx| {
            ctx.has_phrase("per season")
                || ctx.has_phrase("each season")
                || ctx.has_phrase("by season")
                || ctx.has_phrase("every season")
        },
        build: build_season_breakdown,
    },
    Route {
        name: "player-ranking",
        // A superlative with a single named player ("most goals for Luke
        // Bangs") is a lookup for that player, not a ranking of everyone.
        matches: |ctx| {
            ctx.analysis.entities.len() >= 2
                || (ctx.analysis.entities.is_empty() && !ctx.analysis.indicators.is_empty())
        },
        build: build_ranking,
    },
    Route {
        name: "player-filtered-aggregate",
        matches: |ctx| {
            ctx.needs_detail_join()
                || primary_metric(ctx)
                    .map(|key| metric_spec(&key).is_ok_and(|m| m.needs_detail()))
                    .unwrap_or(false)
        },
        build: build_filtered_aggregate,
    },
    Route {
        name: "player-summary",
        matches: |_| true,
        build: build_summary,
    },
];

/// The stat this question is about, defaulting to goals for phrasings like
/// "who scored the most".
fn primary_metric(ctx: &BuildContext) -> Option<String> {
    ctx.analysis.metrics.first().cloned().or_else(|| {
        ctx.has_word("scored")
            .then(|| "Goals".to_string())
    })
}

/// Value expression against the summary node, honoring combined goal
/// involvements (goals plus assists).
fn summary_value(ctx: &BuildContext, alias: &str) -> Result<String, QueryError> {
    if ctx.analysis.goal_involvements {
        return Ok(format!("{alias}.totalGoals + {alias}.totalAssists"));
    }
    let key = primary_metric(ctx).ok_or_else(|| QueryError::NoRoute {
        question_type: ctx.analysis.question_type.to_string(),
    })?;
    Ok(metric_spec(&key)?.summary_expression(alias))
}

/// Aggregate expression against per-match detail rows.
fn detail_value(ctx: &BuildContext, alias: &str) -> Result<String, QueryError> {
    if ctx.analysis.goal_involvements {
        return Ok(format!(
            "coalesce(sum({alias}.goals), 0) + coalesce(sum({alias}.assists), 0)"
        ));
    }
    let key = primary_metric(ctx).ok_or_else(|| QueryError::NoRoute {
        question_type: ctx.analysis.question_type.to_string(),
    })?;
    metric_spec(&key)?.detail_expression(alias)
}

fn require_player(ctx: &BuildContext, plan: &mut QueryPlan) -> Result<(), QueryError> {
    let name = ctx
        .analysis
        .entities
        .first()
        .ok_or_else(|| QueryError::NoRoute {
            question_type: ctx.analysis.question_type.to_string(),
        })?;
    plan.bind("player", Value::String(name.clone()))?;
    Ok(())
}

fn build_summary(ctx: &BuildContext) -> Result<QueryPlan, QueryError> {
    let mut plan = QueryPlan::new("player-summary");
    require_player(ctx, &mut plan)?;
    let value = summary_value(ctx, "p")?;
    plan.text = format!(
        "MATCH (p:Player) WHERE toLower(p.name) = toLower($player) RETURN {value} AS value"
    );
    Ok(plan)
}

fn build_filtered_aggregate(ctx: &BuildContext) -> Result<QueryPlan, QueryError> {
    let mut plan = QueryPlan::new("player-filtered-aggregate");
    require_player(ctx, &mut plan)?;
    let value = detail_value(ctx, "m")?;

    let mut fragments = vec![WhereFragment::new(
        FragmentKind::IndexedEquality,
        "toLower(p.name) = toLower($player)",
    )];
    standard_filters(&mut plan, &mut fragments, ctx, "m");

    plan.text = format!(
        "MATCH (p:Player)-[:PLAYED_IN]->(m:MatchDetail) WHERE {} RETURN {value} AS value",
        assemble_where(fragments)
    );
    Ok(plan)
}

fn build_hat_trick_count(ctx: &BuildContext) -> Result<QueryPlan, QueryError> {
    let mut plan = QueryPlan::new("player-hat-trick-count");
    require_player(ctx, &mut plan)?;
    let value = metric_spec("Hat-tricks")?.detail_expression("m")?;

    let mut fragments = vec![WhereFragment::new(
        FragmentKind::IndexedEquality,
        "toLower(p.name) = toLower($player)",
    )];
    standard_filters(&mut plan, &mut fragments, ctx, "m");

    plan.text = format!(
        "MATCH (p:Player)-[:PLAYED_IN]->(m:MatchDetail) WHERE {} RETURN {value} AS value",
        assemble_where(fragments)
    );
    Ok(plan)
}

fn build_season_breakdown(ctx: &BuildContext) -> Result<QueryPlan, QueryError> {
    let mut plan = QueryPlan::new("player-season-breakdown");
    require_player(ctx, &mut plan)?;
    let value = detail_value(ctx, "m")?;

    let mut fragments = vec![WhereFragment::new(
        FragmentKind::IndexedEquality,
        "toLower(p.name) = toLower($player)",
    )];
    standard_filters(&mut plan, &mut fragments, ctx, "m");

    plan.text = format!(
        "MATCH (p:Player)-[:PLAYED_IN]->(m:MatchDetail) WHERE {} \
         RETURN m.season AS season, {value} AS value ORDER BY season",
        assemble_where(fragments)
    );
    Ok(plan)
}

/// Ranking and head-to-head comparison. Two or more named players compare
/// just those; otherwise the whole player set is ranked and the top row
/// returned. "Least"/"Lowest" indicators flip the sort.
fn build_ranking(ctx: &BuildContext) -> Result<QueryPlan, QueryError> {
    let mut plan = QueryPlan::new("player-ranking");
    let ascending = ctx
        .analysis
        .indicators
        .iter()
        .any(|i| i == "Least" || i == "Lowest");
    let direction = if ascending { "ASC" } else { "DESC" };

    if ctx.analysis.entities.len() >= 2 {
        plan.bind(
            "players",
            Value::Array(
                ctx.analysis
                    .entities
                    .iter()
                    .map(|e| Value::String(e.to_lowercase()))
                    .collect(),
            ),
        )?;
        if ctx.needs_detail_join() {
            let value = detail_value(ctx, "m")?;
            let mut fragments = vec![WhereFragment::new(
                FragmentKind::SetMembership,
                "toLower(p.name) IN $players",
            )];
            standard_filters(&mut plan, &mut fragments, ctx, "m");
            plan.text = format!(
                "MATCH (p:Player)-[:PLAYED_IN]->(m:MatchDetail) WHERE {} \
                 RETURN p.name AS name, {value} AS value ORDER BY value {direction}",
                assemble_where(fragments)
            );
        } else {
            let value = summary_value(ctx, "p")?;
            plan.text = format!(
                "MATCH (p:Player) WHERE toLower(p.name) IN $players \
                 RETURN p.name AS name, {value} AS value ORDER BY value {direction}"
            );
        }
    } else if ctx.needs_detail_join() {
        let value = detail_value(ctx, "m")?;
        let mut fragments = Vec::new();
        standard_filters(&mut plan, &mut fragments, ctx, "m");
        let clause = assemble_where(fragments);
        let where_part = if clause.is_empty() {
            String::new()
        } else {
            format!("WHERE {clause} ")
        };
        plan.text = format!(
            "MATCH (p:Player)-[:PLAYED_IN]->(m:MatchDetail) {where_part}\
             RETURN p.name AS name, {value} AS value ORDER BY value {direction} LIMIT 1",
        );
    } else {
        let value = summary_value(ctx, "p")?;
        plan.text = format!(
            "MATCH (p:Player) RETURN p.name AS name, {value} AS value \
             ORDER BY value {direction} LIMIT 1"
        );
    }
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
    fn plain_goals_question_uses_summary_field() {
        let plan = plan_for("How many goals has Luke Bangs scored?");
        assert_eq!(plan.route, "player-summary");
        assert_eq!(
            plan.text,
            "MATCH (p:Player) WHERE toLower(p.name) = toLower($player) \
             RETURN p.totalGoals AS value"
        );
        assert!(!plan.text.contains("MatchDetail"));
        assert_eq!(plan.params["player"], Value::String("Luke Bangs".into()));
    }

    #[test]
    fn season_filter_forces_detail_join() {
        let plan = plan_for("How many goals did Luke Bangs score in 2017/18?");
        assert_eq!(plan.route, "player-filtered-aggregate");
        assert!(plan.text.contains("MatchDetail"));
        assert!(plan.text.contains("m.season = $season"));
        assert_eq!(plan.params["season"], Value::String("2017/18".into()));
    }

    #[test]
    fn name_filter_precedes_date_range() {
        let plan = plan_for("How many goals has Luke Bangs scored since 2020?");
        let name_at = plan.text.find("toLower(p.name)").unwrap();
        let date_at = plan.text.find("m.date >=").unwrap();
        assert!(name_at < date_at);
    }

    #[test]
    fn hat_tricks_count_qualifying_matches() {
        let plan = plan_for("How many hat-tricks does Luke Bangs have?");
        assert_eq!(plan.route, "player-hat-trick-count");
        assert!(plan.text.contains("count(CASE WHEN m.goals >= 3 THEN 1 END)"));
    }

    #[test]
    fn ratio_metric_guards_division() {
        let plan = plan_for("What is the goals per appearance for Luke Bangs?");
        assert_eq!(plan.route, "player-summary");
        assert!(plan.text.contains("CASE WHEN p.totalAppearances = 0"));
    }

    #[test]
    fn superlative_ranks_all_players() {
        let plan = plan_for("Who scored the most goals?");
        assert_eq!(plan.route, "player-ranking");
        assert!(plan.text.contains("ORDER BY value DESC LIMIT 1"));
    }

    #[test]
    fn single_player_superlative_is_a_lookup_not_a_ranking() {
        let plan = plan_for("Most goals for Luke Bangs");
        assert_eq!(plan.route, "player-summary");
        assert_eq!(plan.params["player"], Value::String("Luke Bangs".into()));
        assert!(!plan.text.contains("LIMIT 1"));
    }

    #[test]
    fn least_flips_the_sort() {
        let plan = plan_for("Who has the least yellow cards?");
        assert!(plan.text.contains("ORDER BY value ASC"));
    }

    #[test]
    fn two_players_compare_by_name_set() {
        let plan = plan_for("Compare goals for Luke Bangs and Sam Hartley");
        assert_eq!(plan.route, "player-ranking");
        assert!(plan.text.contains("toLower(p.name) IN $players"));
        assert_eq!(
            plan.params["players"],
            Value::Array(vec![
                Value::String("luke bangs".into()),
                Value::String("sam hartley".into()),
            ])
        );
    }

    #[test]
    fn goal_involvements_combine_goals_and_assists() {
        let plan = plan_for("How many goal involvements does Luke Bangs have?");
        assert!(plan.text.contains("p.totalGoals + p.totalAssists"));
    }

    #[test]
    fn opposition_filter_is_parameterized() {
        let plan = plan_for("How many goals has Luke Bangs scored against Ashford Town?");
        assert!(plan.text.contains("toLower(m.opposition) IN $opposition"));
        assert!(!plan.text.contains("Ashford"));
        assert!(plan.display_text().contains("ashford town"));
    }

    #[test]
    fn season_breakdown_groups_by_season() {
        let plan = plan_for("Show goals per season for Luke Bangs");
        assert_eq!(plan.route, "player-season-breakdown");
        assert!(plan.text.contains("m.season AS season"));
        assert!(plan.text.ends_with("ORDER BY season"));
    }
}
