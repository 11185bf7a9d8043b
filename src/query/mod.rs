//! Query planning: turn a [`QuestionAnalysis`] into a parameterized plan.
//!
//! Each domain module owns an ordered table of `(predicate, builder)` routes;
//! the first route whose predicate accepts the analysis builds the plan. The
//! plan carries query text with `$param` placeholders plus a parameter map.
//! Values never enter the text; [`QueryPlan::display_text`] substitutes them
//! for logs and dry runs only.

pub mod fixture;
pub mod metrics;
pub mod player;
pub mod team;

use serde_json::Value;

use crate::analyze::{QuestionAnalysis, QuestionType};
use crate::error::QueryError;
use crate::extract::{TimeFrameKind, previous_season};
use crate::graph::Params;

// ---------------------------------------------------------------------------
// Query plan
// ---------------------------------------------------------------------------

/// A parameterized graph query ready for execution.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub text: String,
    pub params: Params,
    /// Name of the route that built this plan.
    pub route: &'static str,
}

impl QueryPlan {
    pub fn new(route: &'static str) -> Self {
        Self {
            text: String::new(),
            params: Params::new(),
            route,
        }
    }

    /// Bind a named parameter. Binding the same name twice is a builder bug
    /// and surfaces as an error rather than a silent overwrite.
    pub fn bind(&mut self, name: &str, value: Value) -> Result<(), QueryError> {
        if self.params.contains_key(name) {
            return Err(QueryError::DuplicateParam {
                name: name.to_string(),
            });
        }
        self.params.insert(name.to_string(), value);
        Ok(())
    }

    /// Bind under a generated name with the given prefix and return the
    /// `$placeholder` to splice into the query text.
    pub fn fresh_param(&mut self, prefix: &str, value: Value) -> String {
        let mut n = self.params.keys().filter(|k| k.starts_with(prefix)).count();
        let name = loop {
            let candidate = if n == 0 {
                prefix.to_string()
            } else {
                format!("{prefix}{n}")
            };
            if !self.params.contains_key(&candidate) {
                break candidate;
            }
            n += 1;
        };
        self.params.insert(name.clone(), value);
        format!("${name}")
    }

    /// Render the query with parameter values substituted in. Display only:
    /// the rendered text is never sent to the graph.
    pub fn display_text(&self) -> String {
        let mut keys: Vec<&String> = self.params.keys().collect();
        // Longest first so $season2 is not clobbered by $season.
        keys.sort_by_key(|k| std::cmp::Reverse(k.len()));
        let mut out = self.text.clone();
        for key in keys {
            out = out.replace(&format!("${key}"), &render_value(&self.params[key]));
        }
        out
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s.replace('\'', "\\'")),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// WHERE fragments
// ---------------------------------------------------------------------------

/// Fragment categories, in the order they should appear in a WHERE clause:
/// indexed equality first, then date ranges, then set membership, then the
/// rest. Sorting is stable, so fragments of equal kind keep insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FragmentKind {
    IndexedEquality,
    DateRange,
    SetMembership,
    Other,
}

#[derive(Debug, Clone)]
pub struct WhereFragment {
    pub kind: FragmentKind,
    pub text: String,
}

impl WhereFragment {
    pub fn new(kind: FragmentKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Assemble fragments into a WHERE clause body, reordered by kind.
pub fn assemble_where(mut fragments: Vec<WhereFragment>) -> String {
    fragments.sort_by_key(|f| f.kind);
    fragments
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join(" AND ")
}

// ---------------------------------------------------------------------------
// Build context and shared filters
// ---------------------------------------------------------------------------

/// Everything a route builder gets to work with.
pub struct BuildContext<'a> {
    pub analysis: &'a QuestionAnalysis,
    /// Lowercased question text, for keyword-sensitive routes.
    pub question: &'a str,
    /// The season currently underway, if the graph knows it.
    pub current_season: Option<String>,
}

impl BuildContext<'_> {
    pub fn has_word(&self, word: &str) -> bool {
        self.question
            .split(|c: char| !c.is_alphanumeric())
            .any(|w| w == word)
    }

    pub fn has_any_word(&self, words: &[&str]) -> bool {
        words.iter().any(|w| self.has_word(w))
    }

    pub fn has_phrase(&self, phrase: &str) -> bool {
        self.question.contains(phrase)
    }

    /// Whether any aspect of the analysis forces a per-match detail join.
    pub fn needs_detail_join(&self) -> bool {
        let a = self.analysis;
        !a.time_frames.is_empty()
            || !a.opposition_entities.is_empty()
            || !a.locations.is_empty()
            || !a.competitions.is_empty()
            || !a.results.is_empty()
            || !a.excluded_entities.is_empty()
    }
}

/// Add the analysis-derived filters (time frames, opposition, venue,
/// competition, results, exclusions) as fragments against the per-match
/// detail alias.
pub fn standard_filters(
    plan: &mut QueryPlan,
    fragments: &mut Vec<WhereFragment>,
    ctx: &BuildContext,
    alias: &str,
) {
    let analysis = ctx.analysis;

    for frame in &analysis.time_frames {
        time_frame_filter(plan, fragments, frame, ctx.current_season.as_deref(), alias);
    }

    if !analysis.opposition_entities.is_empty() {
        let placeholder = plan.fresh_param(
            "opposition",
            Value::Array(
                analysis
                    .opposition_entities
                    .iter()
                    .map(|o| Value::String(o.to_lowercase()))
                    .collect(),
            ),
        );
        fragments.push(WhereFragment::new(
            FragmentKind::SetMembership,
            format!("toLower({alias}.opposition) IN {placeholder}"),
        ));
    }

    for location in &analysis.locations {
        let placeholder = plan.fresh_param("venue", Value::String(location.clone()));
        fragments.push(WhereFragment::new(
            FragmentKind::IndexedEquality,
            format!("{alias}.venue = {placeholder}"),
        ));
    }

    for competition in &analysis.competitions {
        let placeholder = plan.fresh_param("competition", Value::String(competition.clone()));
        fragments.push(WhereFragment::new(
            FragmentKind::IndexedEquality,
            format!("{alias}.competition = {placeholder}"),
        ));
    }

    if !analysis.results.is_empty() {
        let placeholder = plan.fresh_param(
            "result",
            Value::Array(
                analysis
                    .results
                    .iter()
                    .map(|r| Value::String(r.clone()))
                    .collect(),
            ),
        );
        fragments.push(WhereFragment::new(
            FragmentKind::SetMembership,
            format!("{alias}.result IN {placeholder}"),
        ));
    }

    if !analysis.excluded_entities.is_empty() {
        let placeholder = plan.fresh_param(
            "excluded",
            Value::Array(
                analysis
                    .excluded_entities
                    .iter()
                    .map(|e| Value::String(e.to_lowercase()))
                    .collect(),
            ),
        );
        fragments.push(WhereFragment::new(
            FragmentKind::SetMembership,
            format!("NOT toLower({alias}.team) IN {placeholder} \
                     AND NOT toLower({alias}.opposition) IN {placeholder}"),
        ));
    }
}

/// Translate one time frame into a WHERE fragment.
///
/// A relative frame that cannot be anchored (no current season from the
/// graph) adds no filter; the query falls back to all-time, which beats
/// failing outright.
fn time_frame_filter(
    plan: &mut QueryPlan,
    fragments: &mut Vec<WhereFragment>,
    frame: &TimeFrameKind,
    current_season: Option<&str>,
    alias: &str,
) {
    match frame {
        TimeFrameKind::Season(label) => {
            let p = plan.fresh_param("season", Value::String(label.clone()));
            fragments.push(WhereFragment::new(
                FragmentKind::IndexedEquality,
                format!("{alias}.season = {p}"),
            ));
        }
        TimeFrameKind::SinceYear(year) => {
            let p = plan.fresh_param("from", Value::String(format!("{year}-01-01")));
            fragments.push(WhereFragment::new(
                FragmentKind::DateRange,
                format!("{alias}.date >= date({p})"),
            ));
        }
        TimeFrameKind::BeforeYear(year) => {
            let p = plan.fresh_param("to", Value::String(format!("{year}-01-01")));
            fragments.push(WhereFragment::new(
                FragmentKind::DateRange,
                format!("{alias}.date < date({p})"),
            ));
        }
        TimeFrameKind::BeforeSeason(label) => {
            let p = plan.fresh_param("season", Value::String(label.clone()));
            fragments.push(WhereFragment::new(
                FragmentKind::Other,
                format!("{alias}.season < {p}"),
            ));
        }
        TimeFrameKind::Range { from, to } => {
            let p_from = plan.fresh_param("from", Value::String(format!("{from}-01-01")));
            let p_to = plan.fresh_param("to", Value::String(format!("{to}-12-31")));
            fragments.push(WhereFragment::new(
                FragmentKind::DateRange,
                format!("{alias}.date >= date({p_from})"),
            ));
            fragments.push(WhereFragment::new(
                FragmentKind::DateRange,
                format!("{alias}.date <= date({p_to})"),
            ));
        }
        TimeFrameKind::Date(date) => {
            let p = plan.fresh_param("date", Value::String(date.to_string()));
            fragments.push(WhereFragment::new(
                FragmentKind::IndexedEquality,
                format!("{alias}.date = date({p})"),
            ));
        }
        TimeFrameKind::LastSeason => match current_season.and_then(previous_season) {
            Some(label) => {
                let p = plan.fresh_param("season", Value::String(label));
                fragments.push(WhereFragment::new(
                    FragmentKind::IndexedEquality,
                    format!("{alias}.season = {p}"),
                ));
            }
            None => tracing::warn!("no current season available, skipping last-season filter"),
        },
        TimeFrameKind::ThisSeason => match current_season {
            Some(label) => {
                let p = plan.fresh_param("season", Value::String(label.to_string()));
                fragments.push(WhereFragment::new(
                    FragmentKind::IndexedEquality,
                    format!("{alias}.season = {p}"),
                ));
            }
            None => tracing::warn!("no current season available, skipping this-season filter"),
        },
        TimeFrameKind::AllTime => {}
    }
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// One entry in a domain's routing table.
pub struct Route {
    pub name: &'static str,
    pub matches: fn(&BuildContext) -> bool,
    pub build: fn(&BuildContext) -> Result<QueryPlan, QueryError>,
}

fn route_through(routes: &[Route], ctx: &BuildContext) -> Result<QueryPlan, QueryError> {
    for route in routes {
        if (route.matches)(ctx) {
            tracing::debug!(route = route.name, "query route selected");
            return (route.build)(ctx);
        }
    }
    Err(QueryError::NoRoute {
        question_type: ctx.analysis.question_type.to_string(),
    })
}

/// Dispatches an analysis to the routing table for its question type.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryRouter;

impl QueryRouter {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, ctx: &BuildContext) -> Result<QueryPlan, QueryError> {
        let analysis = ctx.analysis;
        let team_question =
            analysis.entities.is_empty() && !analysis.team_entities.is_empty();
        match analysis.question_type {
            QuestionType::Player => route_through(player::ROUTES, ctx),
            QuestionType::Team => route_through(team::ROUTES, ctx),
            QuestionType::Club => route_through(team::CLUB_ROUTES, ctx),
            QuestionType::Streak => route_through(team::STREAK_ROUTES, ctx),
            QuestionType::Fixture => route_through(fixture::ROUTES, ctx),
            QuestionType::DoubleGameWeek => route_through(fixture::DOUBLE_WEEK_ROUTES, ctx),
            QuestionType::Comparison => {
                if team_question {
                    route_through(team::ROUTES, ctx)
                } else {
                    route_through(player::ROUTES, ctx)
                }
            }
            QuestionType::Temporal => {
                if team_question {
                    route_through(team::ROUTES, ctx)
                } else {
                    route_through(player::ROUTES, ctx)
                }
            }
            QuestionType::General => {
                if team_question {
                    route_through(team::ROUTES, ctx)
                } else if !analysis.entities.is_empty() || !analysis.metrics.is_empty() {
                    route_through(player::ROUTES, ctx)
                } else {
                    Err(QueryError::NoRoute {
                        question_type: analysis.question_type.to_string(),
                    })
                }
            }
            QuestionType::ClarificationNeeded => Err(QueryError::NoRoute {
                question_type: analysis.question_type.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_param_is_rejected() {
        let mut plan = QueryPlan::new("test");
        plan.bind("player", Value::String("Luke Bangs".into())).unwrap();
        let err = plan.bind("player", Value::String("Sam Hartley".into())).unwrap_err();
        assert!(matches!(err, QueryError::DuplicateParam { name } if name == "player"));
    }

    #[test]
    fn fresh_param_numbers_collisions() {
        let mut plan = QueryPlan::new("test");
        assert_eq!(plan.fresh_param("season", Value::String("2017/18".into())), "$season");
        assert_eq!(plan.fresh_param("season", Value::String("2018/19".into())), "$season1");
    }

    #[test]
    fn display_text_substitutes_without_mutating_plan() {
        let mut plan = QueryPlan::new("test");
        plan.text = "MATCH (p:Player) WHERE p.name = $player RETURN p".into();
        plan.bind("player", Value::String("Luke Bangs".into())).unwrap();
        assert_eq!(
            plan.display_text(),
            "MATCH (p:Player) WHERE p.name = 'Luke Bangs' RETURN p"
        );
        assert!(plan.text.contains("$player"));
    }

    #[test]
    fn display_text_handles_prefix_overlap() {
        let mut plan = QueryPlan::new("test");
        plan.text = "$season AND $season1".into();
        plan.bind("season", Value::String("2017/18".into())).unwrap();
        plan.bind("season1", Value::String("2018/19".into())).unwrap();
        assert_eq!(plan.display_text(), "'2017/18' AND '2018/19'");
    }

    #[test]
    fn fragments_reorder_by_kind() {
        let clause = assemble_where(vec![
            WhereFragment::new(FragmentKind::Other, "m.season < '2019/20'"),
            WhereFragment::new(FragmentKind::SetMembership, "m.result IN ['W']"),
            WhereFragment::new(FragmentKind::IndexedEquality, "m.season = '2017/18'"),
            WhereFragment::new(FragmentKind::DateRange, "m.date >= date('2018-01-01')"),
        ]);
        assert_eq!(
            clause,
            "m.season = '2017/18' AND m.date >= date('2018-01-01') \
             AND m.result IN ['W'] AND m.season < '2019/20'"
        );
    }

    #[test]
    fn equal_kinds_keep_insertion_order() {
        let clause = assemble_where(vec![
            WhereFragment::new(FragmentKind::IndexedEquality, "a = 1"),
            WhereFragment::new(FragmentKind::IndexedEquality, "b = 2"),
        ]);
        assert_eq!(clause, "a = 1 AND b = 2");
    }
}
