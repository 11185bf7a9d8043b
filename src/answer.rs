//! Answer assembly: graph rows in, user-facing answer out.
//!
//! Formatting keys off the route that produced the rows and the shape of the
//! columns. Failure stays data, not panic: an empty result set becomes a
//! polite not-found answer and an execution error becomes a failed outcome
//! with the message preserved for the debug trail.

use serde::Serialize;
use serde_json::Value;

use crate::analyze::QuestionAnalysis;
use crate::graph::Row;

/// What came back from executing the plan.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Rows(Vec<Row>),
    NotFound { reason: String },
    Failed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualizationKind {
    Bar,
    Line,
}

/// Chart-ready series attached to answers with per-label values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Visualization {
    pub kind: VisualizationKind,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// Pipeline trace for `--debug` output and logs. The rendered query has
/// parameter values substituted for display; execution always used the
/// parameterized form.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerDebug {
    pub question: String,
    pub question_type: String,
    pub route: String,
    pub rendered_query: String,
    pub cache_hit: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    /// Scalar payload when the answer is a single value.
    pub value: Option<Value>,
    pub visualization: Option<Visualization>,
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<AnswerDebug>,
}

impl Answer {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: None,
            visualization: None,
            suggestions: Vec::new(),
            debug: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Render rows from `route` into an answer. `question` is the lowercased
/// question text; streak answers read the run flavour from it.
pub fn format_answer(
    analysis: &QuestionAnalysis,
    question: &str,
    route: &str,
    rows: &[Row],
) -> Answer {
    if rows.is_empty() {
        return not_found(analysis);
    }
    match route {
        "team-result-sequence" => format_streak(analysis, question, rows),
        "fixture-head-to-head" => format_head_to_head(rows),
        "fixture-last-result" | "team-biggest-win" => format_scoreline(rows),
        "fixture-list" | "fixture-double-game-week" => format_fixture_list(rows),
        "club-awards" => format_awards(rows),
        _ => format_general(analysis, rows),
    }
}

/// Subject of the question, for sentence templates.
fn subject(analysis: &QuestionAnalysis) -> String {
    analysis
        .entities
        .first()
        .or_else(|| analysis.team_entities.first())
        .cloned()
        .unwrap_or_else(|| "the club".to_string())
}

fn metric_phrase(analysis: &QuestionAnalysis) -> String {
    if analysis.goal_involvements {
        "goal involvements".to_string()
    } else {
        analysis
            .metrics
            .first()
            .map(|m| m.to_lowercase())
            .unwrap_or_else(|| "goals".to_string())
    }
}

fn render_number(value: &Value) -> String {
    match value {
        Value::Number(n) if n.is_f64() => format!("{:.2}", n.as_f64().unwrap_or(0.0)),
        other => render_scalar(other),
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn not_found(analysis: &QuestionAnalysis) -> Answer {
    Answer::plain(format!(
        "I couldn't find any records for {} matching that question.",
        subject(analysis)
    ))
}

/// Single value, ranking list, or season breakdown, keyed on columns.
fn format_general(analysis: &QuestionAnalysis, rows: &[Row]) -> Answer {
    let first = &rows[0];

    if first.contains_key("season") && first.contains_key("value") {
        return format_breakdown(analysis, rows);
    }

    if first.contains_key("name") && first.contains_key("value") {
        return format_ranking(analysis, rows);
    }

    let value = first.get("value").cloned().unwrap_or(Value::Null);
    let text = match &value {
        Value::Null => {
            return not_found(analysis);
        }
        Value::String(s) => format!("{}.", s),
        number => format!(
            "{} has {} {}.",
            subject(analysis),
            render_number(number),
            metric_phrase(analysis)
        ),
    };
    Answer {
        text,
        value: Some(value),
        visualization: None,
        suggestions: Vec::new(),
        debug: None,
    }
}

fn format_breakdown(analysis: &QuestionAnalysis, rows: &[Row]) -> Answer {
    let mut labels = Vec::with_capacity(rows.len());
    let mut values = Vec::with_capacity(rows.len());
    let mut lines = Vec::with_capacity(rows.len());
    for row in rows {
        let season = row.get("season").map(render_scalar).unwrap_or_default();
        let value = row.get("value").cloned().unwrap_or(Value::Null);
        lines.push(format!("{season}: {}", render_number(&value)));
        labels.push(season);
        values.push(value.as_f64().unwrap_or(0.0));
    }
    Answer {
        text: format!(
            "{} {} by season:\n{}",
            subject(analysis),
            metric_phrase(analysis),
            lines.join("\n")
        ),
        value: None,
        visualization: Some(Visualization {
            kind: VisualizationKind::Line,
            labels,
            values,
        }),
        suggestions: Vec::new(),
        debug: None,
    }
}

fn format_ranking(analysis: &QuestionAnalysis, rows: &[Row]) -> Answer {
    let metric = metric_phrase(analysis);
    if rows.len() == 1 {
        let row = &rows[0];
        let name = row.get("name").map(render_scalar).unwrap_or_default();
        let value = row.get("value").cloned().unwrap_or(Value::Null);
        return Answer {
            text: format!("{name} leads with {} {metric}.", render_number(&value)),
            value: Some(value),
            visualization: None,
            suggestions: Vec::new(),
            debug: None,
        };
    }

    let mut labels = Vec::with_capacity(rows.len());
    let mut values = Vec::with_capacity(rows.len());
    let mut lines = Vec::with_capacity(rows.len());
    for row in rows {
        let name = row.get("name").map(render_scalar).unwrap_or_default();
        let value = row.get("value").cloned().unwrap_or(Value::Null);
        lines.push(format!("{name}: {}", render_number(&value)));
        labels.push(name);
        values.push(value.as_f64().unwrap_or(0.0));
    }
    Answer {
        text: format!("Comparing {metric}:\n{}", lines.join("\n")),
        value: None,
        visualization: Some(Visualization {
            kind: VisualizationKind::Bar,
            labels,
            values,
        }),
        suggestions: Vec::new(),
        debug: None,
    }
}

fn format_head_to_head(rows: &[Row]) -> Answer {
    let row = &rows[0];
    let wins = row.get("wins").and_then(Value::as_i64).unwrap_or(0);
    let draws = row.get("draws").and_then(Value::as_i64).unwrap_or(0);
    let losses = row.get("losses").and_then(Value::as_i64).unwrap_or(0);
    let played = wins + draws + losses;
    Answer::plain(format!(
        "Played {played}: {wins} wins, {draws} draws, {losses} losses."
    ))
}

fn format_scoreline(rows: &[Row]) -> Answer {
    let row = &rows[0];
    let date = row.get("date").map(render_scalar).unwrap_or_default();
    let opposition = row.get("opposition").map(render_scalar).unwrap_or_default();
    let goals_for = row.get("goalsFor").and_then(Value::as_i64).unwrap_or(0);
    let goals_against = row.get("goalsAgainst").and_then(Value::as_i64).unwrap_or(0);
    Answer::plain(format!(
        "{goals_for}-{goals_against} against {opposition} on {date}."
    ))
}

fn format_fixture_list(rows: &[Row]) -> Answer {
    let lines: Vec<String> = rows
        .iter()
        .map(|row| {
            let date = row.get("date").map(render_scalar).unwrap_or_default();
            let opposition = row.get("opposition").map(render_scalar).unwrap_or_default();
            let result = row.get("result").map(render_scalar).unwrap_or_default();
            match (row.get("goalsFor"), row.get("goalsAgainst")) {
                (Some(gf), Some(ga)) => format!(
                    "{date}  {opposition}  {}-{} ({result})",
                    render_scalar(gf),
                    render_scalar(ga)
                ),
                _ => format!("{date}  {opposition}  ({result})"),
            }
        })
        .collect();
    Answer::plain(format!("{} fixtures:\n{}", rows.len(), lines.join("\n")))
}

fn format_awards(rows: &[Row]) -> Answer {
    let lines: Vec<String> = rows
        .iter()
        .map(|row| {
            let award = row.get("award").map(render_scalar).unwrap_or_default();
            let name = row.get("name").map(render_scalar).unwrap_or_default();
            let season = row.get("season").map(render_scalar).unwrap_or_default();
            format!("{season}: {award} - {name}")
        })
        .collect();
    Answer::plain(lines.join("\n"))
}

// ---------------------------------------------------------------------------
// Streaks
// ---------------------------------------------------------------------------

/// Which results keep a run alive, chosen from the question wording.
/// Unbeaten is the default and tolerates draws.
fn run_predicate(question: &str) -> (fn(&str) -> bool, &'static str) {
    if question.contains("losing") || question.contains("without a win") {
        (|r| r == "L", "losing")
    } else if question.contains("winning") || question.contains("wins in a row") {
        (|r| r == "W", "winning")
    } else {
        (|r| r == "W" || r == "D", "unbeaten")
    }
}

/// Longest run of results satisfying `keeps` in an ordered sequence.
pub fn longest_run(results: &[String], keeps: fn(&str) -> bool) -> usize {
    let mut best = 0usize;
    let mut current = 0usize;
    for result in results {
        if keeps(result) {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

fn format_streak(analysis: &QuestionAnalysis, question: &str, rows: &[Row]) -> Answer {
    let (keeps, label) = run_predicate(question);
    let results: Vec<String> = rows
        .iter()
        .filter_map(|row| row.get("result").map(render_scalar))
        .collect();
    let run = longest_run(&results, keeps);
    Answer {
        text: format!(
            "The longest {label} run for {} is {run} games.",
            subject(analysis)
        ),
        value: Some(Value::from(run as u64)),
        visualization: None,
        suggestions: Vec::new(),
        debug: None,
    }
}

// ---------------------------------------------------------------------------
// Suggestions
// ---------------------------------------------------------------------------

/// Follow-up prompts attached to successful answers, by question type.
pub fn suggestions_for(analysis: &QuestionAnalysis) -> Vec<String> {
    use crate::analyze::QuestionType::*;
    match analysis.question_type {
        Player => vec![
            "How does that compare to last season?".to_string(),
            format!("Show {} for {} per season", metric_phrase(analysis), subject(analysis)),
        ],
        Team => vec![
            "What about away games only?".to_string(),
            format!("Where did {} finish in the league?", subject(analysis)),
        ],
        Comparison => vec!["Who is second?".to_string()],
        Fixture | DoubleGameWeek => vec!["What was the biggest win?".to_string()],
        _ => Vec::new(),
    }
}

/// Suggestions attached to failure answers. Question types without tailored
/// follow-ups get generic starters so a failed ask never dead-ends.
pub fn failure_suggestions(analysis: &QuestionAnalysis) -> Vec<String> {
    let tailored = suggestions_for(analysis);
    if !tailored.is_empty() {
        return tailored;
    }
    vec![
        "Who scored the most goals?".to_string(),
        "How many games did the 1s win this season?".to_string(),
    ]
}
