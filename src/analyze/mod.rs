//! Question analyzer: classification, complexity, and clarification.
//!
//! Classification is a prioritized cascade of `(name, predicate)` rules held
//! in [`CLASSIFIER_RULES`], evaluated in declaration order with first match
//! winning. The order is deliberate and load-bearing: specific intents
//! (temporal, streak) sit above generic ones (player) so that "goals since
//! 2020" keeps its date filter instead of degrading to a plain player lookup.
//! Keeping the order in one slice makes it testable on its own.

use serde::Serialize;

use crate::extract::{ExtractionResult, TimeFrameKind};

/// Domain classification of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    ClarificationNeeded,
    Temporal,
    Streak,
    DoubleGameWeek,
    Comparison,
    Team,
    Club,
    Fixture,
    Player,
    General,
}

impl QuestionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClarificationNeeded => "clarification_needed",
            Self::Temporal => "temporal",
            Self::Streak => "streak",
            Self::DoubleGameWeek => "double_game_week",
            Self::Comparison => "comparison",
            Self::Team => "team",
            Self::Club => "club",
            Self::Fixture => "fixture",
            Self::Player => "player",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much is going on in the question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

/// Upper bound on entities/stats before the engine asks for clarification.
pub const MAX_ENTITIES: usize = 3;
pub const MAX_STATS: usize = 3;

pub const MSG_TOO_MANY_ENTITIES: &str =
    "I can handle up to 3 players or teams in one question. Try asking about fewer at a time.";
pub const MSG_TOO_MANY_STATS: &str =
    "That asks about too many statistics at once. Pick up to 3 and ask again.";
pub const MSG_MISSING_ENTITY: &str =
    "Which player or team do you mean? Add a name like \"Luke Bangs\" or \"the 2s\".";
pub const MSG_MISSING_STAT: &str =
    "Which statistic are you after? Try goals, assists, appearances or clean sheets.";
pub const MSG_SIMPLIFY: &str =
    "That question has a lot going on. Could you simplify it to one or two things?";

/// The analyzer's full output: everything the query builders need.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionAnalysis {
    pub question_type: QuestionType,
    /// Player-side entities (proper names, plus the context player for
    /// first-person questions), in question order.
    pub entities: Vec<String>,
    /// Canonical stat keys.
    pub metrics: Vec<String>,
    pub team_entities: Vec<String>,
    pub opposition_entities: Vec<String>,
    /// Entities mentioned after an exclusion phrase ("without the 3s").
    pub excluded_entities: Vec<String>,
    pub time_frames: Vec<TimeFrameKind>,
    pub locations: Vec<String>,
    pub competitions: Vec<String>,
    pub results: Vec<String>,
    pub indicators: Vec<String>,
    pub goal_involvements: bool,
    pub complexity: Complexity,
    pub requires_clarification: bool,
    pub clarification_message: Option<String>,
    /// Which classifier rule fired, for the debug trail.
    pub matched_rule: Option<&'static str>,
}

// ---------------------------------------------------------------------------
// Classifier rule table
// ---------------------------------------------------------------------------

/// Input handed to each classifier predicate.
pub struct RuleInput<'a> {
    /// Lowercased question text.
    pub question: &'a str,
    /// Lowercased word tokens of the question.
    pub words: Vec<&'a str>,
    pub extraction: &'a ExtractionResult,
    pub has_player_entity: bool,
    pub has_team_entity: bool,
}

impl RuleInput<'_> {
    fn has_word(&self, word: &str) -> bool {
        self.words.iter().any(|w| *w == word)
    }

    fn has_any_word(&self, words: &[&str]) -> bool {
        words.iter().any(|w| self.has_word(w))
    }

    fn has_phrase(&self, phrase: &str) -> bool {
        self.question.contains(phrase)
    }
}

/// One classification rule: first applicable rule in the slice wins.
pub struct ClassifierRule {
    pub name: &'static str,
    pub question_type: QuestionType,
    pub applies: fn(&RuleInput) -> bool,
}

/// Stat keys that indicate a player-statistic question even without a name.
const PLAYER_STATS: &[&str] = &[
    "Goals",
    "Open Play Goals",
    "Assists",
    "Goal Involvements",
    "Appearances",
    "Minutes",
    "Clean Sheets",
    "Yellow Cards",
    "Red Cards",
    "Own Goals",
    "Penalties",
    "Hat-tricks",
    "Man of the Match",
    "Goals per Appearance",
    "Minutes per Goal",
    "Clean Sheets per Appearance",
];

/// The classification cascade, highest priority first.
///
/// Explicit season/date mentions ("in 2017/18") are query filters, not a
/// temporal intent; only connective phrasings route here, so a team question
/// with a season stays a team question (the builder still applies the filter).
pub static CLASSIFIER_RULES: &[ClassifierRule] = &[
    ClassifierRule {
        name: "temporal-connective",
        question_type: QuestionType::Temporal,
        applies: |input| {
            input.has_any_word(&["since", "before", "until", "after"])
                || input.has_phrase("between")
        },
    },
    ClassifierRule {
        name: "streak",
        question_type: QuestionType::Streak,
        applies: |input| {
            input.has_any_word(&["streak", "consecutive", "unbeaten"])
                || input.has_phrase("in a row")
                || input.has_phrase("winning run")
                || input.has_phrase("losing run")
                || input.has_phrase("run of")
        },
    },
    ClassifierRule {
        name: "double-game-week",
        question_type: QuestionType::DoubleGameWeek,
        applies: |input| {
            input.has_phrase("double game week")
                || input.has_phrase("double gameweek")
                || input.has_phrase("twice in a week")
                || input.has_phrase("two games in a week")
        },
    },
    ClassifierRule {
        name: "comparison-superlative",
        question_type: QuestionType::Comparison,
        applies: |input| {
            input.has_any_word(&[
                "most", "least", "fewest", "highest", "lowest", "best", "worst", "top",
            ]) || input.has_any_word(&["compare", "versus", "vs"])
        },
    },
    ClassifierRule {
        name: "team-statistic",
        question_type: QuestionType::Team,
        applies: |input| {
            let league_position = input.has_phrase("league position")
                || input.has_any_word(&["table", "standings", "finish", "finished"]);
            league_position
                || (input.has_team_entity
                    && !input.has_player_entity
                    && input.extraction.stat_count() > 0)
        },
    },
    ClassifierRule {
        name: "club-affairs",
        question_type: QuestionType::Club,
        applies: |input| {
            input.has_any_word(&["captain", "award", "awards", "totw", "founded", "chairman"])
                || input.has_phrase("team of the week")
                || input.has_phrase("club record")
        },
    },
    ClassifierRule {
        name: "fixture-keywords",
        question_type: QuestionType::Fixture,
        // "score"/"scored" with a named player is a player stat question, so
        // this rule only fires without one.
        applies: |input| {
            !input.has_player_entity
                && (input.has_any_word(&[
                    "fixture", "fixtures", "match", "matches", "game", "games", "result",
                    "results", "score", "scoreline",
                ]) || input.has_phrase("head to head"))
        },
    },
    ClassifierRule {
        name: "player-statistic",
        question_type: QuestionType::Player,
        applies: |input| {
            input.has_player_entity
                || input
                    .extraction
                    .metric_values()
                    .iter()
                    .any(|m| PLAYER_STATS.contains(&m.as_str()))
        },
    },
];

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

/// Markers that turn the following name into an opposition reference.
const OPPOSITION_MARKERS: &[&str] = &["against", "vs", "versus", "v", "vs.", "v."];

/// Maximum gap (bytes) between a negation phrase and the entity it excludes.
const NEGATION_REACH: usize = 16;

#[derive(Debug, Clone, Copy, Default)]
pub struct Analyzer;

impl Analyzer {
    pub fn new() -> Self {
        Self
    }

    /// Classify the question and assemble the builder-facing analysis.
    ///
    /// `user_context` is the caller's selected player; it resolves
    /// first-person questions ("how many goals have I scored").
    pub fn analyze(
        &self,
        question: &str,
        extraction: &ExtractionResult,
        user_context: Option<&str>,
    ) -> QuestionAnalysis {
        let lower = question.to_lowercase();

        let (entities, opposition_entities, excluded_entities, team_entities) =
            split_entities(question, extraction, user_context);

        let entity_count = entities.len() + opposition_entities.len() + team_entities.len();
        let stat_count = extraction.stat_count();

        let complexity = complexity_of(extraction, entity_count, stat_count);

        let (classified, matched_rule) =
            classify(&lower, extraction, !entities.is_empty(), !team_entities.is_empty());
        let clarification = clarification_for(classified, entity_count, stat_count, complexity);

        let metrics = extraction.metric_values();
        let time_frames: Vec<TimeFrameKind> =
            extraction.time_frames.iter().map(|f| f.kind.clone()).collect();

        let (question_type, matched_rule) = if clarification.is_some() {
            (QuestionType::ClarificationNeeded, None)
        } else {
            (classified, matched_rule)
        };

        tracing::debug!(
            %question_type,
            rule = matched_rule.unwrap_or("fallback"),
            entities = entity_count,
            stats = stat_count,
            "question analyzed"
        );

        QuestionAnalysis {
            question_type,
            entities,
            metrics,
            team_entities,
            opposition_entities,
            excluded_entities,
            time_frames,
            locations: unique_values(&extraction.locations),
            competitions: unique_values(&extraction.competitions),
            results: unique_values(&extraction.results),
            indicators: unique_values(&extraction.stat_indicators),
            goal_involvements: extraction.goal_involvements,
            complexity,
            requires_clarification: clarification.is_some(),
            clarification_message: clarification.map(str::to_string),
            matched_rule,
        }
    }
}

fn classify(
    lower: &str,
    extraction: &ExtractionResult,
    has_player_entity: bool,
    has_team_entity: bool,
) -> (QuestionType, Option<&'static str>) {
    let input = RuleInput {
        question: lower,
        words: lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect(),
        extraction,
        has_player_entity,
        has_team_entity,
    };

    for rule in CLASSIFIER_RULES {
        if (rule.applies)(&input) {
            return (rule.question_type, Some(rule.name));
        }
    }
    (QuestionType::General, None)
}

fn complexity_of(extraction: &ExtractionResult, entity_count: usize, stat_count: usize) -> Complexity {
    if entity_count > MAX_ENTITIES || stat_count > MAX_STATS {
        Complexity::Complex
    } else if entity_count > 1
        || stat_count > 1
        || extraction.time_frames.len() > 1
        || !extraction.negations.is_empty()
        || extraction.locations.len() > 1
    {
        Complexity::Moderate
    } else {
        Complexity::Simple
    }
}

/// Pick the clarification message matching the specific deficiency, checked in
/// a fixed order so the most actionable guidance wins.
///
/// The limits apply to every question. The missing-entity and missing-stat
/// checks apply only where the question type actually needs them: comparison
/// questions name their entity in the answer ("who scored the most goals"),
/// and club, streak, and fixture questions carry no stat key at all. Temporal
/// questions bind a player or team and a stat in every route, so "goals since
/// 2020" with no name clarifies instead of failing to build.
fn clarification_for(
    question_type: QuestionType,
    entity_count: usize,
    stat_count: usize,
    complexity: Complexity,
) -> Option<&'static str> {
    let needs_subject = matches!(
        question_type,
        QuestionType::Player | QuestionType::General | QuestionType::Temporal
    );
    if entity_count > MAX_ENTITIES {
        Some(MSG_TOO_MANY_ENTITIES)
    } else if stat_count > MAX_STATS {
        Some(MSG_TOO_MANY_STATS)
    } else if needs_subject && entity_count == 0 {
        Some(MSG_MISSING_ENTITY)
    } else if needs_subject && stat_count == 0 {
        Some(MSG_MISSING_STAT)
    } else if complexity == Complexity::Complex {
        Some(MSG_SIMPLIFY)
    } else {
        None
    }
}

/// Split extracted entities into player-side, opposition, excluded, and team
/// buckets using the surrounding text.
fn split_entities(
    question: &str,
    extraction: &ExtractionResult,
    user_context: Option<&str>,
) -> (Vec<String>, Vec<String>, Vec<String>, Vec<String>) {
    let mut players: Vec<String> = Vec::new();
    let mut oppositions: Vec<String> = Vec::new();
    let mut excluded: Vec<String> = Vec::new();
    let mut teams: Vec<String> = Vec::new();

    if extraction.first_person {
        if let Some(me) = user_context {
            players.push(me.to_string());
        }
    }

    for span in &extraction.names {
        let value = span.value.clone();
        if is_negated(extraction, span.position) {
            push_unique(&mut excluded, value);
        } else if follows_marker(question, span.position, OPPOSITION_MARKERS) {
            push_unique(&mut oppositions, value);
        } else {
            push_unique(&mut players, value);
        }
    }

    for span in &extraction.team_entities {
        let value = span.value.clone();
        if is_negated(extraction, span.position) {
            push_unique(&mut excluded, value);
        } else {
            push_unique(&mut teams, value);
        }
    }

    (players, oppositions, excluded, teams)
}

fn is_negated(extraction: &ExtractionResult, position: usize) -> bool {
    extraction.negations.iter().any(|neg| {
        let end = neg.position + neg.original_text.len();
        position > end && position - end <= NEGATION_REACH
    })
}

fn follows_marker(question: &str, position: usize, markers: &[&str]) -> bool {
    let prefix = question[..position].trim_end().to_lowercase();
    markers
        .iter()
        .any(|m| prefix.ends_with(m) && ends_at_word_boundary(&prefix, m))
}

fn ends_at_word_boundary(prefix: &str, suffix: &str) -> bool {
    prefix.len() == suffix.len()
        || prefix[..prefix.len() - suffix.len()]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric())
}

fn unique_values(spans: &[crate::extract::ExtractedSpan]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for span in spans {
        push_unique(&mut out, span.value.clone());
    }
    out
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.iter().any(|v| v.eq_ignore_ascii_case(&value)) {
        list.push(value);
    }
}
