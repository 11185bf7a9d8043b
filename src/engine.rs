//! Engine facade: top-level API for the dugout question pipeline.
//!
//! The `Engine` owns all subsystems and runs a question from free text to a
//! formatted answer: cache lookup, extraction, follow-up merging, analysis,
//! entity resolution, query building, execution, and formatting.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::analyze::{
    Analyzer, MSG_MISSING_ENTITY, MSG_MISSING_STAT, QuestionAnalysis, QuestionType,
};
use crate::answer::{Answer, AnswerDebug, failure_suggestions, format_answer, suggestions_for};
use crate::cache::{ResponseCache, cache_key};
use crate::error::{DugoutResult, EngineError, QueryError};
use crate::extract::Extractor;
use crate::graph::GraphClient;
use crate::query::{BuildContext, QueryPlan, QueryRouter};
use crate::resolve::{FuzzyResolver, ResolveCategory};

/// Configuration for the dugout engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum cached answers before the least recently used is evicted.
    pub cache_capacity: usize,
    /// How long a cached answer stays valid.
    pub cache_ttl: Duration,
    /// Minimum normalized similarity for fuzzy entity matches.
    pub similarity_threshold: f64,
    /// How far back a bare follow-up may borrow context from.
    pub max_history_turns: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 50,
            cache_ttl: Duration::from_secs(600),
            similarity_threshold: 0.7,
            max_history_turns: 3,
        }
    }
}

/// On-disk shape of the config file; every field is optional and falls back
/// to the default.
#[derive(Debug, Deserialize)]
struct FileConfig {
    cache_capacity: Option<usize>,
    cache_ttl_secs: Option<u64>,
    similarity_threshold: Option<f64>,
    max_history_turns: Option<usize>,
}

impl EngineConfig {
    /// Load configuration from a TOML file, falling back to defaults for
    /// fields the file omits.
    pub fn from_file(path: impl AsRef<Path>) -> DugoutResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| EngineError::ConfigFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let file: FileConfig = toml::from_str(&raw).map_err(|e| EngineError::ConfigFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let defaults = Self::default();
        Ok(Self {
            cache_capacity: file.cache_capacity.unwrap_or(defaults.cache_capacity),
            cache_ttl: file
                .cache_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            similarity_threshold: file
                .similarity_threshold
                .unwrap_or(defaults.similarity_threshold),
            max_history_turns: file.max_history_turns.unwrap_or(defaults.max_history_turns),
        })
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.cache_capacity == 0 {
            return Err(EngineError::InvalidConfig {
                message: "cache_capacity must be > 0".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(EngineError::InvalidConfig {
                message: "similarity_threshold must be within 0.0..=1.0".into(),
            });
        }
        Ok(())
    }
}

/// One prior conversation turn, kept by the caller for follow-up questions.
#[derive(Debug, Clone)]
pub struct HistoryTurn {
    pub question: String,
    pub entities: Vec<String>,
    pub metrics: Vec<String>,
    pub asked_at: DateTime<Utc>,
}

/// Dry-run output: the analysis and the plan that would be executed.
#[derive(Debug)]
pub struct PlanReport {
    pub analysis: QuestionAnalysis,
    pub plan: Option<QueryPlan>,
}

/// The dugout question-answering engine.
pub struct Engine {
    config: EngineConfig,
    client: Arc<dyn GraphClient>,
    extractor: Extractor,
    analyzer: Analyzer,
    router: QueryRouter,
    resolver: FuzzyResolver,
    cache: ResponseCache<Answer>,
}

impl Engine {
    /// Create a new engine with the given configuration. Warms the entity
    /// index from the graph; a cold graph degrades to pseudonym and exact
    /// matching rather than failing startup.
    pub fn new(client: Arc<dyn GraphClient>, config: EngineConfig) -> DugoutResult<Self> {
        config.validate()?;

        let resolver = FuzzyResolver::new(Arc::clone(&client), config.similarity_threshold);
        resolver.refresh();

        tracing::info!(
            cache_capacity = config.cache_capacity,
            cache_ttl_secs = config.cache_ttl.as_secs(),
            threshold = config.similarity_threshold,
            indexed = resolver.indexed_count(),
            "initializing dugout engine"
        );

        Ok(Self {
            cache: ResponseCache::new(config.cache_capacity, config.cache_ttl),
            config,
            client,
            extractor: Extractor::new(),
            analyzer: Analyzer::new(),
            router: QueryRouter::new(),
            resolver,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Answer a free-text question.
    ///
    /// `user_context` is the caller's selected player, used for first-person
    /// questions. `history` is the caller's recent turns, newest last; a bare
    /// follow-up ("what about last season?") borrows its subject from them.
    pub fn answer_question(
        &self,
        question: &str,
        user_context: Option<&str>,
        history: &[HistoryTurn],
    ) -> DugoutResult<Answer> {
        let key = cache_key(question, user_context);
        if let Some(mut hit) = self.cache.get(&key) {
            tracing::debug!(%question, "cache hit");
            if let Some(debug) = hit.debug.as_mut() {
                debug.cache_hit = true;
            }
            return Ok(hit);
        }

        let lower = question.to_lowercase();
        let extraction = self.extractor.extract(question);
        let mut analysis = self.analyzer.analyze(question, &extraction, user_context);
        self.merge_history(&mut analysis, history);

        if analysis.requires_clarification {
            let text = analysis
                .clarification_message
                .clone()
                .unwrap_or_else(|| "Could you rephrase that?".to_string());
            let mut answer = Answer::plain(text);
            answer.debug = Some(self.debug_trail(question, &analysis, "clarification", ""));
            return Ok(answer);
        }

        if let Some(answer) = self.resolve_entities(question, &mut analysis) {
            return Ok(answer);
        }

        let current_season = match self.client.current_season() {
            Ok(season) => Some(season),
            Err(e) => {
                tracing::warn!(error = %e, "current season unavailable");
                None
            }
        };
        let ctx = BuildContext {
            analysis: &analysis,
            question: &lower,
            current_season,
        };
        // A question can pass classification yet give the builders nothing to
        // bind (no subject, no stat). That is an ambiguity, not a fault, so it
        // surfaces as a clarification answer rather than an escaped error.
        let plan = match self.router.build(&ctx) {
            Ok(plan) => plan,
            Err(QueryError::NoRoute { .. }) => {
                tracing::debug!(
                    question_type = %analysis.question_type,
                    "no buildable route, asking for clarification"
                );
                let text = if analysis.entities.is_empty() && analysis.team_entities.is_empty() {
                    MSG_MISSING_ENTITY
                } else {
                    MSG_MISSING_STAT
                };
                let mut answer = Answer::plain(text);
                answer.suggestions = failure_suggestions(&analysis);
                answer.debug = Some(self.debug_trail(question, &analysis, "clarification", ""));
                return Ok(answer);
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!(
            question_type = %analysis.question_type,
            route = plan.route,
            "executing plan"
        );

        let answer = match self.client.run(&plan.text, &plan.params) {
            Ok(rows) => {
                let mut answer = format_answer(&analysis, &lower, plan.route, &rows);
                answer.suggestions = suggestions_for(&analysis);
                answer.debug = Some(self.debug_trail(
                    question,
                    &analysis,
                    plan.route,
                    &plan.display_text(),
                ));
                self.cache.insert(key, answer.clone());
                answer
            }
            Err(e) => {
                tracing::warn!(error = %e, route = plan.route, "query execution failed");
                let mut answer = Answer::plain(
                    "Sorry, something went wrong answering that. Please try again.",
                );
                answer.suggestions = failure_suggestions(&analysis);
                answer.debug = Some(self.debug_trail(
                    question,
                    &analysis,
                    plan.route,
                    &plan.display_text(),
                ));
                if let Some(debug) = answer.debug.as_mut() {
                    debug.rendered_query = format!("{} -- failed: {e}", debug.rendered_query);
                }
                answer
            }
        };
        Ok(answer)
    }

    /// Build the plan for a question without executing it.
    pub fn plan_question(
        &self,
        question: &str,
        user_context: Option<&str>,
    ) -> DugoutResult<PlanReport> {
        let lower = question.to_lowercase();
        let extraction = self.extractor.extract(question);
        let mut analysis = self.analyzer.analyze(question, &extraction, user_context);

        if analysis.requires_clarification {
            return Ok(PlanReport {
                analysis,
                plan: None,
            });
        }
        if self.resolve_entities(question, &mut analysis).is_some() {
            return Ok(PlanReport {
                analysis,
                plan: None,
            });
        }

        let current_season = self.client.current_season().ok();
        let ctx = BuildContext {
            analysis: &analysis,
            question: &lower,
            current_season,
        };
        let plan = self.router.build(&ctx)?;
        Ok(PlanReport {
            analysis,
            plan: Some(plan),
        })
    }

    /// Number of entries currently cached.
    pub fn cached_answers(&self) -> usize {
        self.cache.len()
    }

    /// A bare follow-up keeps its filters (time frames, locations) but has no
    /// subject of its own; borrow entities and metrics from the most recent
    /// turn that had them, within the configured window.
    fn merge_history(&self, analysis: &mut QuestionAnalysis, history: &[HistoryTurn]) {
        let subjectless = analysis.entities.is_empty() && analysis.team_entities.is_empty();
        if !subjectless && !analysis.metrics.is_empty() {
            return;
        }

        let window = history.iter().rev().take(self.config.max_history_turns);
        for turn in window {
            if subjectless && analysis.entities.is_empty() && !turn.entities.is_empty() {
                analysis.entities = turn.entities.clone();
                tracing::debug!(from = %turn.question, "borrowed entities from history");
            }
            if analysis.metrics.is_empty() && !turn.metrics.is_empty() {
                analysis.metrics = turn.metrics.clone();
            }
            if !analysis.entities.is_empty() && !analysis.metrics.is_empty() {
                break;
            }
        }

        // Reclassify once the borrowed subject makes the question answerable.
        if analysis.requires_clarification
            && !analysis.metrics.is_empty()
            && (!analysis.entities.is_empty() || !analysis.team_entities.is_empty())
        {
            analysis.requires_clarification = false;
            analysis.clarification_message = None;
            if matches!(
                analysis.question_type,
                QuestionType::ClarificationNeeded | QuestionType::General
            ) {
                analysis.question_type = if analysis.entities.is_empty() {
                    QuestionType::Team
                } else {
                    QuestionType::Player
                };
            }
        }
    }

    /// Resolve extracted names against the graph's known values. Returns a
    /// not-found answer when a name resolves to nothing.
    fn resolve_entities(&self, question: &str, analysis: &mut QuestionAnalysis) -> Option<Answer> {
        let missing = match self.resolve_list(&mut analysis.entities) {
            Err(name) => Some(name),
            Ok(()) => self.resolve_list(&mut analysis.opposition_entities).err(),
        };
        let name = missing?;
        tracing::info!(entity = %name, "entity not recognised");
        let mut answer = Answer::plain(format!(
            "I don't recognise \"{name}\". Check the spelling or try a different name."
        ));
        answer.suggestions = failure_suggestions(analysis);
        answer.debug = Some(self.debug_trail(question, analysis, "unresolved-entity", ""));
        Some(answer)
    }

    /// Canonicalize each name in place; the first unresolvable one is the
    /// error value.
    fn resolve_list(&self, names: &mut [String]) -> Result<(), String> {
        for name in names.iter_mut() {
            match self.resolver.resolve(name, ResolveCategory::Entity) {
                Some(canonical) => {
                    if canonical != *name {
                        tracing::debug!(from = %name, to = %canonical, "entity resolved");
                    }
                    *name = canonical;
                }
                None => return Err(name.clone()),
            }
        }
        Ok(())
    }

    fn debug_trail(
        &self,
        question: &str,
        analysis: &QuestionAnalysis,
        route: &str,
        rendered_query: &str,
    ) -> AnswerDebug {
        AnswerDebug {
            question: question.to_string(),
            question_type: analysis.question_type.to_string(),
            route: route.to_string(),
            rendered_query: rendered_query.to_string(),
            cache_hit: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{StubClient, ValueCategory, value_row};

    fn stub() -> StubClient {
        StubClient::new("2023/24")
            .with_known_values(ValueCategory::Players, ["Luke Bangs", "Sam Hartley"])
            .with_known_values(ValueCategory::Teams, ["1s", "2s", "3s"])
            .with_known_values(ValueCategory::Oppositions, ["Ashford Town"])
    }

    fn engine(client: StubClient) -> Engine {
        Engine::new(Arc::new(client), EngineConfig::default()).unwrap()
    }

    #[test]
    fn rejects_zero_cache_capacity() {
        let config = EngineConfig {
            cache_capacity: 0,
            ..Default::default()
        };
        assert!(Engine::new(Arc::new(stub()), config).is_err());
    }

    #[test]
    fn clarifies_without_running_a_query() {
        let client = stub();
        let engine = engine(client);
        let answer = engine.answer_question("goals", None, &[]).unwrap();
        assert!(answer.text.contains("Which player or team"));
        assert_eq!(answer.debug.unwrap().route, "clarification");
    }

    #[test]
    fn unknown_name_returns_not_found_without_query() {
        let client = stub();
        let engine = engine(client);
        let answer = engine
            .answer_question("How many goals has Zzyzx Quux scored?", None, &[])
            .unwrap();
        assert!(answer.text.contains("don't recognise"));
    }

    #[test]
    fn misspelled_name_is_fuzzily_resolved() {
        let client = stub().with_response("p.totalGoals", vec![value_row("value", 42)]);
        let engine = engine(client);
        let answer = engine
            .answer_question("How many goals has Luke Bnags scored?", None, &[])
            .unwrap();
        assert_eq!(answer.text, "Luke Bangs has 42 goals.");
    }

    #[test]
    fn second_ask_is_served_from_cache() {
        let client = stub().with_response("p.totalGoals", vec![value_row("value", 42)]);
        let engine = engine(client);
        let question = "How many goals has Luke Bangs scored?";
        let first = engine.answer_question(question, None, &[]).unwrap();
        assert!(!first.debug.unwrap().cache_hit);
        let second = engine.answer_question(question, None, &[]).unwrap();
        assert!(second.debug.unwrap().cache_hit);
        assert_eq!(engine.cached_answers(), 1);
    }

    #[test]
    fn failed_query_is_reported_and_not_cached() {
        let client = stub().failing("connection reset");
        let engine = engine(client);
        let answer = engine
            .answer_question("How many goals has Luke Bangs scored?", None, &[])
            .unwrap();
        assert!(answer.text.contains("went wrong"));
        assert!(
            !answer.suggestions.is_empty(),
            "failure answers carry follow-up suggestions"
        );
        assert!(answer.debug.unwrap().rendered_query.contains("connection reset"));
        assert_eq!(engine.cached_answers(), 0);
    }

    #[test]
    fn subjectless_temporal_question_clarifies() {
        let engine = engine(stub());
        let answer = engine
            .answer_question("How many goals since 2020?", None, &[])
            .unwrap();
        assert!(answer.text.contains("Which player or team"));
        assert_eq!(answer.debug.unwrap().route, "clarification");
    }

    #[test]
    fn bare_superlative_clarifies_instead_of_erroring() {
        let engine = engine(stub());
        let answer = engine
            .answer_question("What was the best?", None, &[])
            .unwrap();
        assert!(answer.text.contains("Which player or team"));
        assert!(!answer.suggestions.is_empty());
        assert_eq!(answer.debug.unwrap().route, "clarification");
        assert_eq!(engine.cached_answers(), 0);
    }

    #[test]
    fn bare_follow_up_borrows_subject_from_history() {
        let client = stub().with_response("MatchDetail", vec![value_row("value", 9)]);
        let engine = engine(client);
        let history = vec![HistoryTurn {
            question: "How many goals has Luke Bangs scored?".to_string(),
            entities: vec!["Luke Bangs".to_string()],
            metrics: vec!["Goals".to_string()],
            asked_at: Utc::now(),
        }];
        let answer = engine
            .answer_question("what about in 2017/18?", None, &history)
            .unwrap();
        assert_eq!(answer.text, "Luke Bangs has 9 goals.");
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dugout.toml");
        std::fs::write(&path, "cache_capacity = 10\ncache_ttl_secs = 60\n").unwrap();
        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.cache_capacity, 10);
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.similarity_threshold, 0.7);
    }

    #[test]
    fn malformed_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dugout.toml");
        std::fs::write(&path, "cache_capacity = \"lots\"").unwrap();
        assert!(EngineConfig::from_file(&path).is_err());
    }
}
