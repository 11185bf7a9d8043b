//! Entity extractor: scans a question against the pseudonym tables plus the
//! structural patterns (proper-noun runs, seasons/dates/ranges, numeric teams).
//!
//! `extract` is a pure function of the question text and the static
//! vocabulary: no I/O, deterministic for identical input. The output is an
//! [`ExtractionResult`] constructed fresh per question and consumed once by
//! the question analyzer.

pub mod proper_noun;
pub mod timeframe;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::vocab::{Vocabulary, VocabHit, vocabulary};

pub use proper_noun::NameCandidate;
pub use timeframe::{TimeFrameKind, TimeFrameSpan, previous_season, season_label};

static RE_FIRST_PERSON: LazyLock<Regex> = LazyLock::new(|| {
    // "I" stays case-sensitive: lowercase "i" mid-sentence is noise.
    Regex::new(r"\bI\b|(?i)\b(?:my|myself)\b").unwrap()
});

/// Concept class of an extracted span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConceptClass {
    ProperName,
    TeamEntity,
    StatType,
    StatIndicator,
    QuestionWord,
    Negation,
    Location,
    Competition,
    ResultWord,
}

/// One typed span extracted from the question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedSpan {
    /// Canonical key for the matched concept.
    pub value: String,
    pub class: ConceptClass,
    /// The exact substring that matched.
    pub original_text: String,
    /// Byte offset in the question.
    pub position: usize,
}

impl ExtractedSpan {
    fn from_hit(hit: VocabHit, class: ConceptClass) -> Self {
        Self {
            value: hit.canonical.to_string(),
            class,
            original_text: hit.text,
            position: hit.position,
        }
    }
}

/// Everything extracted from one question, grouped by concept class.
///
/// Duplicates (same canonical value, multiple occurrences) are permitted here;
/// the analyzer deduplicates by value where it counts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionResult {
    pub names: Vec<ExtractedSpan>,
    pub team_entities: Vec<ExtractedSpan>,
    pub stat_types: Vec<ExtractedSpan>,
    pub stat_indicators: Vec<ExtractedSpan>,
    pub question_words: Vec<ExtractedSpan>,
    pub negations: Vec<ExtractedSpan>,
    pub locations: Vec<ExtractedSpan>,
    pub competitions: Vec<ExtractedSpan>,
    pub results: Vec<ExtractedSpan>,
    pub time_frames: Vec<TimeFrameSpan>,
    /// Goals + assists asked for together (or the combined phrase itself).
    pub goal_involvements: bool,
    /// First-person self-reference ("I", "my") — resolved to the caller's
    /// context player by the analyzer, never treated as a name here.
    pub first_person: bool,
}

impl ExtractionResult {
    /// Distinct entity values: proper names plus team entities, in question
    /// order.
    pub fn entity_values(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for span in self.names.iter().chain(self.team_entities.iter()) {
            if !seen.iter().any(|s: &String| s.eq_ignore_ascii_case(&span.value)) {
                seen.push(span.value.clone());
            }
        }
        seen
    }

    /// Distinct canonical stat keys, in question order.
    pub fn metric_values(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for span in &self.stat_types {
            if !seen.contains(&span.value) {
                seen.push(span.value.clone());
            }
        }
        seen
    }

    pub fn entity_count(&self) -> usize {
        self.entity_values().len()
    }

    pub fn stat_count(&self) -> usize {
        self.metric_values().len()
    }

    /// Whether nothing useful was extracted (used for follow-up merging).
    pub fn is_bare(&self) -> bool {
        self.entity_count() == 0 && self.stat_count() == 0
    }
}

/// The entity extractor. Stateless apart from the static vocabulary.
#[derive(Debug, Clone, Copy)]
pub struct Extractor {
    vocab: &'static Vocabulary,
}

impl Extractor {
    pub fn new() -> Self {
        Self {
            vocab: vocabulary(),
        }
    }

    /// Extract all typed spans from the question.
    pub fn extract(&self, question: &str) -> ExtractionResult {
        let spans = |hits: Vec<VocabHit>, class: ConceptClass| -> Vec<ExtractedSpan> {
            hits.into_iter()
                .map(|h| ExtractedSpan::from_hit(h, class))
                .collect()
        };

        let stat_types = spans(self.vocab.stats.find(question), ConceptClass::StatType);
        let team_entities = spans(self.vocab.teams.find(question), ConceptClass::TeamEntity);
        let locations = spans(self.vocab.locations.find(question), ConceptClass::Location);
        let competitions = spans(self.vocab.competitions.find(question), ConceptClass::Competition);
        let results = spans(self.vocab.results.find(question), ConceptClass::ResultWord);

        let mut time_frames = timeframe::detect_time_frames(question);
        for hit in self.vocab.time_frames.find(question) {
            let kind = match hit.canonical {
                "Last Season" => TimeFrameKind::LastSeason,
                "This Season" => TimeFrameKind::ThisSeason,
                _ => TimeFrameKind::AllTime,
            };
            time_frames.push(TimeFrameSpan {
                kind,
                original_text: hit.text,
                position: hit.position,
            });
        }
        time_frames.sort_by_key(|f| f.position);

        // A proper-noun candidate that overlaps a vocabulary hit is that
        // concept, not a name ("Man of the Match", "Cup").
        let claimed: Vec<(usize, usize)> = stat_types
            .iter()
            .chain(team_entities.iter())
            .chain(locations.iter())
            .chain(competitions.iter())
            .chain(results.iter())
            .map(|s| (s.position, s.position + s.original_text.len()))
            .chain(
                time_frames
                    .iter()
                    .map(|f| (f.position, f.position + f.original_text.len())),
            )
            .collect();

        let names: Vec<ExtractedSpan> =
            proper_noun::detect_proper_nouns(question, &self.vocab.stats)
                .into_iter()
                .filter(|c| {
                    !claimed
                        .iter()
                        .any(|&(s, e)| c.position < e && s < c.end)
                })
                .map(|c| ExtractedSpan {
                    value: c.text.clone(),
                    class: ConceptClass::ProperName,
                    original_text: c.text,
                    position: c.position,
                })
                .collect();

        let metric_set: Vec<&str> = stat_types.iter().map(|s| s.value.as_str()).collect();
        let goal_involvements = metric_set.contains(&"Goal Involvements")
            || (metric_set.contains(&"Goals") && metric_set.contains(&"Assists"));

        ExtractionResult {
            names,
            team_entities,
            stat_types,
            stat_indicators: spans(
                self.vocab.indicators.find(question),
                ConceptClass::StatIndicator,
            ),
            question_words: spans(
                self.vocab.question_words.find(question),
                ConceptClass::QuestionWord,
            ),
            negations: spans(self.vocab.negations.find(question), ConceptClass::Negation),
            locations,
            competitions,
            results,
            time_frames,
            goal_involvements,
            first_person: RE_FIRST_PERSON.is_match(question),
        }
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}
