//! Static pseudonym vocabulary: canonical concept keys and their phrasings.
//!
//! One table per concept class (team entities, stat types, stat indicators,
//! question words, negations, locations, time frames, competitions, results).
//! Tables are compiled once at first use behind a `LazyLock` and are immutable
//! for the process lifetime.
//!
//! Matching is case-insensitive and whole-word, with variants ordered
//! longest-first inside a single alternation so that "open play goals" wins
//! over "goals" at the same position, and a consumed span is never re-matched
//! by a shorter variant it contains.

mod tables;

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub use tables::{PROPER_NOUN_STOP_WORDS, TableEntry};

/// A single pseudonym match inside a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VocabHit {
    /// Canonical concept key (e.g., `"Goals"`).
    pub canonical: &'static str,
    /// The exact substring that matched.
    pub text: String,
    /// Byte offset of the match in the question.
    pub position: usize,
}

/// A compiled pseudonym table for one concept class.
pub struct PseudonymTable {
    name: &'static str,
    entries: &'static [TableEntry],
    pattern: Regex,
    /// Lowercased variant → canonical key.
    canon_of: HashMap<String, &'static str>,
}

impl PseudonymTable {
    /// Compile a table from its static entries.
    ///
    /// All variants across all entries go into one alternation sorted by
    /// descending length; regex alternation tries alternatives in order, which
    /// gives the longest-match-first invariant for same-position overlaps.
    fn compile(name: &'static str, entries: &'static [TableEntry]) -> Self {
        let mut variants: Vec<&'static str> = entries
            .iter()
            .flat_map(|e| e.variants.iter().copied())
            .collect();
        variants.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        variants.dedup();

        let alternation = variants
            .iter()
            .map(|v| regex::escape(v))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"(?i)\b(?:{alternation})\b"))
            .unwrap_or_else(|e| panic!("invalid pseudonym table '{name}': {e}"));

        let mut canon_of = HashMap::new();
        for entry in entries {
            for variant in entry.variants {
                canon_of.insert(variant.to_lowercase(), entry.canonical);
            }
        }

        Self {
            name,
            entries,
            pattern,
            canon_of,
        }
    }

    /// Table name for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// All matches of this table's variants in `text`, in question order.
    ///
    /// `find_iter` never yields overlapping matches, so a phrase consumed by a
    /// long variant cannot also produce hits for its shorter sub-phrases.
    pub fn find(&self, text: &str) -> Vec<VocabHit> {
        self.pattern
            .find_iter(text)
            .filter_map(|m| {
                let canonical = *self.canon_of.get(&m.as_str().to_lowercase())?;
                Some(VocabHit {
                    canonical,
                    text: m.as_str().to_string(),
                    position: m.start(),
                })
            })
            .collect()
    }

    /// Exact (case-insensitive) variant lookup.
    pub fn canonical_for(&self, variant: &str) -> Option<&'static str> {
        self.canon_of.get(&variant.to_lowercase()).copied()
    }

    /// Canonical keys in declaration order.
    pub fn canonical_keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.canonical)
    }

    /// All `(variant, canonical)` pairs, for fuzzy matching.
    pub fn variant_pairs(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.entries
            .iter()
            .flat_map(|e| e.variants.iter().map(|v| (*v, e.canonical)))
    }

    /// Number of canonical entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for PseudonymTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PseudonymTable")
            .field("name", &self.name)
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// The full compiled vocabulary, one table per concept class.
#[derive(Debug)]
pub struct Vocabulary {
    pub stats: PseudonymTable,
    pub indicators: PseudonymTable,
    pub question_words: PseudonymTable,
    pub teams: PseudonymTable,
    pub negations: PseudonymTable,
    pub locations: PseudonymTable,
    pub time_frames: PseudonymTable,
    pub competitions: PseudonymTable,
    pub results: PseudonymTable,
}

impl Vocabulary {
    fn compile() -> Self {
        Self {
            stats: PseudonymTable::compile("stats", tables::STAT_TYPES),
            indicators: PseudonymTable::compile("indicators", tables::STAT_INDICATORS),
            question_words: PseudonymTable::compile("question_words", tables::QUESTION_WORDS),
            teams: PseudonymTable::compile("teams", tables::TEAM_ENTITIES),
            negations: PseudonymTable::compile("negations", tables::NEGATIONS),
            locations: PseudonymTable::compile("locations", tables::LOCATIONS),
            time_frames: PseudonymTable::compile("time_frames", tables::TIME_FRAMES),
            competitions: PseudonymTable::compile("competitions", tables::COMPETITIONS),
            results: PseudonymTable::compile("results", tables::RESULTS),
        }
    }

    /// Tables by name, for CLI listing.
    pub fn table(&self, name: &str) -> Option<&PseudonymTable> {
        match name {
            "stats" => Some(&self.stats),
            "indicators" => Some(&self.indicators),
            "question_words" => Some(&self.question_words),
            "teams" => Some(&self.teams),
            "negations" => Some(&self.negations),
            "locations" => Some(&self.locations),
            "time_frames" => Some(&self.time_frames),
            "competitions" => Some(&self.competitions),
            "results" => Some(&self.results),
            _ => None,
        }
    }

    /// All table names.
    pub fn table_names() -> &'static [&'static str] {
        &[
            "stats",
            "indicators",
            "question_words",
            "teams",
            "negations",
            "locations",
            "time_frames",
            "competitions",
            "results",
        ]
    }
}

static VOCABULARY: LazyLock<Vocabulary> = LazyLock::new(Vocabulary::compile);

/// The process-wide compiled vocabulary.
pub fn vocabulary() -> &'static Vocabulary {
    &VOCABULARY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_table_matches_simple_variant() {
        let hits = vocabulary().stats.find("how many goals has he scored");
        let canonicals: Vec<_> = hits.iter().map(|h| h.canonical).collect();
        assert!(canonicals.contains(&"Goals"));
    }

    #[test]
    fn longest_variant_wins_over_substring() {
        let hits = vocabulary().stats.find("open play goals this season");
        assert_eq!(hits.len(), 1, "'goals' must not match inside the longer phrase");
        assert_eq!(hits[0].canonical, "Open Play Goals");
        assert_eq!(hits[0].position, 0);
    }

    #[test]
    fn matching_is_case_insensitive_and_whole_word() {
        let hits = vocabulary().stats.find("ASSISTS and goalscoring");
        let canonicals: Vec<_> = hits.iter().map(|h| h.canonical).collect();
        assert!(canonicals.contains(&"Assists"));
        // "goalscoring" must not match "goals" mid-word
        assert!(!canonicals.contains(&"Goals"));
    }

    #[test]
    fn team_table_maps_ordinal_phrasings() {
        let table = &vocabulary().teams;
        assert_eq!(table.canonical_for("first team"), Some("1s"));
        assert_eq!(table.canonical_for("2nd team"), Some("2s"));
        assert_eq!(table.canonical_for("the 3s"), None); // article not part of variant
        assert_eq!(table.canonical_for("3s"), Some("3s"));
    }

    #[test]
    fn find_reports_positions() {
        let hits = vocabulary().locations.find("goals at home and away");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].canonical, "Home");
        assert_eq!(hits[0].position, 6);
        assert_eq!(hits[1].canonical, "Away");
    }

    #[test]
    fn every_table_compiles_nonempty() {
        for name in Vocabulary::table_names() {
            let table = vocabulary().table(name).unwrap();
            assert!(!table.is_empty(), "table {name} should have entries");
        }
    }

    #[test]
    fn repeated_find_is_deterministic() {
        let q = "most goals and assists away since 2020";
        let a = vocabulary().stats.find(q);
        let b = vocabulary().stats.find(q);
        assert_eq!(a, b);
    }
}
