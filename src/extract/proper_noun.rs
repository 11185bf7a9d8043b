//! Proper-noun candidate detection for player and opposition names.
//!
//! Capitalized word runs are merged into multi-word names ("Luke Bangs" is one
//! candidate, not two), then filtered against the stop-word list, the numeric
//! team pattern ("3s", "4th"), and the stat vocabulary (a capitalized stat word
//! at sentence start is not a name).

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::resolve::similarity;
use crate::vocab::{PROPER_NOUN_STOP_WORDS, PseudonymTable};

static RE_CAP_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][a-z]+(?:['’-][A-Za-z]+)?\b").unwrap()
});

static RE_NUMERIC_TEAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\d{1,2}(?:s|st|nd|rd|th)$").unwrap()
});

/// Lowercase particles allowed inside a merged name ("Luke van Bangs").
const NAME_PARTICLES: &[&str] = &["van", "von", "de", "der", "da", "di", "del", "el", "al", "st"];

/// Similarity above which a candidate is treated as a misspelled stat phrase
/// rather than a name. Matches the resolver's default threshold.
const STAT_COLLISION_THRESHOLD: f64 = 0.7;

/// A candidate player/opposition name with its span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameCandidate {
    pub text: String,
    pub position: usize,
    pub end: usize,
}

/// Detect proper-noun name candidates in the question.
///
/// `stat_table` supplies the phrases used for the fuzzy collision check.
pub fn detect_proper_nouns(question: &str, stat_table: &PseudonymTable) -> Vec<NameCandidate> {
    let raw: Vec<NameCandidate> = RE_CAP_WORD
        .find_iter(question)
        .map(|m| NameCandidate {
            text: m.as_str().to_string(),
            position: m.start(),
            end: m.end(),
        })
        .filter(|c| !is_stop_word(&c.text))
        .collect();

    let merged = merge_adjacent(question, raw);

    merged
        .into_iter()
        .filter(|c| !RE_NUMERIC_TEAM.is_match(&c.text))
        .filter(|c| !collides_with_stat_phrase(&c.text, stat_table))
        .collect()
}

fn is_stop_word(token: &str) -> bool {
    let lower = token.to_lowercase();
    PROPER_NOUN_STOP_WORDS.iter().any(|w| *w == lower)
}

/// Merge candidates whose separator is whitespace, optionally around a single
/// name particle. Merging happens before the stat-collision check so that a
/// full name is compared as one phrase.
fn merge_adjacent(question: &str, candidates: Vec<NameCandidate>) -> Vec<NameCandidate> {
    let mut merged: Vec<NameCandidate> = Vec::new();

    for candidate in candidates {
        if let Some(last) = merged.last_mut() {
            let gap = &question[last.end..candidate.position.max(last.end)];
            if is_mergeable_gap(gap) {
                last.end = candidate.end;
                last.text = question[last.position..last.end].to_string();
                continue;
            }
        }
        merged.push(candidate);
    }

    merged
}

fn is_mergeable_gap(gap: &str) -> bool {
    let trimmed = gap.trim();
    if !gap.chars().all(|c| c.is_whitespace() || c.is_alphabetic()) {
        return false;
    }
    trimmed.is_empty() || NAME_PARTICLES.contains(&trimmed.to_lowercase().as_str())
}

fn collides_with_stat_phrase(candidate: &str, stat_table: &PseudonymTable) -> bool {
    let lower = candidate.to_lowercase();
    stat_table
        .variant_pairs()
        .any(|(variant, _)| similarity(&lower, variant) > STAT_COLLISION_THRESHOLD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::vocabulary;

    fn names(question: &str) -> Vec<String> {
        detect_proper_nouns(question, &vocabulary().stats)
            .into_iter()
            .map(|c| c.text)
            .collect()
    }

    #[test]
    fn two_word_name_merges() {
        assert_eq!(names("How many goals has Luke Bangs scored?"), vec!["Luke Bangs"]);
    }

    #[test]
    fn particle_name_merges() {
        assert_eq!(names("Did Ruud van Nistel assist?"), vec!["Ruud van Nistel"]);
    }

    #[test]
    fn question_words_are_not_names() {
        assert!(names("How many goals were scored at home?").is_empty());
    }

    #[test]
    fn separate_names_stay_separate() {
        let got = names("Compare Luke Bangs against Ashford Town");
        assert_eq!(got, vec!["Luke Bangs", "Ashford Town"]);
    }

    #[test]
    fn misspelled_stat_word_is_not_a_name() {
        // "Goasl" is one transposition from "goals": a typo, not a player.
        assert!(names("How many Goasl this season?").is_empty());
    }

    #[test]
    fn numeric_team_tokens_are_rejected() {
        let candidate = NameCandidate {
            text: "4th".into(),
            position: 0,
            end: 3,
        };
        assert!(RE_NUMERIC_TEAM.is_match(&candidate.text));
        assert!(RE_NUMERIC_TEAM.is_match("3s"));
        assert!(!RE_NUMERIC_TEAM.is_match("Bangs"));
    }

    #[test]
    fn punctuation_blocks_merging() {
        let got = names("Bangs, Luke scored twice");
        assert_eq!(got, vec!["Bangs", "Luke"]);
    }
}
