//! Fuzzy resolution of tokens against the known-entity index and the static
//! pseudonym vocabulary.
//!
//! Resolution is tiered, cheapest first:
//!
//! 1. Exact (case-insensitive) lookup in the live known-entities index
//!    (players, teams, oppositions, leagues from the graph client)
//! 2. Exact pseudonym variant lookup
//! 3. Edit-distance similarity against both, best match above the threshold
//!
//! A miss is `Option::None`, never an error: callers render "not found", they
//! do not crash the request. Similarity is normalized edit distance with
//! adjacent transpositions counted as one edit, so "goasl" is one edit from
//! "goals".

use std::sync::Arc;

use dashmap::DashMap;

use crate::graph::{GraphClient, ValueCategory};
use crate::vocab::vocabulary;

/// Default similarity threshold. Tuned by product feel, not derivation;
/// overridable through `EngineConfig`.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;

/// What kind of token is being repaired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveCategory {
    Entity,
    StatType,
}

/// Edit distance with substitutions, insertions, deletions, and adjacent
/// transpositions all costing one (optimal string alignment).
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (n, m) = (a.len(), b.len());
    if n == 0 {
        return m;
    }
    if m == 0 {
        return n;
    }

    let mut d = vec![vec![0usize; m + 1]; n + 1];
    for (i, row) in d.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=m {
        d[0][j] = j;
    }

    for i in 1..=n {
        for j in 1..=m {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            d[i][j] = (d[i - 1][j] + 1)
                .min(d[i][j - 1] + 1)
                .min(d[i - 1][j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                d[i][j] = d[i][j].min(d[i - 2][j - 2] + 1);
            }
        }
    }

    d[n][m]
}

/// Normalized similarity: `(max_len - distance) / max_len`, in `[0, 1]`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    (max_len - edit_distance(a, b).min(max_len)) as f64 / max_len as f64
}

/// Fuzzy resolver over the static vocabulary plus a refreshable index of
/// known entity names.
pub struct FuzzyResolver {
    client: Arc<dyn GraphClient>,
    index: DashMap<ValueCategory, Vec<String>>,
    threshold: f64,
}

impl FuzzyResolver {
    pub fn new(client: Arc<dyn GraphClient>, threshold: f64) -> Self {
        Self {
            client,
            index: DashMap::new(),
            threshold,
        }
    }

    /// Refresh the known-entities index from the graph client.
    ///
    /// A category that fails to list keeps its previous contents; resolution
    /// degrades to the static vocabulary rather than erroring.
    pub fn refresh(&self) {
        for category in ValueCategory::ALL {
            match self.client.list_known_values(category) {
                Ok(values) => {
                    tracing::debug!(category = %category, count = values.len(), "index refreshed");
                    self.index.insert(category, values);
                }
                Err(e) => {
                    tracing::warn!(category = %category, error = %e, "index refresh failed");
                }
            }
        }
    }

    /// Number of indexed names across all categories.
    pub fn indexed_count(&self) -> usize {
        self.index.iter().map(|e| e.value().len()).sum()
    }

    /// Resolve a token to a canonical value, or `None` on a miss.
    pub fn resolve(&self, token: &str, category: ResolveCategory) -> Option<String> {
        match category {
            ResolveCategory::StatType => self.resolve_stat(token),
            ResolveCategory::Entity => self.resolve_entity(token),
        }
    }

    /// Resolve against one specific known-value category (players only,
    /// oppositions only, ...). Used by builders that already know which side
    /// of the query a name belongs to.
    pub fn resolve_in(&self, token: &str, category: ValueCategory) -> Option<String> {
        let values = self.index.get(&category)?;

        if let Some(exact) = values
            .iter()
            .find(|v| v.eq_ignore_ascii_case(token))
        {
            return Some(exact.clone());
        }

        let lower = token.to_lowercase();
        best_above(
            self.threshold,
            values
                .iter()
                .map(|v| (similarity(&lower, &v.to_lowercase()), v.clone())),
        )
    }

    fn resolve_stat(&self, token: &str) -> Option<String> {
        let stats = &vocabulary().stats;
        if let Some(canonical) = stats.canonical_for(token) {
            return Some(canonical.to_string());
        }

        let lower = token.to_lowercase();
        best_above(
            self.threshold,
            stats
                .variant_pairs()
                .map(|(variant, canonical)| (similarity(&lower, variant), canonical.to_string())),
        )
    }

    fn resolve_entity(&self, token: &str) -> Option<String> {
        // Tier 1: exact hit in any known-value category.
        for category in ValueCategory::ALL {
            if let Some(values) = self.index.get(&category) {
                if let Some(exact) = values.iter().find(|v| v.eq_ignore_ascii_case(token)) {
                    return Some(exact.clone());
                }
            }
        }

        // Tier 2: exact team pseudonym.
        if let Some(canonical) = vocabulary().teams.canonical_for(token) {
            return Some(canonical.to_string());
        }

        // Tier 3: fuzzy over everything known.
        let lower = token.to_lowercase();
        let mut candidates: Vec<(f64, String)> = Vec::new();
        for category in ValueCategory::ALL {
            if let Some(values) = self.index.get(&category) {
                for v in values.iter() {
                    candidates.push((similarity(&lower, &v.to_lowercase()), v.clone()));
                }
            }
        }
        for (variant, canonical) in vocabulary().teams.variant_pairs() {
            candidates.push((similarity(&lower, variant), canonical.to_string()));
        }
        best_above(self.threshold, candidates.into_iter())
    }
}

impl std::fmt::Debug for FuzzyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FuzzyResolver")
            .field("threshold", &self.threshold)
            .field("indexed", &self.indexed_count())
            .finish()
    }
}

/// Best-scoring candidate strictly above the threshold.
fn best_above(threshold: f64, candidates: impl Iterator<Item = (f64, String)>) -> Option<String> {
    candidates
        .filter(|(score, _)| *score > threshold)
        .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(_, value)| value)
}
