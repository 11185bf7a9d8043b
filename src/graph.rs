//! Graph-database client boundary.
//!
//! The graph store itself is an external collaborator: it accepts
//! parameterized query text plus bound parameters and returns row sets. The
//! engine never interpolates user-derived values into query text; everything
//! untrusted travels through the parameter map.
//!
//! [`StubClient`] is the in-process double used by the CLI's dry-run mode and
//! by the test suite; a real deployment supplies its own `GraphClient` over a
//! Bolt/HTTP driver.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use serde_json::Value;

use crate::error::GraphError;

/// One result row: column name → value.
pub type Row = serde_json::Map<String, Value>;

/// Bound query parameters. Ordered so rendered debug output is stable.
pub type Params = BTreeMap<String, Value>;

/// Categories served by the known-entity index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueCategory {
    Players,
    Teams,
    Oppositions,
    Leagues,
}

impl ValueCategory {
    pub const ALL: [ValueCategory; 4] = [
        ValueCategory::Players,
        ValueCategory::Teams,
        ValueCategory::Oppositions,
        ValueCategory::Leagues,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Players => "players",
            Self::Teams => "teams",
            Self::Oppositions => "oppositions",
            Self::Leagues => "leagues",
        }
    }
}

impl std::fmt::Display for ValueCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client-side view of the graph database.
pub trait GraphClient: Send + Sync {
    /// Execute a parameterized query and return its rows.
    ///
    /// Implementations own the timeout; on expiry they return
    /// [`GraphError::Timeout`], which the engine renders as a query-execution
    /// failure. Retry policy, if any, also lives in the implementation.
    fn run(&self, query: &str, params: &Params) -> Result<Vec<Row>, GraphError>;

    /// List the known values for a category (used by the fuzzy resolver's
    /// index; refresh cadence is owned by the data layer).
    fn list_known_values(&self, category: ValueCategory) -> Result<Vec<String>, GraphError>;

    /// The current season label (`"YYYY/YY"`), used to resolve "last season".
    fn current_season(&self) -> Result<String, GraphError>;
}

// ---------------------------------------------------------------------------
// Stub client
// ---------------------------------------------------------------------------

/// An in-memory `GraphClient` double: canned known values, a fixed current
/// season, and responses selected by query-text substring. Records every
/// executed query for assertions.
pub struct StubClient {
    season: String,
    known: DashMap<ValueCategory, Vec<String>>,
    responses: Vec<(String, Vec<Row>)>,
    fail_message: Option<String>,
    executed: Arc<Mutex<Vec<(String, Params)>>>,
}

/// Clones share the executed-query log, so a test can keep a handle while
/// the engine owns the client.
impl Clone for StubClient {
    fn clone(&self) -> Self {
        Self {
            season: self.season.clone(),
            known: self.known.clone(),
            responses: self.responses.clone(),
            fail_message: self.fail_message.clone(),
            executed: Arc::clone(&self.executed),
        }
    }
}

impl StubClient {
    pub fn new(season: impl Into<String>) -> Self {
        Self {
            season: season.into(),
            known: DashMap::new(),
            responses: Vec::new(),
            fail_message: None,
            executed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Seed a known-values category.
    pub fn with_known_values<I, S>(self, category: ValueCategory, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known
            .insert(category, values.into_iter().map(Into::into).collect());
        self
    }

    /// Respond with `rows` to any query whose text contains `fragment`.
    /// Matchers are tried in insertion order; unmatched queries get no rows.
    pub fn with_response(mut self, fragment: impl Into<String>, rows: Vec<Row>) -> Self {
        self.responses.push((fragment.into(), rows));
        self
    }

    /// Make every `run` call fail with the given message.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_message = Some(message.into());
        self
    }

    /// Queries executed so far, oldest first.
    pub fn executed(&self) -> Vec<(String, Params)> {
        self.executed.lock().expect("stub lock poisoned").clone()
    }
}

impl GraphClient for StubClient {
    fn run(&self, query: &str, params: &Params) -> Result<Vec<Row>, GraphError> {
        self.executed
            .lock()
            .expect("stub lock poisoned")
            .push((query.to_string(), params.clone()));

        if let Some(message) = &self.fail_message {
            return Err(GraphError::RunFailed {
                message: message.clone(),
            });
        }

        Ok(self
            .responses
            .iter()
            .find(|(fragment, _)| query.contains(fragment.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }

    fn list_known_values(&self, category: ValueCategory) -> Result<Vec<String>, GraphError> {
        Ok(self
            .known
            .get(&category)
            .map(|v| v.clone())
            .unwrap_or_default())
    }

    fn current_season(&self) -> Result<String, GraphError> {
        Ok(self.season.clone())
    }
}

/// Build a single-column row, the common shape for aggregate answers.
pub fn value_row(column: &str, value: impl Into<Value>) -> Row {
    let mut row = Row::new();
    row.insert(column.to_string(), value.into());
    row
}
