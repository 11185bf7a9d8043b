//! Rich diagnostic error types for the dugout engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so operators know exactly
//! what went wrong and how to fix it.
//!
//! Two failure modes are deliberately NOT errors: an ambiguous extraction
//! surfaces as a clarification answer, and a fuzzy-resolution miss is `None`.
//! Only genuine faults (graph I/O, malformed configuration, an unbuildable
//! query) travel through these types.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the dugout engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, source chains) through to the caller.
#[derive(Debug, Error, Diagnostic)]
pub enum DugoutError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),
}

// ---------------------------------------------------------------------------
// Graph-store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("graph query failed: {message}")]
    #[diagnostic(
        code(dugout::graph::run_failed),
        help(
            "The graph database rejected or failed the query. Check that the \
             database is reachable and that the seeded schema matches the \
             engine's expectations (Player, Fixture, MatchDetail nodes)."
        )
    )]
    RunFailed { message: String },

    #[error("graph query timed out after {timeout_ms}ms")]
    #[diagnostic(
        code(dugout::graph::timeout),
        help(
            "The query exceeded its time budget. The engine treats this as a \
             query-execution failure; retry policy belongs to the graph client, \
             not the translation engine."
        )
    )]
    Timeout { timeout_ms: u64 },

    #[error("known-value listing failed for category '{category}': {message}")]
    #[diagnostic(
        code(dugout::graph::known_values),
        help(
            "The fuzzy resolver could not refresh its index of known players/\
             teams/oppositions/leagues. Resolution falls back to the static \
             pseudonym vocabulary until the index is reachable again."
        )
    )]
    KnownValues { category: String, message: String },
}

// ---------------------------------------------------------------------------
// Query-construction errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum QueryError {
    #[error("no query route matched question type '{question_type}'")]
    #[diagnostic(
        code(dugout::query::no_route),
        help(
            "Every builder's routing table was consulted and none produced a \
             plan. This indicates a classifier/builder mismatch; the analyzer \
             assigned a type no builder claims."
        )
    )]
    NoRoute { question_type: String },

    #[error("unknown metric key '{metric}'")]
    #[diagnostic(
        code(dugout::query::unknown_metric),
        help(
            "The metric is not in the resolution table. Canonical stat keys are \
             listed by `dugout vocab stats`."
        )
    )]
    UnknownMetric { metric: String },

    #[error("parameter '{name}' bound twice in one plan")]
    #[diagnostic(
        code(dugout::query::duplicate_param),
        help(
            "A WHERE fragment tried to rebind an existing parameter name. \
             Fragment authors must use `QueryPlan::fresh_param` for generated \
             names."
        )
    )]
    DuplicateParam { name: String },
}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("invalid configuration: {message}")]
    #[diagnostic(
        code(dugout::engine::invalid_config),
        help("Check the EngineConfig fields. {message}")
    )]
    InvalidConfig { message: String },

    #[error("failed to read config file {path}: {message}")]
    #[diagnostic(
        code(dugout::engine::config_file),
        help(
            "The TOML config file could not be read or parsed. Verify the path \
             and compare against the documented EngineConfig field names."
        )
    )]
    ConfigFile { path: String, message: String },
}

/// Convenience alias for functions returning dugout results.
pub type DugoutResult<T> = std::result::Result<T, DugoutError>;
