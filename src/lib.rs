//! # dugout
//!
//! A question-answering engine for grassroots football club statistics.
//! Free-text questions are translated into parameterized graph queries:
//! vocabulary and proper-noun extraction, fuzzy entity resolution against the
//! graph's known values, rule-table classification, per-domain query routing,
//! and an LRU + TTL response cache.
//!
//! ## Pipeline
//!
//! - **Vocabulary** (`vocab`): pseudonym tables compiled into longest-match
//!   alternation patterns
//! - **Extraction** (`extract`): concept spans, proper names, time frames
//! - **Analysis** (`analyze`): prioritized classifier rules, complexity,
//!   clarification
//! - **Resolution** (`resolve`): edit-distance matching against the graph
//! - **Planning** (`query`): ordered `(predicate, builder)` routing tables
//!   producing `$param` query plans
//! - **Answers** (`answer`): row formatting, streak computation, charts
//!
//! ## Library usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use dugout::engine::{Engine, EngineConfig};
//! use dugout::graph::StubClient;
//!
//! let client = Arc::new(StubClient::new("2023/24"));
//! let engine = Engine::new(client, EngineConfig::default()).unwrap();
//! let answer = engine
//!     .answer_question("How many goals has Luke Bangs scored?", None, &[])
//!     .unwrap();
//! println!("{}", answer.text);
//! ```

pub mod analyze;
pub mod answer;
pub mod cache;
pub mod engine;
pub mod error;
pub mod extract;
pub mod graph;
pub mod query;
pub mod resolve;
pub mod vocab;
