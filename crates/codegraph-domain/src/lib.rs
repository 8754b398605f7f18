//! # Domain Layer
//!
//! Core business logic and domain types for the hybrid code-graph indexer.
//! Contains only pure domain entities, value objects, and port traits.
//!
//! ## Architecture
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`entities`] | Core business entities (files, code entities, chunks, documents) |
//! | [`value_objects`] | Immutable value objects (qualified names, languages) |
//! | [`ports`] | External provider port interfaces (graph/vector/relational stores, LLM) |
//! | [`registry`] | `linkme`-based provider auto-registration, one distributed slice per port |
//! | [`constants`] | Domain constants |
//! | [`error`] | Domain error taxonomy |
//!
//! Entities and value objects here have **no** external dependency beyond
//! `serde`/`chrono`/`uuid` — infrastructure and application concerns live in
//! the crates that depend on this one.

#[macro_use]
pub mod macros;

pub mod constants;
pub mod entities;
pub mod error;
pub mod ports;
pub mod registry;
pub mod value_objects;

pub use error::{Error, Result};
