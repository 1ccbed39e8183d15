//! Infrastructure layer for Etlas.
//!
//! Contains implementations of the ports defined in `etlas-core`: the
//! SQLite-backed procedure store, the OpenAI-compatible completion provider,
//! and settings loading from file and environment.

pub mod config;
pub mod llm;
pub mod sqlite;
