//! Business logic and repository port definitions for Etlas.
//!
//! This crate defines the "ports" (the procedure store and the completion
//! provider) that the infrastructure layer implements, plus the generic
//! entity repository, the completion client, and the message orchestrator
//! built on top of them. It depends only on `etlas-types` -- never on
//! `etlas-infra` or any database/IO crate.

pub mod completion;
pub mod llm;
pub mod prompt;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;
