//! Shared domain types for Etlas.
//!
//! This crate contains the domain types used across the Etlas workspace:
//! users, schemes, chats, messages and their content model, attachments,
//! completion-service turns, configuration, and the associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod attachment;
pub mod chat;
pub mod config;
pub mod entity;
pub mod error;
pub mod llm;
pub mod message;
pub mod scheme;
pub mod user;
