//! Core types for the shopping advisor
//!
//! This crate provides foundational types used across all other crates:
//! - Chat message and tool-call types for the reasoning-service boundary
//! - Conversation turns and the bounded history window
//! - Intent and language definitions
//! - Error types

pub mod conversation;
pub mod error;
pub mod intent;
pub mod language;
pub mod llm_types;

pub use conversation::{History, Turn, TurnRole};
pub use error::{Error, Result};
pub use intent::Intent;
pub use language::Language;
pub use llm_types::{ChatOutcome, Message, Role, ToolCall, ToolDefinition};
