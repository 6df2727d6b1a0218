//! Agent Runtime - intent classification and handler dispatch
//!
//! This crate turns one inbound chat message into one reply:
//! - **Service Client** (`client`) - outbound JSON calls with a per-call timeout
//! - **Classification** (`classifier`) - message text to intent label + entities
//! - **Handlers** (`handlers`, `registry`) - one handler per intent label, plus a fallback
//! - **Formatting** (`formatter`, `templates`) - user-facing text, never error details
//!
//! # Architecture
//!
//! ```text
//! message → AgentRuntime → IntentClassifier → HandlerRegistry::resolve
//!                                                  ↓
//!                reply ← ResponseFormatter ← Handler::execute
//! ```
//!
//! Classification always precedes the handler's own outbound call, and a
//! failed classification never reaches a handler.

pub mod classifier;
pub mod client;
pub mod formatter;
pub mod handlers;
pub mod registry;
pub mod runtime;
pub mod scripted;
pub mod templates;
