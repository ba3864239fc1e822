//! Chat session domain module.
//!
//! - `message`: Message types (`MessageRole`, `ChatMessage`)
//! - `model`: Session summaries (`ChatSessionSummary`)

mod message;
mod model;

pub use message::{ChatMessage, MessageRole, SEND_FAILURE_REPLY};
pub use model::{ChatSessionSummary, new_session_id};
