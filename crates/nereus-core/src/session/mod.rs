//! Session domain module.
//!
//! Contains the conversation entities, the session store (the single
//! source of truth for the session set and selection), and the response
//! streamer that animates assistant replies.
//!
//! # Module Structure
//!
//! - `model`: Core session entity (`ChatSession`) and summary helpers
//! - `message`: Message types (`Sender`, `Message`, `MessagePatch`)
//! - `store`: Optimistic session cache (`SessionStore`)
//! - `streamer`: Fixed-cadence answer reveal (`ResponseStreamer`)

mod message;
mod model;
mod store;
mod streamer;

#[cfg(test)]
pub(crate) mod testing;

// Re-export public API
pub use message::{Message, MessagePatch, RESERVED_ASSISTANT_ID, Sender};
pub use model::{ChatSession, SUMMARY_LIMIT, summarize};
pub use store::SessionStore;
pub use streamer::{FALLBACK_ANSWER, ResponseStreamer, StreamPhase};
