#![forbid(unsafe_code)]

//! Core domain model and editing engine for recorded pool swims.
//!
//! This crate provides:
//! - Domain types (segments, laps, session, workout snapshot)
//! - Codec boundary for the decoder's message shape
//! - Edit operations with renumbering and lap/session recomputation
//! - Persistence (snapshot store, edit journal, editing session)
//! - Analysis tables and CSV export

pub mod types;
pub mod error;
pub mod codec;
pub mod config;
pub mod logging;
pub mod renumber;
pub mod laps;
pub mod session;
pub mod edit;
pub mod validate;
pub mod store;
pub mod journal;
pub mod history;
pub mod analysis;
pub mod export;

// Re-export commonly used types
pub use error::{Error, ErrorKind, Result};
pub use types::*;
pub use config::Config;
pub use edit::Edit;
pub use session::SessionSummary;
pub use store::{FileStore, MemoryStore, SnapshotKey, SnapshotStore};
pub use journal::{EditJournal, EditSink, JournalAction, JournalEntry};
pub use history::{replay, EditOutcome, EditSession};
pub use analysis::{best_times, format_clock, BestTime, IntervalSummary, StrokeSummary};
