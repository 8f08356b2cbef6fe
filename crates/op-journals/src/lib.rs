//! # op-journals
//!
//! Journal/audit logging for OpenProject RS.
//!
//! Journals are the append-only change log of a work package. The history
//! view only shows *changing* journals, ordered by creation time.

pub mod journal;

pub use journal::{changing_history, AttributeChange, Journal, JournalVersion};
