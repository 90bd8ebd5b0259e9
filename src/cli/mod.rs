#![forbid(unsafe_code)]

//! Graph document import and export.
//!
//! This module converts between the JSON graph document format and an
//! in-memory [`crate::CoachingGraph`].

/// Loading, validating and saving graph documents.
///
/// A document lists `users`, a `coaches` mapping from coach id to student ids
/// and, optionally, pre-existing `features` per user.
pub mod import_export;
