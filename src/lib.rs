//! Coaching graphs and feature-flag infection.
//!
//! A coaching graph holds users connected by coach→student edges. Features
//! are rolled out by "infecting" users: a whole connected component at a time,
//! an exact number of users, or a number of users within a range.

#![warn(missing_docs)]

pub mod cli;
pub mod error;
pub mod features;
pub mod generator;
pub mod graph;
pub mod infection;
pub mod types;

pub use error::{GraphError, Result};
pub use features::{FeatureSet, FeatureUpdate, EXCLUSION_MARKER};
pub use graph::{CoachingGraph, GraphOptions, UserNode};
pub use infection::{
    InfectionEngine, InfectionOptions, InfectionOutcome, InfectionPolicy, InfectionReport,
};
pub use types::NodeIdx;
