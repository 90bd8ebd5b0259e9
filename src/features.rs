//! Per-user feature sets.
//!
//! A feature token is either a plain name (`"login"`), which adds the feature,
//! or a name prefixed with [`EXCLUSION_MARKER`] (`"!login"`), which removes it.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::{GraphError, Result};

/// Prefix that turns a feature token into a removal.
pub const EXCLUSION_MARKER: char = '!';

/// Set of feature names carried by a single user.
///
/// Iteration is in sorted order so that serialized graphs are stable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeatureSet {
    inner: BTreeSet<String>,
}

impl FeatureSet {
    /// Creates an empty feature set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `feature`. Adding a feature twice is a no-op.
    pub fn add(&mut self, feature: &str) {
        if !self.inner.contains(feature) {
            self.inner.insert(feature.to_string());
        }
    }

    /// Removes `feature`. Removing an absent feature is a no-op.
    pub fn discard(&mut self, feature: &str) {
        self.inner.remove(feature);
    }

    /// Applies a raw token: `!name` discards `name`, anything else is added.
    ///
    /// Tokens are validated by [`FeatureUpdate::parse`].
    pub fn update(&mut self, token: &str) -> Result<()> {
        self.apply(&FeatureUpdate::parse(token)?);
        Ok(())
    }

    /// Applies an already parsed update.
    pub fn apply(&mut self, update: &FeatureUpdate) {
        match update {
            FeatureUpdate::Add(name) => self.add(name),
            FeatureUpdate::Discard(name) => self.discard(name),
        }
    }

    /// Returns whether `feature` is present.
    pub fn contains(&self, feature: &str) -> bool {
        self.inner.contains(feature)
    }

    /// Number of features in the set.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates feature names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.inner.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// A parsed feature token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeatureUpdate {
    /// Add the named feature.
    Add(String),
    /// Remove the named feature.
    Discard(String),
}

impl FeatureUpdate {
    /// Parses a token, rejecting tokens whose feature name is empty.
    pub fn parse(token: &str) -> Result<Self> {
        let update = match token.strip_prefix(EXCLUSION_MARKER) {
            Some(name) => FeatureUpdate::Discard(name.to_string()),
            None => FeatureUpdate::Add(token.to_string()),
        };
        if update.name().trim().is_empty() {
            return Err(GraphError::invalid(format!(
                "feature token '{token}' has an empty name"
            )));
        }
        Ok(update)
    }

    /// The feature name without any exclusion marker.
    pub fn name(&self) -> &str {
        match self {
            FeatureUpdate::Add(name) | FeatureUpdate::Discard(name) => name,
        }
    }

    /// Whether this update removes the feature.
    pub fn is_discard(&self) -> bool {
        matches!(self, FeatureUpdate::Discard(_))
    }
}

impl fmt::Display for FeatureUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureUpdate::Add(name) => write!(f, "{name}"),
            FeatureUpdate::Discard(name) => write!(f, "{EXCLUSION_MARKER}{name}"),
        }
    }
}
