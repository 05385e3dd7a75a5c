//! The user's list of sites to block.

use serde::{Deserialize, Serialize};

use crate::domain::normalize;
use crate::error::ValidationError;

/// Ordered, duplicate-free list of normalized domains.
///
/// Whether the list may currently be edited is decided by the owner (see
/// [`crate::session::SessionController`]); the list itself only guarantees
/// normalization and uniqueness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockList {
    domains: Vec<String>,
}

impl BlockList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from raw entries, silently dropping empties and duplicates.
    pub fn from_raw<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            domains: crate::domain::normalize_all(raw),
        }
    }

    /// Add a raw entry. Returns `Ok(false)` if the domain was already listed.
    pub fn add(&mut self, raw: &str) -> Result<bool, ValidationError> {
        let domain = normalize(raw).ok_or_else(|| ValidationError::EmptyDomain(raw.to_string()))?;
        if self.domains.contains(&domain) {
            return Ok(false);
        }
        self.domains.push(domain);
        Ok(true)
    }

    /// Remove the entry at `index`, returning it.
    pub fn remove(&mut self, index: usize) -> Result<String, ValidationError> {
        if index >= self.domains.len() {
            return Err(ValidationError::IndexOutOfBounds {
                index,
                len: self.domains.len(),
            });
        }
        Ok(self.domains.remove(index))
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}
