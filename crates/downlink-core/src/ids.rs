//! Strongly-typed identifiers for domain entities.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-issued job identity.
///
/// Opaque to the client: the backend mints it on a start call and the
/// client only ever echoes it back on status polls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Smallest file id the backend accepts.
pub const FILE_ID_MIN: u64 = 10_000;
/// Largest file id the backend accepts.
pub const FILE_ID_MAX: u64 = 100_000_000;

/// Validated file identity.
///
/// `new` is the only construction path; out-of-range values are rejected
/// here, before any request is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(u64);

impl FileId {
    pub fn new(raw: u64) -> Result<Self> {
        if !(FILE_ID_MIN..=FILE_ID_MAX).contains(&raw) {
            return Err(Error::Validation {
                field: "file_id".to_string(),
                reason: format!("{raw} outside [{FILE_ID_MIN}, {FILE_ID_MAX}]"),
            });
        }
        Ok(Self(raw))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for FileId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let raw: u64 = s.parse().map_err(|_| Error::Validation {
            field: "file_id".to_string(),
            reason: format!("{s:?} is not an integer"),
        })?;
        Self::new(raw)
    }
}
