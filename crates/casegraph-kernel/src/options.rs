//! Options shared by the transforms.

use chrono::{DateTime, Utc};

/// Per-run transform options.
///
/// `now` stamps `exportedAt` and fills comment timestamps the source omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    pub now: DateTime<Utc>,
}

impl TransformOptions {
    pub fn new() -> Self {
        Self { now: Utc::now() }
    }

    /// Options pinned to a fixed clock.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self::new()
    }
}
