//! `Project`: the lifecycle unit managed by the project manager (§4.15).

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::ProjectId;

/// A named, indexed project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Unique id, derived deterministically from `name`.
    pub id: ProjectId,
    /// Human-chosen project name, unique across the deployment.
    pub name: String,
    /// Absolute root path that was scanned.
    pub root_path: PathBuf,
    /// Timestamp of the most recent completed indexing run.
    pub last_indexed_at: Option<DateTime<Utc>>,
    /// Counts of each entity label, keyed by graph node label
    /// (`"File"`, `"Class"`, `"Function"`, `"Method"`, `"Import"`).
    pub entity_counts: std::collections::BTreeMap<String, usize>,
}

impl Project {
    /// Construct a new, not-yet-indexed project.
    #[must_use]
    pub fn new(name: impl Into<String>, root_path: PathBuf) -> Self {
        let name = name.into();
        Self {
            id: ProjectId::from_name(&name),
            name,
            root_path,
            last_indexed_at: None,
            entity_counts: std::collections::BTreeMap::new(),
        }
    }
}
