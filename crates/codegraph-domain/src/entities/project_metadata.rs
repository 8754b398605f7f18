//! `ProjectMetadata`: the persisted result of one project-level summary
//! generation run (`codegraph metadata regenerate`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A free-text project summary produced by a single bounded LLM call over
/// the project's entity/file counts, stored for `metadata show` to read
/// back without regenerating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Project this summary describes.
    pub project_name: String,
    /// The generated summary text.
    pub summary: String,
    /// What triggered generation (`"manual"`, `"post_index"`).
    pub triggered_by: String,
    /// When this summary was generated.
    pub generated_at: DateTime<Utc>,
}
