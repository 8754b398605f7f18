//! Strong-typed UUID identifiers for persisted domain entities.

define_id!(ProjectId, "Strong typed identifier for an indexed project");
define_id!(DocumentId, "Strong typed identifier for a documentation file");
define_id!(ChunkId, "Strong typed identifier for a code or document chunk");
define_id!(LinkId, "Strong typed identifier for a document-to-code link");
define_id!(DriftId, "Strong typed identifier for a drift analysis record");
