//! Terminal rendering. The application layer explicitly leaves progress and
//! result rendering to the CLI (see `ProgressEvent`'s doc comment); this is
//! that renderer.

use codegraph_application::{ProgressEvent, Stage};

fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Scanning => "scanning",
        Stage::Parsing => "parsing",
        Stage::GraphBuilding => "building graph",
        Stage::Summarizing => "summarizing",
        Stage::Metadata => "regenerating metadata",
        Stage::Embedding => "embedding",
        Stage::Completed => "completed",
        Stage::Failed => "failed",
    }
}

/// Print one progress event to stderr, so piped stdout stays clean for
/// machine-readable command output (`--json` flags).
pub fn print_progress(event: &ProgressEvent) {
    match event {
        ProgressEvent::StageStarted { stage } => eprintln!("==> {}", stage_label(*stage)),
        ProgressEvent::StageProgress { stage, done, total } => {
            if *total > 0 {
                eprintln!("    {} {done}/{total}", stage_label(*stage));
            }
        }
        ProgressEvent::StageCompleted { stage } => eprintln!("==> {} done", stage_label(*stage)),
        ProgressEvent::StageFailed { stage, message } => eprintln!("==> {} failed: {message}", stage_label(*stage)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_stage_has_a_label() {
        for stage in [Stage::Scanning, Stage::Parsing, Stage::GraphBuilding, Stage::Summarizing, Stage::Metadata, Stage::Embedding, Stage::Completed, Stage::Failed] {
            assert!(!stage_label(stage).is_empty());
        }
    }
}
