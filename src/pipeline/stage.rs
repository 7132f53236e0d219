//! Pipeline stages, failures and outcomes.

use serde::Serialize;

/// Position of a run in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Resolving,
    Downloading,
    Analyzing,
    Normalizing,
    Rendering,
    Distributing,
    Delivering,
    Done,
    Failed,
}

impl Stage {
    /// Text of the progress message while this stage runs. Only the slow
    /// stages have one; the others leave the previous text in place.
    pub fn progress_text(self) -> Option<&'static str> {
        match self {
            Self::Downloading => Some("⏬ Downloading the start of the file…"),
            Self::Analyzing => Some("🔬 Analyzing media structure…"),
            Self::Distributing => Some("📤 Publishing the report…"),
            _ => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Resolving => "resolving",
            Self::Downloading => "downloading",
            Self::Analyzing => "analyzing",
            Self::Normalizing => "normalizing",
            Self::Rendering => "rendering",
            Self::Distributing => "distributing",
            Self::Delivering => "delivering",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// The five user-visible failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidReference,
    SourceUnavailable,
    DownloadFailed,
    AnalysisFailed,
    DeliveryFailed,
}

impl FailureKind {
    /// The only text a user sees for a failed run.
    pub fn user_message(self) -> &'static str {
        match self {
            Self::InvalidReference => {
                "❌ That is not a valid Google Drive link, file ID or direct download URL."
            }
            Self::SourceUnavailable => {
                "❌ The file is inaccessible or empty. Make sure it exists and is shared."
            }
            Self::DownloadFailed => "❌ The file could not be downloaded. Please try again later.",
            Self::AnalysisFailed => {
                "❌ The file could not be analyzed. It may be damaged or in an unsupported format."
            }
            Self::DeliveryFailed => "❌ The report was created but could not be delivered.",
        }
    }
}

/// A terminal failure as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineFailure {
    /// Stage that failed
    pub stage: Stage,
    pub kind: FailureKind,
    /// User-facing message; the underlying error is only logged.
    pub message: String,
}

impl PipelineFailure {
    pub fn new(stage: Stage, kind: FailureKind) -> Self {
        Self {
            stage,
            kind,
            message: kind.user_message().to_string(),
        }
    }
}

/// Which artifact replaced the progress message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryKind {
    Visual,
    Text,
}

/// Result of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineOutcome {
    Delivered {
        kind: DeliveryKind,
        text_report_url: Option<String>,
        /// Every distribution path failed; a warning was shown.
        degraded: bool,
    },
    Failed(PipelineFailure),
}

impl PipelineOutcome {
    /// Terminal stage of the run.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Delivered { .. } => Stage::Done,
            Self::Failed(_) => Stage::Failed,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_distinct() {
        let kinds = [
            FailureKind::InvalidReference,
            FailureKind::SourceUnavailable,
            FailureKind::DownloadFailed,
            FailureKind::AnalysisFailed,
            FailureKind::DeliveryFailed,
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a.user_message(), b.user_message());
            }
        }
    }

    #[test]
    fn test_outcome_stage() {
        let failed = PipelineOutcome::Failed(PipelineFailure::new(
            Stage::Resolving,
            FailureKind::InvalidReference,
        ));
        assert_eq!(failed.stage(), Stage::Failed);
        assert!(!failed.is_delivered());

        let delivered = PipelineOutcome::Delivered {
            kind: DeliveryKind::Text,
            text_report_url: None,
            degraded: true,
        };
        assert_eq!(delivered.stage(), Stage::Done);
    }

    #[test]
    fn test_only_slow_stages_report_progress() {
        assert!(Stage::Downloading.progress_text().is_some());
        assert!(Stage::Analyzing.progress_text().is_some());
        assert!(Stage::Normalizing.progress_text().is_none());
        assert!(Stage::Done.progress_text().is_none());
    }
}
