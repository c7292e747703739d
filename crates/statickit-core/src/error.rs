use serde::Deserialize;
use serde::Serialize;

use super::state::BranchId;

/// Why a generation or resize request did not produce an image.
///
/// Failures are attached to the node or resized variant that owns the
/// request; they never abort other work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationFailure {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("timed out after {after_ms}ms")]
    TimedOut { after_ms: u64 },

    /// The task running the request died before reporting.
    #[error("request aborted: {message}")]
    Aborted { message: String },
}

impl GenerationFailure {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Rejected { .. } => "rejected",
            Self::InvalidResponse { .. } => "invalid-response",
            Self::TimedOut { .. } => "timed-out",
            Self::Aborted { .. } => "aborted",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

/// Which entity a settled failure is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    GenerationFailed,
    ResizeFailed,
}

impl FailureKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::GenerationFailed => "generation-failed",
            Self::ResizeFailed => "resize-failed",
        }
    }
}

/// Synchronous rejection of a user operation. No state was changed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    #[error("no image session is open")]
    NoSession,

    #[error("unknown branch {0}")]
    UnknownBranch(BranchId),

    #[error("node {index} is out of range for branch {branch_id}")]
    NodeOutOfRange { branch_id: BranchId, index: usize },

    #[error("source node {index} in branch {branch_id} is not completed")]
    SourceNotReady { branch_id: BranchId, index: usize },

    #[error("node {index} in branch {branch_id} cannot be deleted")]
    CannotDelete { branch_id: BranchId, index: usize },

    #[error("node {index} in branch {branch_id} is still generating")]
    NodeInFlight { branch_id: BranchId, index: usize },

    #[error("node {index} in branch {branch_id} has not failed")]
    NotFailed { branch_id: BranchId, index: usize },

    #[error("compare needs two completed versions, branch has {completed}")]
    CompareUnavailable { completed: usize },

    #[error("compare target {0} is not a completed version")]
    CompareInvalidTarget(usize),

    #[error("compare target {0} is the locked reference")]
    CompareSameNode(usize),

    #[error("compare mode is not active")]
    CompareInactive,

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl EditorError {
    /// Stable code reported to the UI caller.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoSession => "no-session",
            Self::UnknownBranch(_) => "unknown-branch",
            Self::NodeOutOfRange { .. } => "node-out-of-range",
            Self::SourceNotReady { .. } => "source-not-ready",
            Self::CannotDelete { .. } => "cannot-delete",
            Self::NodeInFlight { .. } => "node-in-flight",
            Self::NotFailed { .. } => "not-failed",
            Self::CompareUnavailable { .. } => "compare-unavailable",
            Self::CompareInvalidTarget(_) => "compare-invalid-target",
            Self::CompareSameNode(_) => "compare-same-node",
            Self::CompareInactive => "compare-inactive",
            Self::InvalidRequest(_) => "invalid-request",
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn codes_match_ui_taxonomy() {
        let branch_id = BranchId::root();
        assert_eq!(
            EditorError::SourceNotReady {
                branch_id: branch_id.clone(),
                index: 1
            }
            .code(),
            "source-not-ready"
        );
        assert_eq!(
            EditorError::CannotDelete {
                branch_id,
                index: 0
            }
            .code(),
            "cannot-delete"
        );
    }

    #[test]
    fn failure_serializes_with_kind_tag() {
        let failure = GenerationFailure::Rejected {
            status: 429,
            message: "quota".to_string(),
        };
        let json = serde_json::to_value(&failure).expect("serialize");
        assert_eq!(json["kind"], "rejected");
        assert_eq!(json["status"], 429);
        assert_eq!(failure.to_string(), "service rejected the request (429): quota");
    }
}
