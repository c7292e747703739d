use super::error::GenerationFailure;
use super::navigation::CursorDirection;
use super::request::GenerationOptions;
use super::request::RequestKind;
use super::request::SizeLabel;
use super::state::BranchId;
use super::state::ImageAnalysis;
use super::state::NodeId;
use super::state::RequestId;

#[derive(Debug, Clone)]
pub enum EditorAction {
    User(UserAction),
    Runtime(RuntimeAction),
}

#[derive(Debug, Clone)]
pub enum UserAction {
    Upload {
        image_url: String,
        label: String,
    },
    CreateBranch {
        source_image_url: String,
        label: String,
    },
    DeleteBranch {
        branch_id: BranchId,
    },
    SelectBranch {
        branch_id: BranchId,
    },
    PromoteNode {
        branch_id: BranchId,
        index: usize,
    },
    Submit {
        branch_id: BranchId,
        request: RequestKind,
        options: Option<GenerationOptions>,
    },
    MoveCursor {
        branch_id: BranchId,
        direction: CursorDirection,
    },
    SelectNode {
        branch_id: BranchId,
        index: usize,
    },
    DeleteNode {
        branch_id: BranchId,
        index: usize,
    },
    DismissFailed {
        branch_id: BranchId,
        index: usize,
    },
    EnterCompare {
        branch_id: BranchId,
    },
    SelectCompareRight {
        index: usize,
    },
    ExitCompare,
    SetVariationCount(usize),
    ResetSession,
}

/// Results reported back by the collaborators, plus the periodic sweep.
#[derive(Debug, Clone)]
pub enum RuntimeAction {
    GenerationCompleted {
        branch_id: BranchId,
        node_id: NodeId,
        image_url: String,
    },
    GenerationFailed {
        branch_id: BranchId,
        node_id: NodeId,
        failure: GenerationFailure,
    },
    ResizeCompleted {
        branch_id: BranchId,
        label: SizeLabel,
        request_id: RequestId,
        image_url: String,
    },
    ResizeFailed {
        branch_id: BranchId,
        label: SizeLabel,
        request_id: RequestId,
        failure: GenerationFailure,
    },
    AnalysisReady {
        image_url: String,
        analysis: ImageAnalysis,
    },
    AnalysisFailed {
        image_url: String,
        message: String,
    },
    ExpireStale {
        now_ms: i64,
    },
}
