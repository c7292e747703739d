use pretty_assertions::assert_eq;

pub(super) use super::reduce;
pub(super) use super::EditorEffect;
pub(super) use crate::actions::EditorAction;
pub(super) use crate::actions::RuntimeAction;
pub(super) use crate::actions::UserAction;
pub(super) use crate::error::EditorError;
pub(super) use crate::error::GenerationFailure;
pub(super) use crate::navigation::CursorDirection;
pub(super) use crate::orchestrator::GenerationJob;
pub(super) use crate::orchestrator::ResizeJob;
pub(super) use crate::presets::PresetId;
pub(super) use crate::request::Dimensions;
pub(super) use crate::request::EditScope;
pub(super) use crate::request::GenerationKind;
pub(super) use crate::request::RequestKind;
pub(super) use crate::request::SizeLabel;
pub(super) use crate::state::BranchId;
pub(super) use crate::state::EditorState;
pub(super) use crate::state::NodeStatus;
pub(super) use crate::state::VariantStatus;

mod compare;
mod navigation;
mod resize;
mod root_protection;

const ORIGINAL_URL: &str = "https://img/original.png";

fn state() -> EditorState {
    let mut state = EditorState::default();
    let effects = user(&mut state, UserAction::Upload {
        image_url: ORIGINAL_URL.to_string(),
        label: "Original".to_string(),
    })
    .expect("upload");
    assert_eq!(
        effects,
        vec![
            EditorEffect::AnalyzeImage {
                image_url: ORIGINAL_URL.to_string()
            },
            EditorEffect::RequestFrame,
        ]
    );
    state
}

fn root() -> BranchId {
    BranchId::root()
}

fn user(state: &mut EditorState, action: UserAction) -> Result<Vec<EditorEffect>, EditorError> {
    reduce(state, EditorAction::User(action))
}

fn run_runtime(state: &mut EditorState, action: RuntimeAction) -> Vec<EditorEffect> {
    reduce(state, EditorAction::Runtime(action)).expect("runtime actions never fail")
}

fn edit(state: &mut EditorState, branch_id: &BranchId, source_index: usize, instruction: &str) -> GenerationJob {
    let effects = user(
        state,
        UserAction::Submit {
            branch_id: branch_id.clone(),
            request: RequestKind::Edit {
                source_index,
                instruction: instruction.to_string(),
            },
            options: None,
        },
    )
    .expect("submit edit");
    match effects.as_slice() {
        [EditorEffect::DispatchGeneration(job), EditorEffect::RequestFrame] => job.clone(),
        other => panic!("expected generation dispatch, got {other:?}"),
    }
}

fn resize(state: &mut EditorState, branch_id: &BranchId, label: &str, dims: Dimensions) -> Vec<EditorEffect> {
    user(
        state,
        UserAction::Submit {
            branch_id: branch_id.clone(),
            request: RequestKind::Resize {
                label: SizeLabel::from(label),
                dims,
            },
            options: None,
        },
    )
    .expect("submit resize")
}

fn succeed(state: &mut EditorState, job: &GenerationJob, image_url: &str) {
    let effects = run_runtime(
        state,
        RuntimeAction::GenerationCompleted {
            branch_id: job.branch_id.clone(),
            node_id: job.node_id,
            image_url: image_url.to_string(),
        },
    );
    assert_eq!(effects, vec![EditorEffect::RequestFrame]);
}

fn fail(state: &mut EditorState, job: &GenerationJob) {
    let effects = run_runtime(
        state,
        RuntimeAction::GenerationFailed {
            branch_id: job.branch_id.clone(),
            node_id: job.node_id,
            failure: GenerationFailure::Rejected {
                status: 500,
                message: "model overloaded".to_string(),
            },
        },
    );
    assert_eq!(effects, vec![EditorEffect::RequestFrame]);
}

/// Root plus `count` completed edits chained off the root.
fn state_with_completed(count: usize) -> EditorState {
    let mut state = state();
    for n in 0..count {
        let job = edit(&mut state, &root(), 0, &format!("edit {n}"));
        succeed(&mut state, &job, &format!("https://img/edit-{n}.png"));
    }
    state
}

fn statuses(state: &EditorState, branch_id: &BranchId) -> Vec<NodeStatus> {
    state
        .branch(branch_id)
        .expect("branch")
        .nodes()
        .iter()
        .map(|node| node.status())
        .collect()
}

fn cursor(state: &EditorState, branch_id: &BranchId) -> usize {
    state.branch(branch_id).expect("branch").cursor()
}

/// `image_url` is set exactly when a node is completed.
fn assert_settlement_invariant(state: &EditorState) {
    let session = state.session().expect("session");
    for branch in session.branches() {
        for node in branch.nodes() {
            assert_eq!(
                node.image_url().is_some(),
                node.status() == NodeStatus::Completed,
                "node {:?} in {} breaks the image/status pairing",
                node.id(),
                branch.id()
            );
            assert_eq!(node.failure().is_some(), node.status() == NodeStatus::Failed);
        }
        assert!(branch.cursor() < branch.len());
        assert_eq!(branch.node(0).map(|root| root.status()), Some(NodeStatus::Completed));
    }
}
