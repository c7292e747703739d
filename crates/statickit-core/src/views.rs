use serde::Serialize;

use super::error::FailureKind;
use super::request::SizeLabel;
use super::state::can_delete_root;
use super::state::Branch;
use super::state::BranchId;
use super::state::EditorState;
use super::state::NodeStatus;
use super::state::Session;
use super::state::VariantStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparePair {
    pub left_index: usize,
    pub right_index: usize,
    pub left_image_url: Option<String>,
    pub right_image_url: Option<String>,
}

/// Read-only projection of the engine for a UI host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditorView {
    pub active_branch_id: BranchId,
    pub branch_count: usize,
    pub cursor: usize,
    pub node_count: usize,
    pub current_image_url: Option<String>,
    pub current_status: NodeStatus,
    pub current_prompt: Option<String>,
    pub current_error: Option<FailureKind>,
    pub can_delete_current: bool,
    pub can_delete_root: bool,
    pub in_flight: usize,
    pub download_file_count: usize,
    pub failed_resizes: Vec<SizeLabel>,
    pub compare: Option<ComparePair>,
}

pub fn derive_view(state: &EditorState) -> Option<EditorView> {
    let session = state.session()?;
    let branch = session.active_branch();
    let current = branch.cursor_node();
    Some(EditorView {
        active_branch_id: branch.id().clone(),
        branch_count: session.branches().len(),
        cursor: branch.cursor(),
        node_count: branch.len(),
        current_image_url: current.image_url().map(str::to_string),
        current_status: current.status(),
        current_prompt: current.prompt().map(str::to_string),
        current_error: (current.status() == NodeStatus::Failed).then_some(FailureKind::GenerationFailed),
        can_delete_current: can_delete_node(session, branch, branch.cursor()),
        can_delete_root: can_delete_root(session),
        in_flight: session.in_flight_count(),
        download_file_count: download_file_count(branch),
        failed_resizes: failed_resizes(branch),
        compare: compare_pair(session, branch),
    })
}

/// The image a viewer shows right now: the cursor of the active branch.
pub fn displayed_image_url(state: &EditorState) -> Option<&str> {
    state.active_branch()?.cursor_node().image_url()
}

/// Mirrors the checks `delete_node` applies, for greying out a delete button.
pub fn can_delete_node(session: &Session, branch: &Branch, index: usize) -> bool {
    let Some(node) = branch.node(index) else {
        return false;
    };
    if index > 0 {
        return node.status() != NodeStatus::Pending;
    }
    if branch.id().is_root() {
        return can_delete_root(session);
    }
    branch.len() == 1 && !branch.has_active_variants()
}

/// Completed versions plus completed resized variants of one branch.
pub fn download_file_count(branch: &Branch) -> usize {
    branch.completed_count()
        + branch
            .resized_variants()
            .values()
            .filter(|variant| variant.status.image_url().is_some())
            .count()
}

/// Labels whose latest resize ended in an error; each can be retried.
pub fn failed_resizes(branch: &Branch) -> Vec<SizeLabel> {
    branch
        .resized_variants()
        .iter()
        .filter(|(_, variant)| matches!(variant.status, VariantStatus::Error { .. }))
        .map(|(label, _)| label.clone())
        .collect()
}

fn compare_pair(session: &Session, branch: &Branch) -> Option<ComparePair> {
    let compare = session.compare()?;
    if compare.branch_id != *branch.id() {
        return None;
    }
    let url_at = |index: usize| {
        branch
            .node(index)
            .and_then(|node| node.image_url())
            .map(str::to_string)
    };
    Some(ComparePair {
        left_index: compare.left_index,
        right_index: compare.right_index,
        left_image_url: url_at(compare.left_index),
        right_image_url: url_at(compare.right_index),
    })
}
