use serde::Deserialize;
use serde::Serialize;

use super::error::EditorError;
use super::state::can_delete_root;
use super::state::now_ms;
use super::state::Branch;
use super::state::BranchId;
use super::state::CompareSession;
use super::state::EditorState;
use super::state::NodeStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorDirection {
    Prev,
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    NodeRemoved { cursor: usize },
    BranchRemoved,
    SessionReset,
}

impl EditorState {
    /// Clamps at both ends; returns whether the cursor moved.
    pub fn move_cursor(
        &mut self,
        branch_id: &BranchId,
        direction: CursorDirection,
    ) -> Result<bool, EditorError> {
        let branch = self.session_mut()?.require_branch_mut(branch_id)?;
        let next = match direction {
            CursorDirection::Prev => branch.cursor.saturating_sub(1),
            CursorDirection::Next => (branch.cursor + 1).min(branch.nodes.len() - 1),
        };
        let moved = next != branch.cursor;
        branch.cursor = next;
        Ok(moved)
    }

    pub fn select_node(&mut self, branch_id: &BranchId, index: usize) -> Result<(), EditorError> {
        let branch = self.session_mut()?.require_branch_mut(branch_id)?;
        if index >= branch.nodes.len() {
            return Err(EditorError::NodeOutOfRange {
                branch_id: branch_id.clone(),
                index,
            });
        }
        branch.cursor = index;
        Ok(())
    }

    pub fn select_branch(&mut self, branch_id: &BranchId) -> Result<(), EditorError> {
        let session = self.session_mut()?;
        session.require_branch(branch_id)?;
        if session.active_branch_id != *branch_id {
            session.active_branch_id = branch_id.clone();
            session.compare = None;
        }
        Ok(())
    }

    /// Deletes one version. Index 0 removes the whole branch, or resets the
    /// session for the original upload, and only when nothing depends on it.
    pub fn delete_node(
        &mut self,
        branch_id: &BranchId,
        index: usize,
    ) -> Result<DeleteOutcome, EditorError> {
        let session = self.session_mut()?;
        let branch = session.require_branch(branch_id)?;
        let node = branch.node(index).ok_or_else(|| EditorError::NodeOutOfRange {
            branch_id: branch_id.clone(),
            index,
        })?;

        if index == 0 {
            return self.delete_branch_root(branch_id);
        }
        if node.status() == NodeStatus::Pending {
            return Err(EditorError::NodeInFlight {
                branch_id: branch_id.clone(),
                index,
            });
        }

        let branch = session.require_branch_mut(branch_id)?;
        branch.remove_node(index);
        let cursor = branch.cursor;
        session.shift_compare_after_delete(branch_id, index);
        tracing::debug!(branch = %branch_id, index, cursor, "version deleted");
        Ok(DeleteOutcome::NodeRemoved { cursor })
    }

    fn delete_branch_root(&mut self, branch_id: &BranchId) -> Result<DeleteOutcome, EditorError> {
        let session = self.session_mut()?;
        let cannot_delete = || EditorError::CannotDelete {
            branch_id: branch_id.clone(),
            index: 0,
        };
        if branch_id.is_root() {
            if !can_delete_root(session) {
                return Err(cannot_delete());
            }
            self.reset();
            return Ok(DeleteOutcome::SessionReset);
        }

        let branch = session.require_branch(branch_id)?;
        if branch.len() > 1 || branch.has_active_variants() {
            return Err(cannot_delete());
        }
        session.remove_branch(branch_id);
        tracing::debug!(branch = %branch_id, "branch deleted with its root");
        Ok(DeleteOutcome::BranchRemoved)
    }

    /// Discards a failed version and puts the cursor back on its parent.
    pub fn dismiss_failed(&mut self, branch_id: &BranchId, index: usize) -> Result<usize, EditorError> {
        let session = self.session_mut()?;
        let branch = session.require_branch_mut(branch_id)?;
        let node = branch.node(index).ok_or_else(|| EditorError::NodeOutOfRange {
            branch_id: branch_id.clone(),
            index,
        })?;
        if node.status() != NodeStatus::Failed {
            return Err(EditorError::NotFailed {
                branch_id: branch_id.clone(),
                index,
            });
        }

        let parent = node.parent_index().unwrap_or(0);
        branch.remove_node(index);
        branch.cursor = parent;
        session.shift_compare_after_delete(branch_id, index);
        tracing::debug!(branch = %branch_id, index, parent, "failed version dismissed");
        Ok(parent)
    }

    /// Snapshots a completed version into a new branch and makes it active.
    pub fn promote_node(&mut self, branch_id: &BranchId, index: usize) -> Result<BranchId, EditorError> {
        let session = self.session.as_ref().ok_or(EditorError::NoSession)?;
        let branch = session.require_branch(branch_id)?;
        let node = branch.node(index).ok_or_else(|| EditorError::NodeOutOfRange {
            branch_id: branch_id.clone(),
            index,
        })?;
        let image_url = match node.image_url() {
            Some(url) if node.is_completed() => url.to_string(),
            _ => {
                return Err(EditorError::SourceNotReady {
                    branch_id: branch_id.clone(),
                    index,
                })
            }
        };
        let label = format!("{} v{}", branch.name(), index);

        let root_node_id = self.allocate_node_id();
        let session = self.session_mut()?;
        let id = session.create_branch(image_url, label, root_node_id, now_ms());
        tracing::debug!(from = %branch_id, index, branch = %id, "version promoted to branch");
        Ok(id)
    }

    /// Locks the cursor as the left side and picks the nearest completed
    /// neighbour (next first) as the right side.
    pub fn enter_compare(&mut self, branch_id: &BranchId) -> Result<CompareSession, EditorError> {
        let session = self.session_mut()?;
        let branch = session.require_branch(branch_id)?;
        let completed = branch.completed_count();
        if completed < 2 {
            return Err(EditorError::CompareUnavailable { completed });
        }
        let left_index = branch.cursor();
        if !branch.cursor_node().is_completed() {
            return Err(EditorError::CompareInvalidTarget(left_index));
        }
        let right_index =
            nearest_completed(branch, left_index).ok_or(EditorError::CompareUnavailable { completed })?;

        let compare = CompareSession {
            branch_id: branch_id.clone(),
            left_index,
            right_index,
        };
        session.active_branch_id = branch_id.clone();
        session.compare = Some(compare.clone());
        Ok(compare)
    }

    pub fn select_compare_right(&mut self, index: usize) -> Result<(), EditorError> {
        let session = self.session_mut()?;
        let Some(compare) = session.compare.as_ref() else {
            return Err(EditorError::CompareInactive);
        };
        if index == compare.left_index {
            return Err(EditorError::CompareSameNode(index));
        }
        let branch = session.require_branch(&compare.branch_id)?;
        match branch.node(index) {
            None => {
                return Err(EditorError::NodeOutOfRange {
                    branch_id: compare.branch_id.clone(),
                    index,
                })
            }
            Some(node) if !node.is_completed() => {
                return Err(EditorError::CompareInvalidTarget(index))
            }
            Some(_) => {}
        }
        if let Some(compare) = session.compare.as_mut() {
            compare.right_index = index;
        }
        Ok(())
    }

    pub fn exit_compare(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.compare = None;
        }
    }
}

fn nearest_completed(branch: &Branch, from: usize) -> Option<usize> {
    let len = branch.len();
    (1..len).find_map(|distance| {
        let next = from + distance;
        if next < len && branch.nodes[next].is_completed() {
            return Some(next);
        }
        let prev = from.checked_sub(distance)?;
        branch.nodes[prev].is_completed().then_some(prev)
    })
}
