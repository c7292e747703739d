//! Turns user requests into pending versions or resize variants, and folds
//! collaborator results back into the branch that asked for them.
//!
//! The pending node is appended before any job leaves the engine, so the
//! slot a job writes to is owned by that job alone. Results are matched by
//! [`NodeId`], never by position, so a later splice in the same branch
//! cannot redirect them.

use serde::Serialize;

use super::error::EditorError;
use super::error::GenerationFailure;
use super::request::Dimensions;
use super::request::EditScope;
use super::request::GenerationKind;
use super::request::GenerationOptions;
use super::request::RequestKind;
use super::request::SizeLabel;
use super::state::now_ms;
use super::state::BranchId;
use super::state::EditorState;
use super::state::NodeId;
use super::state::NodeStatus;
use super::state::RequestId;
use super::state::ResizedVariant;
use super::state::VariantStatus;
use super::state::VersionNode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationJob {
    pub branch_id: BranchId,
    pub node_id: NodeId,
    pub node_index: usize,
    pub kind: GenerationKind,
    pub source_image_url: String,
    pub instruction: String,
    pub scope: EditScope,
    pub options: GenerationOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResizeJob {
    pub branch_id: BranchId,
    pub label: SizeLabel,
    pub request_id: RequestId,
    pub source_image_url: String,
    pub dims: Dimensions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Generation(GenerationJob),
    Resize(ResizeJob),
    /// A resize for this label is already running; nothing new was issued.
    AlreadyResizing,
}

impl EditorState {
    /// Single entry point for every request kind.
    pub fn submit(
        &mut self,
        branch_id: &BranchId,
        request: RequestKind,
        options: Option<GenerationOptions>,
    ) -> Result<Dispatch, EditorError> {
        let options = options.unwrap_or(self.settings.default_options);
        match request {
            RequestKind::Resize { label, dims } => Ok(self
                .request_resize(branch_id, label, dims)?
                .map_or(Dispatch::AlreadyResizing, Dispatch::Resize)),
            kind => self
                .allocate_generation(branch_id, &kind, options)
                .map(Dispatch::Generation),
        }
    }

    /// Appends a pending node derived from `source_index` and returns its
    /// index alongside the job to run. The cursor does not move.
    pub fn request_edit(
        &mut self,
        branch_id: &BranchId,
        source_index: usize,
        instruction: impl Into<String>,
    ) -> Result<(usize, GenerationJob), EditorError> {
        let kind = RequestKind::Edit {
            source_index,
            instruction: instruction.into(),
        };
        let options = self.settings.default_options;
        let job = self.allocate_generation(branch_id, &kind, options)?;
        Ok((job.node_index, job))
    }

    fn allocate_generation(
        &mut self,
        branch_id: &BranchId,
        kind: &RequestKind,
        options: GenerationOptions,
    ) -> Result<GenerationJob, EditorError> {
        let (Some(source_index), Some(generation)) = (kind.source_index(), kind.generation_kind())
        else {
            return Err(EditorError::InvalidRequest(format!(
                "{} has no source version",
                kind.label()
            )));
        };
        let instruction = kind.instruction()?;

        let session = self.session.as_ref().ok_or(EditorError::NoSession)?;
        let branch = session.require_branch(branch_id)?;
        let source = branch.node(source_index).ok_or_else(|| EditorError::NodeOutOfRange {
            branch_id: branch_id.clone(),
            index: source_index,
        })?;
        let not_ready = || EditorError::SourceNotReady {
            branch_id: branch_id.clone(),
            index: source_index,
        };
        if source.status() != NodeStatus::Completed {
            return Err(not_ready());
        }
        let source_image_url = source.image_url().ok_or_else(not_ready)?.to_string();

        let node_id = self.allocate_node_id();
        let branch = self.session_mut()?.require_branch_mut(branch_id)?;
        let node_index = branch.append_pending(node_id, instruction.clone(), source_index, now_ms());
        tracing::debug!(
            branch = %branch_id,
            node = node_id.0,
            index = node_index,
            parent = source_index,
            kind = generation.label(),
            "generation requested"
        );

        Ok(GenerationJob {
            branch_id: branch_id.clone(),
            node_id,
            node_index,
            kind: generation,
            source_image_url,
            instruction,
            scope: kind.scope(),
            options,
        })
    }

    /// Starts a resize of the branch cursor. Returns `None` while the same
    /// label is still resizing.
    pub fn request_resize(
        &mut self,
        branch_id: &BranchId,
        label: SizeLabel,
        dims: Dimensions,
    ) -> Result<Option<ResizeJob>, EditorError> {
        let session = self.session.as_ref().ok_or(EditorError::NoSession)?;
        let branch = session.require_branch(branch_id)?;
        if branch.variant_status(&label) == VariantStatus::Resizing {
            tracing::debug!(branch = %branch_id, label = %label, "resize already running");
            return Ok(None);
        }
        let source = branch.cursor_node();
        let not_ready = || EditorError::SourceNotReady {
            branch_id: branch_id.clone(),
            index: branch.cursor(),
        };
        if !source.is_completed() {
            return Err(not_ready());
        }
        let source_image_url = source.image_url().ok_or_else(not_ready)?.to_string();
        let source_node = source.id();

        let request_id = self.allocate_request_id();
        let branch = self.session_mut()?.require_branch_mut(branch_id)?;
        branch.resized_variants.insert(
            label.clone(),
            ResizedVariant {
                dims,
                status: VariantStatus::Resizing,
                request_id: Some(request_id),
                source_node,
                requested_at_ms: now_ms(),
            },
        );
        tracing::debug!(branch = %branch_id, label = %label, dims = %dims, "resize requested");

        Ok(Some(ResizeJob {
            branch_id: branch_id.clone(),
            label,
            request_id,
            source_image_url,
            dims,
        }))
    }

    /// Returns false when the result no longer has a home: the branch or
    /// session is gone, or the node already settled.
    pub fn complete_generation(
        &mut self,
        branch_id: &BranchId,
        node_id: NodeId,
        image_url: String,
    ) -> bool {
        let Some(node) = self.pending_target(branch_id, node_id) else {
            return false;
        };
        node.settle_completed(image_url)
    }

    pub fn fail_generation(
        &mut self,
        branch_id: &BranchId,
        node_id: NodeId,
        failure: GenerationFailure,
    ) -> bool {
        let Some(node) = self.pending_target(branch_id, node_id) else {
            return false;
        };
        node.settle_failed(failure)
    }

    fn pending_target(
        &mut self,
        branch_id: &BranchId,
        node_id: NodeId,
    ) -> Option<&mut VersionNode> {
        let branch = self.session.as_mut()?.branch_mut(branch_id)?;
        let index = branch.position_of(node_id)?;
        branch.nodes.get_mut(index)
    }

    pub fn complete_resize(
        &mut self,
        branch_id: &BranchId,
        label: &SizeLabel,
        request_id: RequestId,
        image_url: String,
    ) -> bool {
        self.settle_resize(
            branch_id,
            label,
            request_id,
            VariantStatus::Completed { image_url },
        )
    }

    pub fn fail_resize(
        &mut self,
        branch_id: &BranchId,
        label: &SizeLabel,
        request_id: RequestId,
        failure: GenerationFailure,
    ) -> bool {
        self.settle_resize(branch_id, label, request_id, VariantStatus::Error { failure })
    }

    fn settle_resize(
        &mut self,
        branch_id: &BranchId,
        label: &SizeLabel,
        request_id: RequestId,
        status: VariantStatus,
    ) -> bool {
        let Some(variant) = self
            .session
            .as_mut()
            .and_then(|session| session.branch_mut(branch_id))
            .and_then(|branch| branch.resized_variants.get_mut(label))
        else {
            return false;
        };
        if variant.request_id != Some(request_id) || variant.status != VariantStatus::Resizing {
            return false;
        }
        variant.status = status;
        true
    }

    /// Fails every pending node and resizing variant older than the
    /// configured timeout. Returns how many were expired.
    pub fn expire_stale(&mut self, now_ms: i64) -> usize {
        let Some(timeout_ms) = self.settings.generation_timeout_ms else {
            return 0;
        };
        let Some(session) = self.session.as_mut() else {
            return 0;
        };
        let window_ms = i64::try_from(timeout_ms).unwrap_or(i64::MAX);
        let deadline = |started_ms: i64| started_ms.saturating_add(window_ms) <= now_ms;
        let failure = GenerationFailure::TimedOut {
            after_ms: timeout_ms,
        };

        let mut expired = 0;
        for branch in &mut session.branches {
            for node in &mut branch.nodes {
                if node.is_pending()
                    && deadline(node.created_at_ms)
                    && node.settle_failed(failure.clone())
                {
                    expired += 1;
                }
            }
            for variant in branch.resized_variants.values_mut() {
                if variant.status == VariantStatus::Resizing && deadline(variant.requested_at_ms) {
                    variant.status = VariantStatus::Error {
                        failure: failure.clone(),
                    };
                    expired += 1;
                }
            }
        }
        expired
    }
}
