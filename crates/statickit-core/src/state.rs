use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::error::EditorError;
use super::error::GenerationFailure;
use super::request::Dimensions;
use super::request::GenerationOptions;
use super::request::SizeLabel;

pub const ROOT_BRANCH_ID: &str = "original";

pub const DEFAULT_GENERATION_TIMEOUT_MS: u64 = 120_000;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BranchId(pub String);

impl BranchId {
    pub fn root() -> Self {
        Self(ROOT_BRANCH_ID.to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_BRANCH_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BranchId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Pending,
    Completed,
    Failed,
}

impl NodeStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// One image state in a branch. Settles exactly once: `Pending` moves to
/// `Completed` (with an image) or `Failed`, and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionNode {
    pub(crate) id: NodeId,
    pub(crate) image_url: Option<String>,
    pub(crate) prompt: Option<String>,
    pub(crate) parent_index: Option<usize>,
    pub(crate) status: NodeStatus,
    pub(crate) created_at_ms: i64,
    pub(crate) failure: Option<GenerationFailure>,
}

impl VersionNode {
    pub(crate) fn root(id: NodeId, image_url: String, now_ms: i64) -> Self {
        Self {
            id,
            image_url: Some(image_url),
            prompt: None,
            parent_index: None,
            status: NodeStatus::Completed,
            created_at_ms: now_ms,
            failure: None,
        }
    }

    pub(crate) fn pending(id: NodeId, prompt: String, parent_index: usize, now_ms: i64) -> Self {
        Self {
            id,
            image_url: None,
            prompt: Some(prompt),
            parent_index: Some(parent_index),
            status: NodeStatus::Pending,
            created_at_ms: now_ms,
            failure: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    /// `None` for a branch root.
    pub fn parent_index(&self) -> Option<usize> {
        self.parent_index
    }

    pub fn status(&self) -> NodeStatus {
        self.status
    }

    pub fn created_at_ms(&self) -> i64 {
        self.created_at_ms
    }

    pub fn failure(&self) -> Option<&GenerationFailure> {
        self.failure.as_ref()
    }

    pub fn is_completed(&self) -> bool {
        self.status == NodeStatus::Completed
    }

    pub fn is_pending(&self) -> bool {
        self.status == NodeStatus::Pending
    }

    pub(crate) fn settle_completed(&mut self, image_url: String) -> bool {
        if self.status != NodeStatus::Pending {
            return false;
        }
        self.status = NodeStatus::Completed;
        self.image_url = Some(image_url);
        true
    }

    pub(crate) fn settle_failed(&mut self, failure: GenerationFailure) -> bool {
        if self.status != NodeStatus::Pending {
            return false;
        }
        self.status = NodeStatus::Failed;
        self.failure = Some(failure);
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum VariantStatus {
    Idle,
    Resizing,
    Completed { image_url: String },
    Error { failure: GenerationFailure },
}

impl VariantStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Resizing => "resizing",
            Self::Completed { .. } => "completed",
            Self::Error { .. } => "error",
        }
    }

    /// Resizing or completed variants hold the branch root in place.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Resizing | Self::Completed { .. })
    }

    pub fn image_url(&self) -> Option<&str> {
        match self {
            Self::Completed { image_url } => Some(image_url.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResizedVariant {
    pub dims: Dimensions,
    pub status: VariantStatus,
    pub request_id: Option<RequestId>,
    pub source_node: NodeId,
    pub requested_at_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branch {
    pub(crate) id: BranchId,
    pub(crate) name: String,
    pub(crate) root_image_url: String,
    pub(crate) nodes: Vec<VersionNode>,
    pub(crate) cursor: usize,
    pub(crate) resized_variants: BTreeMap<SizeLabel, ResizedVariant>,
}

impl Branch {
    pub(crate) fn new(
        id: BranchId,
        name: String,
        root_image_url: String,
        root_node_id: NodeId,
        now_ms: i64,
    ) -> Self {
        Self {
            id,
            name,
            nodes: vec![VersionNode::root(
                root_node_id,
                root_image_url.clone(),
                now_ms,
            )],
            root_image_url,
            cursor: 0,
            resized_variants: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &BranchId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root_image_url(&self) -> &str {
        &self.root_image_url
    }

    pub fn nodes(&self) -> &[VersionNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&VersionNode> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cursor_node(&self) -> &VersionNode {
        &self.nodes[self.cursor]
    }

    pub fn resized_variants(&self) -> &BTreeMap<SizeLabel, ResizedVariant> {
        &self.resized_variants
    }

    pub fn variant_status(&self, label: &SizeLabel) -> VariantStatus {
        self.resized_variants
            .get(label)
            .map(|variant| variant.status.clone())
            .unwrap_or(VariantStatus::Idle)
    }

    pub fn has_active_variants(&self) -> bool {
        self.resized_variants
            .values()
            .any(|variant| variant.status.is_active())
    }

    pub fn completed_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_completed()).count()
    }

    pub fn pending_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_pending()).count()
            + self
                .resized_variants
                .values()
                .filter(|variant| variant.status == VariantStatus::Resizing)
                .count()
    }

    pub fn position_of(&self, node_id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|node| node.id == node_id)
    }

    pub(crate) fn append_pending(
        &mut self,
        node_id: NodeId,
        prompt: String,
        parent_index: usize,
        now_ms: i64,
    ) -> usize {
        self.nodes
            .push(VersionNode::pending(node_id, prompt, parent_index, now_ms));
        self.nodes.len() - 1
    }

    /// Splices out a non-root node. Children of the removed node adopt its
    /// parent and later parent indices shift down, so no reference dangles.
    pub(crate) fn remove_node(&mut self, index: usize) -> VersionNode {
        let removed = self.nodes.remove(index);
        let adopted_parent = removed.parent_index;
        for node in &mut self.nodes {
            node.parent_index = match node.parent_index {
                Some(parent) if parent == index => adopted_parent,
                Some(parent) if parent > index => Some(parent - 1),
                other => other,
            };
        }
        self.cursor = index.saturating_sub(1);
        removed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompareSession {
    pub branch_id: BranchId,
    pub left_index: usize,
    pub right_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageAnalysis {
    pub description: String,
    pub tags: Vec<String>,
}

/// The branch registry for one uploaded image.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub(crate) branches: Vec<Branch>,
    pub(crate) active_branch_id: BranchId,
    pub(crate) compare: Option<CompareSession>,
    pub(crate) variation_count: usize,
    pub(crate) analysis: Option<ImageAnalysis>,
    pub(crate) next_branch_seq: u64,
}

impl Session {
    pub(crate) fn new(root_image_url: String, label: String, root_node_id: NodeId, now_ms: i64) -> Self {
        Self {
            branches: vec![Branch::new(
                BranchId::root(),
                label,
                root_image_url,
                root_node_id,
                now_ms,
            )],
            active_branch_id: BranchId::root(),
            compare: None,
            variation_count: 0,
            analysis: None,
            next_branch_seq: 1,
        }
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn branch(&self, id: &BranchId) -> Option<&Branch> {
        self.branches.iter().find(|branch| branch.id == *id)
    }

    pub(crate) fn branch_mut(&mut self, id: &BranchId) -> Option<&mut Branch> {
        self.branches.iter_mut().find(|branch| branch.id == *id)
    }

    pub(crate) fn require_branch(&self, id: &BranchId) -> Result<&Branch, EditorError> {
        self.branch(id)
            .ok_or_else(|| EditorError::UnknownBranch(id.clone()))
    }

    pub(crate) fn require_branch_mut(&mut self, id: &BranchId) -> Result<&mut Branch, EditorError> {
        self.branch_mut(id)
            .ok_or_else(|| EditorError::UnknownBranch(id.clone()))
    }

    pub fn active_branch_id(&self) -> &BranchId {
        &self.active_branch_id
    }

    /// Falls back to the first branch when the active id has gone stale.
    pub fn active_branch(&self) -> &Branch {
        self.branch(&self.active_branch_id)
            .unwrap_or(&self.branches[0])
    }

    pub fn compare(&self) -> Option<&CompareSession> {
        self.compare.as_ref()
    }

    pub fn variation_count(&self) -> usize {
        self.variation_count
    }

    pub fn analysis(&self) -> Option<&ImageAnalysis> {
        self.analysis.as_ref()
    }

    pub fn in_flight_count(&self) -> usize {
        self.branches.iter().map(Branch::pending_count).sum()
    }

    pub(crate) fn create_branch(
        &mut self,
        source_image_url: String,
        label: String,
        root_node_id: NodeId,
        now_ms: i64,
    ) -> BranchId {
        let id = BranchId(format!("branch-{}", self.next_branch_seq));
        self.next_branch_seq += 1;
        self.branches.push(Branch::new(
            id.clone(),
            label,
            source_image_url,
            root_node_id,
            now_ms,
        ));
        self.active_branch_id = id.clone();
        self.compare = None;
        id
    }

    /// Removes a non-root branch. The root branch is only removed by
    /// resetting the whole session.
    pub(crate) fn remove_branch(&mut self, id: &BranchId) -> Option<Branch> {
        if id.is_root() {
            return None;
        }
        let position = self.branches.iter().position(|branch| branch.id == *id)?;
        let removed = self.branches.remove(position);
        if self.active_branch_id == *id {
            self.active_branch_id = BranchId::root();
        }
        if self
            .compare
            .as_ref()
            .is_some_and(|compare| compare.branch_id == *id)
        {
            self.compare = None;
        }
        Some(removed)
    }

    pub(crate) fn shift_compare_after_delete(&mut self, branch_id: &BranchId, index: usize) {
        let Some(compare) = self.compare.as_mut() else {
            return;
        };
        if compare.branch_id != *branch_id {
            return;
        }
        if compare.left_index == index || compare.right_index == index {
            self.compare = None;
            return;
        }
        if compare.left_index > index {
            compare.left_index -= 1;
        }
        if compare.right_index > index {
            compare.right_index -= 1;
        }
    }
}

/// The one guard for deleting the original upload: the root branch holds
/// nothing but its root node, it has no live resized variants, no other
/// branch exists and no variation artifacts were produced from it.
pub fn can_delete_root(session: &Session) -> bool {
    let Some(root) = session.branch(&BranchId::root()) else {
        return false;
    };
    root.len() == 1
        && !root.has_active_variants()
        && session.branches.len() == 1
        && session.variation_count == 0
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub generation_timeout_ms: Option<u64>,
    pub default_options: GenerationOptions,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            generation_timeout_ms: Some(DEFAULT_GENERATION_TIMEOUT_MS),
            default_options: GenerationOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EditorState {
    pub(crate) session: Option<Session>,
    pub(crate) settings: EngineSettings,
    pub(crate) next_node_id: u64,
    pub(crate) next_request_id: u64,
}

impl EditorState {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            session: None,
            settings,
            next_node_id: 0,
            next_request_id: 0,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub(crate) fn session_mut(&mut self) -> Result<&mut Session, EditorError> {
        self.session.as_mut().ok_or(EditorError::NoSession)
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn active_branch(&self) -> Option<&Branch> {
        self.session.as_ref().map(Session::active_branch)
    }

    pub fn branch(&self, id: &BranchId) -> Option<&Branch> {
        self.session.as_ref().and_then(|session| session.branch(id))
    }

    pub(crate) fn allocate_node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    pub(crate) fn allocate_request_id(&mut self) -> RequestId {
        let id = RequestId(self.next_request_id);
        self.next_request_id += 1;
        id
    }

    /// Starts a fresh session rooted at `image_url`, discarding any previous one.
    pub fn upload(&mut self, image_url: impl Into<String>, label: impl Into<String>) -> BranchId {
        let root_node_id = self.allocate_node_id();
        self.session = Some(Session::new(
            image_url.into(),
            label.into(),
            root_node_id,
            now_ms(),
        ));
        tracing::info!(branch = ROOT_BRANCH_ID, "session started");
        BranchId::root()
    }

    /// Always succeeds. Without a session the new branch becomes the root.
    pub fn create_branch(
        &mut self,
        source_image_url: impl Into<String>,
        label: impl Into<String>,
    ) -> BranchId {
        if self.session.is_none() {
            return self.upload(source_image_url, label);
        }
        let root_node_id = self.allocate_node_id();
        let Some(session) = self.session.as_mut() else {
            return BranchId::root();
        };
        let id = session.create_branch(source_image_url.into(), label.into(), root_node_id, now_ms());
        tracing::debug!(branch = %id, "branch created");
        id
    }

    pub fn delete_branch(&mut self, id: &BranchId) -> Result<(), EditorError> {
        let session = self.session_mut()?;
        session.require_branch(id)?;
        if id.is_root() {
            if !can_delete_root(session) {
                return Err(EditorError::CannotDelete {
                    branch_id: id.clone(),
                    index: 0,
                });
            }
            self.reset();
            return Ok(());
        }
        session.remove_branch(id);
        tracing::debug!(branch = %id, "branch deleted");
        Ok(())
    }

    pub fn set_variation_count(&mut self, count: usize) -> Result<(), EditorError> {
        self.session_mut()?.variation_count = count;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.session = None;
        tracing::info!("session reset");
    }
}

pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
