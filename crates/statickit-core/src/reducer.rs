use super::actions::EditorAction;
use super::actions::RuntimeAction;
use super::actions::UserAction;
use super::error::EditorError;
use super::orchestrator::Dispatch;
use super::orchestrator::GenerationJob;
use super::orchestrator::ResizeJob;
use super::state::BranchId;
use super::state::EditorState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEffect {
    RequestFrame,
    DispatchGeneration(GenerationJob),
    DispatchResize(ResizeJob),
    AnalyzeImage { image_url: String },
}

pub fn reduce(state: &mut EditorState, action: EditorAction) -> Result<Vec<EditorEffect>, EditorError> {
    match action {
        EditorAction::User(user) => reduce_user(state, user),
        EditorAction::Runtime(runtime) => Ok(reduce_runtime(state, runtime)),
    }
}

fn reduce_user(state: &mut EditorState, action: UserAction) -> Result<Vec<EditorEffect>, EditorError> {
    match action {
        UserAction::Upload { image_url, label } => {
            state.upload(image_url.clone(), label);
            Ok(vec![
                EditorEffect::AnalyzeImage { image_url },
                EditorEffect::RequestFrame,
            ])
        }
        UserAction::CreateBranch {
            source_image_url,
            label,
        } => {
            state.create_branch(source_image_url, label);
            Ok(vec![EditorEffect::RequestFrame])
        }
        UserAction::DeleteBranch { branch_id } => {
            state.delete_branch(&branch_id)?;
            Ok(vec![EditorEffect::RequestFrame])
        }
        UserAction::SelectBranch { branch_id } => {
            state.select_branch(&branch_id)?;
            Ok(vec![EditorEffect::RequestFrame])
        }
        UserAction::PromoteNode { branch_id, index } => {
            state.promote_node(&branch_id, index)?;
            Ok(vec![EditorEffect::RequestFrame])
        }
        UserAction::Submit {
            branch_id,
            request,
            options,
        } => match state.submit(&branch_id, request, options)? {
            Dispatch::Generation(job) => Ok(vec![
                EditorEffect::DispatchGeneration(job),
                EditorEffect::RequestFrame,
            ]),
            Dispatch::Resize(job) => Ok(vec![
                EditorEffect::DispatchResize(job),
                EditorEffect::RequestFrame,
            ]),
            Dispatch::AlreadyResizing => Ok(Vec::new()),
        },
        UserAction::MoveCursor {
            branch_id,
            direction,
        } => {
            if state.move_cursor(&branch_id, direction)? {
                return Ok(vec![EditorEffect::RequestFrame]);
            }
            Ok(Vec::new())
        }
        UserAction::SelectNode { branch_id, index } => {
            state.select_node(&branch_id, index)?;
            Ok(vec![EditorEffect::RequestFrame])
        }
        UserAction::DeleteNode { branch_id, index } => {
            state.delete_node(&branch_id, index)?;
            Ok(vec![EditorEffect::RequestFrame])
        }
        UserAction::DismissFailed { branch_id, index } => {
            state.dismiss_failed(&branch_id, index)?;
            Ok(vec![EditorEffect::RequestFrame])
        }
        UserAction::EnterCompare { branch_id } => {
            state.enter_compare(&branch_id)?;
            Ok(vec![EditorEffect::RequestFrame])
        }
        UserAction::SelectCompareRight { index } => {
            state.select_compare_right(index)?;
            Ok(vec![EditorEffect::RequestFrame])
        }
        UserAction::ExitCompare => {
            state.exit_compare();
            Ok(vec![EditorEffect::RequestFrame])
        }
        UserAction::SetVariationCount(count) => {
            state.set_variation_count(count)?;
            Ok(Vec::new())
        }
        UserAction::ResetSession => {
            state.reset();
            Ok(vec![EditorEffect::RequestFrame])
        }
    }
}

fn reduce_runtime(state: &mut EditorState, action: RuntimeAction) -> Vec<EditorEffect> {
    match action {
        RuntimeAction::GenerationCompleted {
            branch_id,
            node_id,
            image_url,
        } => {
            if state.complete_generation(&branch_id, node_id, image_url) {
                tracing::debug!(branch = %branch_id, node = node_id.0, "generation completed");
                return vec![EditorEffect::RequestFrame];
            }
            tracing::warn!(branch = %branch_id, node = node_id.0, "dropping generation result with no pending node");
            Vec::new()
        }
        RuntimeAction::GenerationFailed {
            branch_id,
            node_id,
            failure,
        } => {
            let reason = failure.to_string();
            if state.fail_generation(&branch_id, node_id, failure) {
                tracing::debug!(branch = %branch_id, node = node_id.0, %reason, "generation failed");
                return vec![EditorEffect::RequestFrame];
            }
            tracing::warn!(branch = %branch_id, node = node_id.0, %reason, "dropping generation failure with no pending node");
            Vec::new()
        }
        RuntimeAction::ResizeCompleted {
            branch_id,
            label,
            request_id,
            image_url,
        } => {
            if state.complete_resize(&branch_id, &label, request_id, image_url) {
                return vec![EditorEffect::RequestFrame];
            }
            tracing::warn!(branch = %branch_id, label = %label, request = request_id.0, "dropping stale resize result");
            Vec::new()
        }
        RuntimeAction::ResizeFailed {
            branch_id,
            label,
            request_id,
            failure,
        } => {
            let reason = failure.to_string();
            if state.fail_resize(&branch_id, &label, request_id, failure) {
                tracing::debug!(branch = %branch_id, label = %label, %reason, "resize failed");
                return vec![EditorEffect::RequestFrame];
            }
            tracing::warn!(branch = %branch_id, label = %label, request = request_id.0, "dropping stale resize failure");
            Vec::new()
        }
        RuntimeAction::AnalysisReady {
            image_url,
            analysis,
        } => {
            let Some(session) = state.session.as_mut() else {
                return Vec::new();
            };
            let matches_root = session
                .branch(&BranchId::root())
                .is_some_and(|root| root.root_image_url() == image_url);
            if !matches_root {
                tracing::debug!(%image_url, "analysis is for a previous upload");
                return Vec::new();
            }
            session.analysis = Some(analysis);
            vec![EditorEffect::RequestFrame]
        }
        RuntimeAction::AnalysisFailed { image_url, message } => {
            tracing::warn!(%image_url, %message, "image analysis failed");
            Vec::new()
        }
        RuntimeAction::ExpireStale { now_ms } => {
            let expired = state.expire_stale(now_ms);
            if expired == 0 {
                return Vec::new();
            }
            tracing::warn!(expired, "expired stale requests");
            vec![EditorEffect::RequestFrame]
        }
    }
}

#[cfg(test)]
mod tests;
