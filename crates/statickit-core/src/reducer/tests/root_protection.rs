use pretty_assertions::assert_eq;

use super::*;
use crate::state::can_delete_root;

fn delete_root(state: &mut EditorState) -> Result<Vec<EditorEffect>, EditorError> {
    user(state, UserAction::DeleteNode { branch_id: root(), index: 0 })
}

fn assert_root_guarded(state: &mut EditorState) {
    assert!(!can_delete_root(state.session().expect("session")));
    let err = delete_root(state).expect_err("guarded");
    assert_eq!(err, EditorError::CannotDelete { branch_id: root(), index: 0 });
    assert!(state.session().is_some());
}

#[test]
fn lone_root_can_be_deleted_and_resets_the_session() {
    let mut state = state();
    delete_root(&mut state).expect("delete");
    assert!(state.session().is_none());
    assert!(crate::views::derive_view(&state).is_none());
}

#[test]
fn root_with_versions_is_protected() {
    let mut state = state_with_completed(1);
    assert_root_guarded(&mut state);
}

#[test]
fn root_with_pending_version_is_protected() {
    let mut state = state();
    edit(&mut state, &root(), 0, "slow");
    assert_root_guarded(&mut state);
}

#[test]
fn root_with_sibling_branch_is_protected() {
    let mut state = state();
    user(
        &mut state,
        UserAction::CreateBranch {
            source_image_url: "https://img/other.png".to_string(),
            label: "Other".to_string(),
        },
    )
    .expect("branch");
    assert_root_guarded(&mut state);
}

#[test]
fn root_with_live_variants_is_protected() {
    let mut state = state();
    resize(&mut state, &root(), "square", Dimensions::new(1080, 1080));
    assert_root_guarded(&mut state);
}

#[test]
fn failed_variants_do_not_protect_the_root() {
    let mut state = state();
    let effects = resize(&mut state, &root(), "square", Dimensions::new(1080, 1080));
    let [EditorEffect::DispatchResize(job), EditorEffect::RequestFrame] = effects.as_slice() else {
        panic!("unexpected effects {effects:?}");
    };
    run_runtime(
        &mut state,
        RuntimeAction::ResizeFailed {
            branch_id: root(),
            label: job.label.clone(),
            request_id: job.request_id,
            failure: GenerationFailure::TimedOut { after_ms: 1_000 },
        },
    );

    delete_root(&mut state).expect("delete");
    assert!(state.session().is_none());
}

#[test]
fn variation_artifacts_protect_the_root() {
    let mut state = state();
    user(&mut state, UserAction::SetVariationCount(3)).expect("count");
    assert_root_guarded(&mut state);
}

#[test]
fn branch_root_is_deletable_only_when_alone() {
    let mut state = state();
    user(
        &mut state,
        UserAction::CreateBranch {
            source_image_url: "https://img/other.png".to_string(),
            label: "Other".to_string(),
        },
    )
    .expect("branch");
    let other = BranchId::from("branch-1");
    let job = edit(&mut state, &other, 0, "tweak");
    succeed(&mut state, &job, "https://img/tweak.png");

    let err = user(&mut state, UserAction::DeleteNode { branch_id: other.clone(), index: 0 })
        .expect_err("has versions");
    assert_eq!(err.code(), "cannot-delete");

    user(&mut state, UserAction::DeleteNode { branch_id: other.clone(), index: 1 }).expect("delete version");
    user(&mut state, UserAction::DeleteNode { branch_id: other.clone(), index: 0 }).expect("delete branch");

    let session = state.session().expect("session");
    assert!(session.branch(&other).is_none());
    assert!(session.active_branch_id().is_root());
}
