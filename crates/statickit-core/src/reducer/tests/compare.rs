use pretty_assertions::assert_eq;

use super::*;
use crate::state::CompareSession;

fn enter(state: &mut EditorState) -> Result<Vec<EditorEffect>, EditorError> {
    user(state, UserAction::EnterCompare { branch_id: root() })
}

fn compare(state: &EditorState) -> Option<CompareSession> {
    state.session().and_then(|s| s.compare()).cloned()
}

#[test]
fn compare_locks_cursor_and_picks_next_neighbour() {
    let mut state = state_with_completed(2);
    user(&mut state, UserAction::SelectNode { branch_id: root(), index: 1 }).expect("select");

    enter(&mut state).expect("enter");
    assert_eq!(
        compare(&state),
        Some(CompareSession {
            branch_id: root(),
            left_index: 1,
            right_index: 2,
        })
    );

    let err = user(&mut state, UserAction::SelectCompareRight { index: 1 }).expect_err("same node");
    assert_eq!(err.code(), "compare-same-node");
    assert_eq!(compare(&state).map(|c| c.right_index), Some(2));

    user(&mut state, UserAction::DeleteNode { branch_id: root(), index: 2 }).expect("delete");
    assert_eq!(compare(&state), None);
}

#[test]
fn compare_needs_two_completed_versions() {
    let mut state = state();
    let job = edit(&mut state, &root(), 0, "pending");

    let err = enter(&mut state).expect_err("one completed");
    assert_eq!(err, EditorError::CompareUnavailable { completed: 1 });

    fail(&mut state, &job);
    assert_eq!(enter(&mut state).expect_err("still one").code(), "compare-unavailable");
}

#[test]
fn compare_from_last_version_falls_back_to_previous() {
    let mut state = state_with_completed(2);
    user(&mut state, UserAction::SelectNode { branch_id: root(), index: 2 }).expect("select");
    enter(&mut state).expect("enter");
    assert_eq!(compare(&state).map(|c| (c.left_index, c.right_index)), Some((2, 1)));
}

#[test]
fn compare_skips_unsettled_neighbours() {
    let mut state = state_with_completed(1);
    edit(&mut state, &root(), 0, "in flight");
    let failed = edit(&mut state, &root(), 0, "will fail");
    fail(&mut state, &failed);
    let done = edit(&mut state, &root(), 1, "done");
    succeed(&mut state, &done, "https://img/done.png");
    user(&mut state, UserAction::SelectNode { branch_id: root(), index: 1 }).expect("select");

    enter(&mut state).expect("enter");
    assert_eq!(compare(&state).map(|c| c.right_index), Some(0));

    let err = user(&mut state, UserAction::SelectCompareRight { index: 2 }).expect_err("pending");
    assert_eq!(err, EditorError::CompareInvalidTarget(2));
    user(&mut state, UserAction::SelectCompareRight { index: 4 }).expect("completed target");
    assert_eq!(compare(&state).map(|c| c.right_index), Some(4));
}

#[test]
fn compare_rejects_unsettled_cursor() {
    let mut state = state_with_completed(1);
    edit(&mut state, &root(), 0, "in flight");
    user(&mut state, UserAction::SelectNode { branch_id: root(), index: 2 }).expect("select");
    assert_eq!(
        enter(&mut state).expect_err("pending cursor"),
        EditorError::CompareInvalidTarget(2)
    );
}

#[test]
fn deleting_below_the_pair_shifts_indices() {
    let mut state = state_with_completed(3);
    user(&mut state, UserAction::SelectNode { branch_id: root(), index: 2 }).expect("select");
    enter(&mut state).expect("enter");
    assert_eq!(compare(&state).map(|c| (c.left_index, c.right_index)), Some((2, 3)));

    user(&mut state, UserAction::DeleteNode { branch_id: root(), index: 1 }).expect("delete");

    assert_eq!(compare(&state).map(|c| (c.left_index, c.right_index)), Some((1, 2)));
    let pair = crate::views::derive_view(&state)
        .and_then(|view| view.compare)
        .expect("pair");
    assert_eq!(pair.left_image_url.as_deref(), Some("https://img/edit-1.png"));
    assert_eq!(pair.right_image_url.as_deref(), Some("https://img/edit-2.png"));
}

#[test]
fn switching_branch_or_exiting_ends_compare() {
    let mut state = state_with_completed(1);
    enter(&mut state).expect("enter");
    user(&mut state, UserAction::ExitCompare).expect("exit");
    assert_eq!(compare(&state), None);
    assert_eq!(
        user(&mut state, UserAction::SelectCompareRight { index: 1 }).expect_err("inactive"),
        EditorError::CompareInactive
    );

    enter(&mut state).expect("enter again");
    user(
        &mut state,
        UserAction::CreateBranch {
            source_image_url: "https://img/x.png".to_string(),
            label: "X".to_string(),
        },
    )
    .expect("branch");
    assert_eq!(compare(&state), None);
}
