use pretty_assertions::assert_eq;

use super::*;

#[test]
fn deleting_a_pending_node_is_rejected() {
    let mut state = state();
    edit(&mut state, &root(), 0, "in flight");

    let err = user(&mut state, UserAction::DeleteNode { branch_id: root(), index: 1 })
        .expect_err("pending");

    assert_eq!(err, EditorError::NodeInFlight { branch_id: root(), index: 1 });
    assert_eq!(state.branch(&root()).expect("branch").len(), 2);
}

#[test]
fn deleting_a_middle_node_reparents_and_steps_cursor_back() {
    let mut state = state();
    let b = edit(&mut state, &root(), 0, "b");
    succeed(&mut state, &b, "https://img/b.png");
    let c = edit(&mut state, &root(), 1, "c");
    succeed(&mut state, &c, "https://img/c.png");
    user(&mut state, UserAction::SelectNode { branch_id: root(), index: 2 }).expect("select");

    user(&mut state, UserAction::DeleteNode { branch_id: root(), index: 1 }).expect("delete");

    let branch = state.branch(&root()).expect("branch");
    assert_eq!(branch.len(), 2);
    assert_eq!(branch.cursor(), 0);
    assert_eq!(branch.node(1).map(|n| n.id()), Some(c.node_id));
    assert_eq!(branch.node(1).and_then(|n| n.parent_index()), Some(0));
    assert_settlement_invariant(&state);
}

#[test]
fn failed_nodes_can_be_deleted_directly() {
    let mut state = state();
    let job = edit(&mut state, &root(), 0, "x");
    fail(&mut state, &job);

    user(&mut state, UserAction::DeleteNode { branch_id: root(), index: 1 }).expect("delete");
    assert_eq!(state.branch(&root()).expect("branch").len(), 1);
}

#[test]
fn select_node_checks_range() {
    let mut state = state_with_completed(1);
    let err = user(&mut state, UserAction::SelectNode { branch_id: root(), index: 5 })
        .expect_err("range");
    assert_eq!(err.code(), "node-out-of-range");
    assert_eq!(cursor(&state, &root()), 0);
}

#[test]
fn cursor_may_rest_on_a_pending_node() {
    let mut state = state();
    edit(&mut state, &root(), 0, "slow");
    user(
        &mut state,
        UserAction::MoveCursor {
            branch_id: root(),
            direction: CursorDirection::Next,
        },
    )
    .expect("move");

    let view = crate::views::derive_view(&state).expect("view");
    assert_eq!(view.cursor, 1);
    assert_eq!(view.current_status, NodeStatus::Pending);
    assert_eq!(view.current_image_url, None);
    assert!(!view.can_delete_current);
}

#[test]
fn each_branch_keeps_its_own_cursor() {
    let mut state = state_with_completed(2);
    user(&mut state, UserAction::SelectNode { branch_id: root(), index: 2 }).expect("select");
    user(
        &mut state,
        UserAction::CreateBranch {
            source_image_url: "https://img/other.png".to_string(),
            label: "Other".to_string(),
        },
    )
    .expect("branch");

    assert_eq!(cursor(&state, &BranchId::from("branch-1")), 0);
    user(&mut state, UserAction::SelectBranch { branch_id: root() }).expect("select branch");
    assert_eq!(crate::views::displayed_image_url(&state), Some("https://img/edit-1.png"));
}
