use pretty_assertions::assert_eq;

use super::*;

const SQUARE: Dimensions = Dimensions::new(1080, 1080);

fn resize_job(effects: &[EditorEffect]) -> ResizeJob {
    match effects {
        [EditorEffect::DispatchResize(job), EditorEffect::RequestFrame] => job.clone(),
        other => panic!("expected resize dispatch, got {other:?}"),
    }
}

fn variant(state: &EditorState, label: &str) -> VariantStatus {
    state
        .branch(&root())
        .expect("branch")
        .variant_status(&SizeLabel::from(label))
}

#[test]
fn resize_runs_from_the_cursor_version() {
    let mut state = state_with_completed(1);
    user(&mut state, UserAction::SelectNode { branch_id: root(), index: 1 }).expect("select");

    let job = resize_job(&resize(&mut state, &root(), "square", SQUARE));

    assert_eq!(job.source_image_url, "https://img/edit-0.png");
    assert_eq!(job.dims, SQUARE);
    assert_eq!(variant(&state, "square"), VariantStatus::Resizing);
    // Resizes never add versions.
    assert_eq!(state.branch(&root()).expect("branch").len(), 2);
}

#[test]
fn repeated_resize_while_running_is_ignored() {
    let mut state = state();
    let job = resize_job(&resize(&mut state, &root(), "square", SQUARE));

    let again = resize(&mut state, &root(), "square", SQUARE);
    assert!(again.is_empty());

    let effects = run_runtime(
        &mut state,
        RuntimeAction::ResizeCompleted {
            branch_id: root(),
            label: SizeLabel::from("square"),
            request_id: job.request_id,
            image_url: "https://img/square.png".to_string(),
        },
    );
    assert_eq!(effects, vec![EditorEffect::RequestFrame]);

    let variants = state.branch(&root()).expect("branch").resized_variants();
    assert_eq!(variants.len(), 1);
    assert_eq!(
        variant(&state, "square"),
        VariantStatus::Completed {
            image_url: "https://img/square.png".to_string()
        }
    );
}

#[test]
fn superseded_resize_results_are_dropped() {
    let mut state = state();
    let first = resize_job(&resize(&mut state, &root(), "story", Dimensions::new(1080, 1920)));
    run_runtime(
        &mut state,
        RuntimeAction::ResizeFailed {
            branch_id: root(),
            label: SizeLabel::from("story"),
            request_id: first.request_id,
            failure: GenerationFailure::InvalidResponse {
                message: "no image".to_string(),
            },
        },
    );
    assert_eq!(variant(&state, "story").label(), "error");

    let second = resize_job(&resize(&mut state, &root(), "story", Dimensions::new(1080, 1920)));
    assert_ne!(first.request_id, second.request_id);

    let stale = run_runtime(
        &mut state,
        RuntimeAction::ResizeCompleted {
            branch_id: root(),
            label: SizeLabel::from("story"),
            request_id: first.request_id,
            image_url: "https://img/old.png".to_string(),
        },
    );
    assert!(stale.is_empty());
    assert_eq!(variant(&state, "story"), VariantStatus::Resizing);
}

#[test]
fn resize_needs_a_completed_cursor() {
    let mut state = state();
    edit(&mut state, &root(), 0, "slow");
    user(&mut state, UserAction::SelectNode { branch_id: root(), index: 1 }).expect("select");

    let err = user(
        &mut state,
        UserAction::Submit {
            branch_id: root(),
            request: RequestKind::Resize {
                label: SizeLabel::from("square"),
                dims: SQUARE,
            },
            options: None,
        },
    )
    .expect_err("pending cursor");

    assert_eq!(err, EditorError::SourceNotReady { branch_id: root(), index: 1 });
    assert_eq!(variant(&state, "square"), VariantStatus::Idle);
}

#[test]
fn labels_resize_independently() {
    let mut state = state();
    resize_job(&resize(&mut state, &root(), "square", SQUARE));
    resize_job(&resize(&mut state, &root(), "banner", Dimensions::new(1500, 500)));

    assert_eq!(state.branch(&root()).expect("branch").resized_variants().len(), 2);
    assert_eq!(state.session().expect("session").in_flight_count(), 2);
}
