use super::*;
use crate::{AssignmentOutcome, AssignmentService, MissingCatalogService};
use anyhow::Result;
use async_trait::async_trait;
use shared::{
    domain::ActorId,
    protocol::AssignmentRequest,
    roles::Role,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

struct FixedCatalog(Vec<Subcommittee>);

#[async_trait]
impl CatalogService for FixedCatalog {
    async fn list_subcommittees(&self) -> Result<Vec<Subcommittee>> {
        Ok(self.0.clone())
    }
}

struct ScriptedAssignments {
    outcome: AssignmentOutcome,
    calls: AtomicUsize,
}

impl ScriptedAssignments {
    fn new(outcome: AssignmentOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl AssignmentService for ScriptedAssignments {
    async fn assign(
        &self,
        _resolution_id: ResolutionId,
        _request: &AssignmentRequest,
    ) -> Result<AssignmentOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.outcome.clone())
    }
}

fn catalog(size: i64) -> Vec<Subcommittee> {
    (1..=size)
        .map(|id| Subcommittee::new(id, format!("Committee {id}")))
        .collect()
}

fn secretary() -> ActorContext {
    ActorContext::new(ActorId(3), Role::Secretary)
}

/// Editor whose rows are exactly `rows`, given as (subcommittee, percent).
fn editor_with_rows(catalog_size: i64, rows: &[(Option<i64>, i64)]) -> AllocationEditor {
    let mut editor = AllocationEditor::with_catalog(catalog(catalog_size));
    let first = editor.rows()[0].row_id;
    for _ in 1..rows.len() {
        editor.add_row().expect("room for row");
    }
    let ids: Vec<RowId> = editor.rows().iter().map(|r| r.row_id).collect();
    for (row_id, (sub, pct)) in ids.into_iter().zip(rows) {
        editor.set_row_subcommittee(row_id, sub.map(SubcommitteeId));
        editor.set_row_percent(row_id, *pct);
    }
    assert_eq!(editor.rows()[0].row_id, first);
    editor
}

#[test]
fn new_editor_starts_loading_with_one_empty_row() {
    let editor = AllocationEditor::new();
    assert_eq!(editor.state(), &EditorState::Loading);
    assert_eq!(editor.rows().len(), 1);
    assert_eq!(editor.rows()[0].subcommittee_id, None);
}

#[tokio::test]
async fn open_loads_catalog_and_becomes_editable() {
    let editor = AllocationEditor::open(&FixedCatalog(catalog(3))).await;
    assert_eq!(editor.state(), &EditorState::Editing);
    assert_eq!(editor.catalog().len(), 3);
    assert!(editor.warning().is_none());
}

#[tokio::test]
async fn catalog_failure_degrades_to_empty_catalog_with_warning() {
    let mut editor = AllocationEditor::open(&MissingCatalogService).await;

    assert_eq!(editor.state(), &EditorState::Editing);
    assert!(editor.catalog().is_empty());
    assert!(editor
        .warning()
        .expect("warning")
        .contains("could not load subcommittees"));

    let row_id = editor.rows()[0].row_id;
    assert!(editor.set_row_percent(row_id, 100));
    assert!(!editor.set_row_subcommittee(row_id, Some(SubcommitteeId(1))));
    assert_eq!(editor.rows()[0].subcommittee_id, None);
    assert_eq!(
        editor.current_errors(),
        vec![ValidationError::RowMissingSubcommittee { index: 1 }]
    );
    assert!(!editor.is_submittable());
    assert_eq!(editor.add_row(), None);
}

#[test]
fn subcommittee_outside_catalog_is_refused() {
    let mut editor = AllocationEditor::with_catalog(catalog(2));
    let row_id = editor.rows()[0].row_id;
    assert!(editor.set_row_percent(row_id, 100));

    assert!(!editor.set_row_subcommittee(row_id, Some(SubcommitteeId(99))));
    assert_eq!(editor.rows()[0].subcommittee_id, None);
    assert!(!editor.is_submittable());

    assert!(editor.set_row_subcommittee(row_id, Some(SubcommitteeId(2))));
    assert!(editor.is_submittable());

    assert!(editor.set_row_subcommittee(row_id, None));
    assert_eq!(editor.rows()[0].subcommittee_id, None);
}

#[test]
fn scenario_a_is_submittable() {
    let editor = editor_with_rows(4, &[(Some(1), 60), (Some(2), 40)]);
    assert!(editor.current_errors().is_empty());
    assert!(editor.is_submittable());
    assert_eq!(editor.status().to_string(), "Total: 100% (valid)");
}

#[test]
fn scenario_b_duplicate_blocks_submission() {
    let editor = editor_with_rows(4, &[(Some(1), 60), (Some(1), 40)]);
    assert_eq!(editor.total_percent(), 100);
    assert!(editor
        .current_errors()
        .contains(&ValidationError::DuplicateSubcommittee {
            ids: vec![SubcommitteeId(1)]
        }));
    assert!(!editor.is_submittable());
}

#[test]
fn scenario_c_missing_subcommittee() {
    let editor = editor_with_rows(4, &[(None, 50)]);
    let errors = editor.current_errors();
    assert!(errors.contains(&ValidationError::RowMissingSubcommittee { index: 1 }));
    assert!(errors.contains(&ValidationError::TotalMismatch { actual: 50 }));
}

#[test]
fn scenario_d_new_row_takes_remaining_headroom() {
    let mut editor = editor_with_rows(4, &[(Some(1), 30)]);
    let row_id = editor.add_row().expect("added");

    let added = editor
        .rows()
        .iter()
        .find(|r| r.row_id == row_id)
        .expect("row");
    assert_eq!(added.contribution_percent, 70);
    assert_eq!(added.subcommittee_id, None);
    assert_eq!(editor.rows().last().map(|r| r.row_id), Some(row_id));
}

#[test]
fn new_row_headroom_floors_at_zero() {
    let mut editor = editor_with_rows(4, &[(Some(1), 80), (Some(2), 50)]);
    let row_id = editor.add_row().expect("added");
    let added = editor.rows().iter().find(|r| r.row_id == row_id).expect("row");
    assert_eq!(added.contribution_percent, 0);
}

#[test]
fn add_row_stops_at_catalog_size() {
    let mut editor = AllocationEditor::with_catalog(catalog(2));
    assert!(editor.add_row().is_some());
    assert_eq!(editor.rows().len(), 2);

    assert_eq!(editor.add_row(), None);
    assert_eq!(editor.rows().len(), 2);
}

#[test]
fn remove_row_never_empties_the_set() {
    let mut editor = AllocationEditor::with_catalog(catalog(3));
    let only = editor.rows()[0].row_id;
    assert!(!editor.remove_row(only));
    assert_eq!(editor.rows().len(), 1);

    let second = editor.add_row().expect("added");
    assert!(editor.remove_row(only));
    assert_eq!(editor.rows().len(), 1);
    assert_eq!(editor.rows()[0].row_id, second);
}

#[test]
fn remove_unknown_row_is_a_no_op() {
    let mut editor = AllocationEditor::with_catalog(catalog(3));
    editor.add_row();
    assert!(!editor.remove_row(RowId::new()));
    assert_eq!(editor.rows().len(), 2);
}

#[test]
fn editing_one_row_does_not_rebalance_others() {
    let mut editor = editor_with_rows(4, &[(Some(1), 60), (Some(2), 40)]);
    let first = editor.rows()[0].row_id;
    assert!(editor.set_row_percent(first, 90));

    assert_eq!(editor.rows()[1].contribution_percent, 40);
    assert_eq!(editor.total_percent(), 130);
    assert!(editor
        .current_errors()
        .contains(&ValidationError::TotalMismatch { actual: 130 }));
}

#[test]
fn percent_text_is_coerced() {
    let mut editor = AllocationEditor::with_catalog(catalog(2));
    let row_id = editor.rows()[0].row_id;

    assert!(editor.set_row_percent_input(row_id, " 45 "));
    assert_eq!(editor.total_percent(), 45);

    assert!(editor.set_row_percent_input(row_id, "lots"));
    assert!(editor
        .current_errors()
        .contains(&ValidationError::RowPercentOutOfRange { index: 1, value: 0 }));
}

#[test]
fn mutations_are_ignored_while_loading() {
    let mut editor = AllocationEditor::new();
    let row_id = editor.rows()[0].row_id;
    assert!(!editor.set_row_percent(row_id, 100));
    assert!(!editor.set_row_subcommittee(row_id, Some(SubcommitteeId(1))));
    assert_eq!(editor.add_row(), None);
}

#[test]
fn available_subcommittees_hide_choices_of_other_rows() {
    let editor = editor_with_rows(3, &[(Some(1), 50), (Some(2), 50)]);
    let first = editor.rows()[0].row_id;

    let names: Vec<&str> = editor
        .available_subcommittees(first)
        .into_iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(names, vec!["Committee 1", "Committee 3"]);
}

#[test]
fn summary_lists_first_assigned_rows() {
    let editor = editor_with_rows(
        5,
        &[(Some(2), 40), (None, 10), (Some(1), 30), (Some(4), 20)],
    );

    let summary = editor.summary(2);
    assert_eq!(
        summary.shown,
        vec![("Committee 2".to_string(), 40), ("Committee 1".to_string(), 30)]
    );
    assert_eq!(summary.remaining, 1);
    assert_eq!(
        summary.to_string(),
        "Committee 2 (40%), Committee 1 (30%) and 1 more"
    );
}

#[tokio::test]
async fn submit_refuses_invalid_set_without_calling_service() {
    let service = ScriptedAssignments::new(AssignmentOutcome::Accepted);
    let submitter = AssignmentSubmitter::new(service.clone());
    let mut editor = editor_with_rows(3, &[(Some(1), 60)]);

    let err = editor
        .submit(&submitter, ResolutionId(7), &secretary())
        .await
        .expect_err("should refuse");

    assert!(matches!(err, SubmitError::NotSubmittable(_)));
    assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    assert_eq!(editor.state(), &EditorState::Editing);
}

#[tokio::test]
async fn successful_submit_freezes_the_editor() {
    let service = ScriptedAssignments::new(AssignmentOutcome::Accepted);
    let submitter = AssignmentSubmitter::new(service.clone());
    let mut editor = editor_with_rows(3, &[(Some(1), 60), (Some(2), 40)]);

    let receipt = editor
        .submit(&submitter, ResolutionId(7), &secretary())
        .await
        .expect("submit");

    assert_eq!(receipt.assignments.len(), 2);
    assert_eq!(editor.state(), &EditorState::Submitted(receipt));
    assert!(editor.last_error().is_none());

    let row_id = editor.rows()[0].row_id;
    assert!(!editor.set_row_percent(row_id, 10));
    assert_eq!(editor.add_row(), None);

    let err = editor
        .submit(&submitter, ResolutionId(7), &secretary())
        .await
        .expect_err("already submitted");
    assert_eq!(err, SubmitError::NotEditing("submitted"));
    assert_eq!(service.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn scenario_e_rejection_returns_to_editing_with_reason() {
    let service = ScriptedAssignments::new(AssignmentOutcome::Rejected {
        reason: Some("resolution already finalized".into()),
    });
    let submitter = AssignmentSubmitter::new(service);
    let mut editor = editor_with_rows(3, &[(Some(1), 100)]);

    let err = editor
        .submit(&submitter, ResolutionId(7), &secretary())
        .await
        .expect_err("should fail");

    assert!(matches!(err, SubmitError::AssignmentFailed { .. }));
    assert_eq!(editor.state(), &EditorState::Editing);
    assert_eq!(editor.last_error(), Some("resolution already finalized"));

    let row_id = editor.rows()[0].row_id;
    assert!(editor.set_row_percent(row_id, 100));
}
