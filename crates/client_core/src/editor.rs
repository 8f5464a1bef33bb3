//! Editing session for one resolution's subcommittee split.
//!
//! The editor owns its rows exclusively. Every mutation takes `&mut self`
//! and finishes before the next one starts; the only suspension points are
//! the catalog fetch and the final submit. While a submit is awaiting the
//! service the editor stays mutably borrowed, which keeps a second submit
//! from being issued for the same session.

use std::fmt;

use shared::{
    allocation::{
        allocation_status, coerce_percent, remaining_percent, total_percent, validate,
        AllocationRow, AllocationStatus, ValidationError,
    },
    domain::{ActorContext, ResolutionId, RowId, Subcommittee, SubcommitteeId},
};
use tracing::{info, warn};

use crate::{
    submitter::{AssignmentReceipt, AssignmentSubmitter, SubmitError},
    CatalogService,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorState {
    Loading,
    Editing,
    Submitting,
    Submitted(AssignmentReceipt),
}

impl EditorState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Editing => "editing",
            Self::Submitting => "submitting",
            Self::Submitted(_) => "submitted",
        }
    }
}

pub struct AllocationEditor {
    rows: Vec<AllocationRow>,
    catalog: Vec<Subcommittee>,
    state: EditorState,
    warning: Option<String>,
    last_error: Option<String>,
}

impl Default for AllocationEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationEditor {
    /// A fresh session waiting for its catalog, holding one empty row.
    pub fn new() -> Self {
        Self {
            rows: vec![AllocationRow::unassigned(0)],
            catalog: Vec::new(),
            state: EditorState::Loading,
            warning: None,
            last_error: None,
        }
    }

    pub fn with_catalog(catalog: Vec<Subcommittee>) -> Self {
        let mut editor = Self::new();
        editor.catalog = catalog;
        editor.state = EditorState::Editing;
        editor
    }

    pub async fn open(catalog: &dyn CatalogService) -> Self {
        let mut editor = Self::new();
        editor.load_catalog(catalog).await;
        editor
    }

    /// Fetches the catalog once. A failed fetch leaves the catalog empty and
    /// records a warning; the editor becomes editable either way.
    pub async fn load_catalog(&mut self, catalog: &dyn CatalogService) {
        if self.state != EditorState::Loading {
            return;
        }

        match catalog.list_subcommittees().await {
            Ok(subcommittees) => {
                info!("editor: catalog loaded subcommittees={}", subcommittees.len());
                self.catalog = subcommittees;
                self.warning = None;
            }
            Err(err) => {
                warn!("editor: catalog unavailable, continuing without it error={err:#}");
                self.catalog.clear();
                self.warning = Some(format!("could not load subcommittees: {err}"));
            }
        }
        self.state = EditorState::Editing;
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn rows(&self) -> &[AllocationRow] {
        &self.rows
    }

    pub fn catalog(&self) -> &[Subcommittee] {
        &self.catalog
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn is_editing(&self) -> bool {
        self.state == EditorState::Editing
    }

    fn row_mut(&mut self, row_id: RowId) -> Option<&mut AllocationRow> {
        self.rows.iter_mut().find(|row| row.row_id == row_id)
    }

    /// Appends a row pre-filled with the headroom left toward 100. Refused
    /// once every catalog entry could already have a row.
    pub fn add_row(&mut self) -> Option<RowId> {
        if !self.is_editing() || self.rows.len() >= self.catalog.len() {
            return None;
        }
        let row = AllocationRow::unassigned(remaining_percent(&self.rows));
        let row_id = row.row_id;
        self.rows.push(row);
        Some(row_id)
    }

    /// The last remaining row cannot be removed.
    pub fn remove_row(&mut self, row_id: RowId) -> bool {
        if !self.is_editing() || self.rows.len() <= 1 {
            return false;
        }
        let before = self.rows.len();
        self.rows.retain(|row| row.row_id != row_id);
        self.rows.len() != before
    }

    /// Only catalog entries can be picked; `None` clears the choice.
    pub fn set_row_subcommittee(
        &mut self,
        row_id: RowId,
        subcommittee_id: Option<SubcommitteeId>,
    ) -> bool {
        if !self.is_editing() {
            return false;
        }
        if let Some(id) = subcommittee_id {
            if !self.catalog.iter().any(|sub| sub.id == id) {
                warn!("editor: rejected subcommittee outside catalog id={id}");
                return false;
            }
        }
        match self.row_mut(row_id) {
            Some(row) => {
                row.subcommittee_id = subcommittee_id;
                true
            }
            None => false,
        }
    }

    /// Stores the value as given. Totals above 100 are flagged by
    /// validation, never clamped here.
    pub fn set_row_percent(&mut self, row_id: RowId, value: i64) -> bool {
        if !self.is_editing() {
            return false;
        }
        match self.row_mut(row_id) {
            Some(row) => {
                row.contribution_percent = value;
                true
            }
            None => false,
        }
    }

    /// Raw text from the percent field; non-numeric input becomes 0.
    pub fn set_row_percent_input(&mut self, row_id: RowId, raw: &str) -> bool {
        self.set_row_percent(row_id, coerce_percent(raw))
    }

    pub fn total_percent(&self) -> i64 {
        total_percent(&self.rows)
    }

    pub fn current_errors(&self) -> Vec<ValidationError> {
        validate(&self.rows, self.catalog.len())
    }

    pub fn status(&self) -> AllocationStatus {
        allocation_status(&self.rows, self.catalog.len())
    }

    pub fn is_submittable(&self) -> bool {
        self.current_errors().is_empty()
    }

    /// Catalog entries the given row may pick: everything not already taken
    /// by another row, plus the row's own current choice.
    pub fn available_subcommittees(&self, row_id: RowId) -> Vec<&Subcommittee> {
        let taken: Vec<SubcommitteeId> = self
            .rows
            .iter()
            .filter(|row| row.row_id != row_id)
            .filter_map(|row| row.subcommittee_id)
            .collect();
        self.catalog
            .iter()
            .filter(|sub| !taken.contains(&sub.id))
            .collect()
    }

    fn subcommittee_name(&self, id: SubcommitteeId) -> String {
        self.catalog
            .iter()
            .find(|sub| sub.id == id)
            .map(|sub| sub.name.clone())
            .unwrap_or_else(|| format!("Subcommittee {id}"))
    }

    /// First `limit` assigned rows in insertion order, with a count of the
    /// assigned rows left out.
    pub fn summary(&self, limit: usize) -> AllocationSummary {
        let assigned: Vec<&AllocationRow> =
            self.rows.iter().filter(|row| row.is_assigned()).collect();
        let shown = assigned
            .iter()
            .take(limit)
            .filter_map(|row| {
                let id = row.subcommittee_id?;
                Some((self.subcommittee_name(id), row.contribution_percent))
            })
            .collect::<Vec<_>>();
        AllocationSummary {
            remaining: assigned.len() - shown.len(),
            shown,
        }
    }

    /// Submits the current rows. Only an editable, error-free set is sent;
    /// on failure the editor goes back to editing with the reason recorded.
    pub async fn submit(
        &mut self,
        submitter: &AssignmentSubmitter,
        resolution_id: ResolutionId,
        actor: &ActorContext,
    ) -> Result<AssignmentReceipt, SubmitError> {
        if !self.is_editing() {
            return Err(SubmitError::NotEditing(self.state.label()));
        }
        let errors = self.current_errors();
        if !errors.is_empty() {
            return Err(SubmitError::NotSubmittable(errors));
        }

        self.state = EditorState::Submitting;
        self.last_error = None;

        match submitter.submit(resolution_id, actor, &self.rows).await {
            Ok(receipt) => {
                self.state = EditorState::Submitted(receipt.clone());
                Ok(receipt)
            }
            Err(err) => {
                self.state = EditorState::Editing;
                self.last_error = Some(err.user_message());
                Err(err)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationSummary {
    pub shown: Vec<(String, i64)>,
    pub remaining: usize,
}

impl fmt::Display for AllocationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = self
            .shown
            .iter()
            .map(|(name, pct)| format!("{name} ({pct}%)"))
            .collect::<Vec<_>>();
        write!(f, "{}", parts.join(", "))?;
        if self.remaining > 0 {
            write!(f, " and {} more", self.remaining)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/editor_tests.rs"]
mod tests;
