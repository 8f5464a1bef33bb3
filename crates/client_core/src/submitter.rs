use std::sync::Arc;

use chrono::{DateTime, Utc};
use shared::{
    allocation::{AllocationRow, ValidationError},
    domain::{ActorContext, ActorId, ResolutionId},
    protocol::{AssignmentEntry, AssignmentRequest},
};
use thiserror::Error;
use tracing::{info, warn};

use crate::{AssignmentOutcome, AssignmentService};

/// Shown when the service refused without saying why.
pub const GENERIC_ASSIGNMENT_FAILURE: &str = "failed to assign resolution";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("allocation has {} unresolved problem(s)", .0.len())]
    NotSubmittable(Vec<ValidationError>),
    #[error("editor is {0}, not editing")]
    NotEditing(&'static str),
    #[error("assignment failed: {reason}")]
    AssignmentFailed { reason: String },
}

impl SubmitError {
    /// Text for the form's error banner. Service rejections show the
    /// service's own wording.
    pub fn user_message(&self) -> String {
        match self {
            Self::AssignmentFailed { reason } => reason.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentReceipt {
    pub resolution_id: ResolutionId,
    pub secretary_id: ActorId,
    pub assignments: Vec<AssignmentEntry>,
    pub submitted_at: DateTime<Utc>,
}

/// Posts validated allocations to the assignment service.
#[derive(Clone)]
pub struct AssignmentSubmitter {
    service: Arc<dyn AssignmentService>,
}

impl AssignmentSubmitter {
    pub fn new(service: Arc<dyn AssignmentService>) -> Self {
        Self { service }
    }

    /// Pairs each assigned row's subcommittee with its share, in row order.
    pub fn build_request(actor: &ActorContext, rows: &[AllocationRow]) -> AssignmentRequest {
        AssignmentRequest {
            assignments: rows.iter().filter_map(AssignmentEntry::from_row).collect(),
            secretary_id: actor.actor_id,
        }
    }

    /// Expects rows that already passed validation; does not retry.
    pub async fn submit(
        &self,
        resolution_id: ResolutionId,
        actor: &ActorContext,
        rows: &[AllocationRow],
    ) -> Result<AssignmentReceipt, SubmitError> {
        let request = Self::build_request(actor, rows);
        info!(
            "assignment: submitting resolution={} secretary={} role={:?} entries={}",
            resolution_id,
            actor.actor_id,
            actor.role,
            request.assignments.len()
        );

        let reason = match self.service.assign(resolution_id, &request).await {
            Ok(AssignmentOutcome::Accepted) => {
                info!("assignment: accepted resolution={resolution_id}");
                return Ok(AssignmentReceipt {
                    resolution_id,
                    secretary_id: request.secretary_id,
                    assignments: request.assignments,
                    submitted_at: Utc::now(),
                });
            }
            Ok(AssignmentOutcome::Rejected { reason }) => {
                reason.unwrap_or_else(|| GENERIC_ASSIGNMENT_FAILURE.to_string())
            }
            Err(err) => {
                warn!("assignment: transport failure resolution={resolution_id} error={err:#}");
                format!("{err:#}")
            }
        };

        Err(SubmitError::AssignmentFailed { reason })
    }
}

#[cfg(test)]
#[path = "tests/submitter_tests.rs"]
mod tests;
