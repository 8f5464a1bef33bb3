use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use shared::{
    allocation::validate,
    domain::{ResolutionId, Subcommittee},
    error::{ApiError, ErrorCode},
    protocol::{AssignmentEntry, AssignmentRequest, ResolutionAssignments},
};
use tokio::sync::RwLock;
use tracing::info;

pub const ALREADY_FINALIZED: &str = "resolution already finalized";

/// In-memory catalog plus the assignments recorded against it.
pub struct AssignmentStore {
    catalog: Vec<Subcommittee>,
    resolutions: RwLock<HashMap<ResolutionId, ResolutionAssignments>>,
}

impl AssignmentStore {
    pub fn new(catalog: Vec<Subcommittee>) -> Self {
        Self {
            catalog,
            resolutions: RwLock::new(HashMap::new()),
        }
    }
}

#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<AssignmentStore>,
}

impl ApiContext {
    pub fn new(catalog: Vec<Subcommittee>) -> Self {
        Self {
            store: Arc::new(AssignmentStore::new(catalog)),
        }
    }
}

pub fn list_subcommittees(ctx: &ApiContext) -> Vec<Subcommittee> {
    ctx.store.catalog.clone()
}

/// Records the split for a resolution. A resolution is assigned once; later
/// attempts are conflicts.
pub async fn assign_resolution(
    ctx: &ApiContext,
    resolution_id: ResolutionId,
    request: AssignmentRequest,
) -> Result<ResolutionAssignments, ApiError> {
    let rows: Vec<_> = request
        .assignments
        .iter()
        .copied()
        .map(AssignmentEntry::to_row)
        .collect();
    let errors = validate(&rows, ctx.store.catalog.len());
    if !errors.is_empty() {
        let message = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ApiError::new(ErrorCode::Validation, message));
    }

    if let Some(unknown) = request
        .assignments
        .iter()
        .find(|entry| !ctx.store.catalog.iter().any(|s| s.id == entry.subcommittee_id))
    {
        return Err(ApiError::new(
            ErrorCode::Validation,
            format!("unknown subcommittee: {}", unknown.subcommittee_id),
        ));
    }

    let mut resolutions = ctx.store.resolutions.write().await;
    if resolutions.contains_key(&resolution_id) {
        return Err(ApiError::new(ErrorCode::Conflict, ALREADY_FINALIZED));
    }

    let record = ResolutionAssignments {
        resolution_id,
        secretary_id: request.secretary_id,
        assignments: request.assignments,
        assigned_at: Utc::now(),
    };
    resolutions.insert(resolution_id, record.clone());
    info!(
        %resolution_id,
        secretary_id = %record.secretary_id,
        entries = record.assignments.len(),
        "resolution assigned"
    );
    Ok(record)
}

pub async fn resolution_assignments(
    ctx: &ApiContext,
    resolution_id: ResolutionId,
) -> Result<ResolutionAssignments, ApiError> {
    ctx.store
        .resolutions
        .read()
        .await
        .get(&resolution_id)
        .cloned()
        .ok_or_else(|| {
            ApiError::new(
                ErrorCode::NotFound,
                format!("resolution {resolution_id} has no assignments"),
            )
        })
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
