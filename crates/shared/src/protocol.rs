use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    allocation::AllocationRow,
    domain::{ActorId, ResolutionId, SubcommitteeId},
};

pub const SUBCOMMITTEES_ROUTE: &str = "/subcommittees";
pub const ASSIGN_RESOLUTION_ROUTE: &str = "/resolutions/:resolution_id/assign";
pub const RESOLUTION_ASSIGNMENTS_ROUTE: &str = "/resolutions/:resolution_id/assignments";

/// Concrete path for `ASSIGN_RESOLUTION_ROUTE`.
pub fn assign_resolution_path(resolution_id: ResolutionId) -> String {
    ASSIGN_RESOLUTION_ROUTE.replace(":resolution_id", &resolution_id.0.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentEntry {
    pub subcommittee_id: SubcommitteeId,
    pub contribution_percentage: i64,
}

impl AssignmentEntry {
    /// `None` for rows without a subcommittee or without a positive share.
    pub fn from_row(row: &AllocationRow) -> Option<Self> {
        if !row.is_assigned() {
            return None;
        }
        Some(Self {
            subcommittee_id: row.subcommittee_id?,
            contribution_percentage: row.contribution_percent,
        })
    }

    pub fn to_row(self) -> AllocationRow {
        AllocationRow::new(Some(self.subcommittee_id), self.contribution_percentage)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRequest {
    pub assignments: Vec<AssignmentEntry>,
    pub secretary_id: ActorId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AssignmentResponse {
    pub fn accepted() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionAssignments {
    pub resolution_id: ResolutionId,
    pub secretary_id: ActorId,
    pub assignments: Vec<AssignmentEntry>,
    pub assigned_at: DateTime<Utc>,
}
