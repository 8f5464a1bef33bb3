use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use shared::{
    domain::{ResolutionId, Subcommittee},
    error::ApiError,
    protocol::{assign_resolution_path, AssignmentRequest, AssignmentResponse, SUBCOMMITTEES_ROUTE},
};
use tracing::{info, warn};
use url::Url;

pub mod config;
pub mod editor;
pub mod submitter;

pub use config::{load_settings, ClientSettings};
pub use editor::{AllocationEditor, AllocationSummary, EditorState};
pub use submitter::{AssignmentReceipt, AssignmentSubmitter, SubmitError};

/// Source of assignable subcommittees.
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn list_subcommittees(&self) -> Result<Vec<Subcommittee>>;
}

pub struct MissingCatalogService;

#[async_trait]
impl CatalogService for MissingCatalogService {
    async fn list_subcommittees(&self) -> Result<Vec<Subcommittee>> {
        Err(anyhow!("catalog service is not configured"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentOutcome {
    Accepted,
    /// The service answered but refused. `reason` is the message from the
    /// response body when it carried one.
    Rejected { reason: Option<String> },
}

/// Resolution assignment endpoint. Transport failures are `Err`; anything the
/// service actually answered is an `AssignmentOutcome`.
#[async_trait]
pub trait AssignmentService: Send + Sync {
    async fn assign(
        &self,
        resolution_id: ResolutionId,
        request: &AssignmentRequest,
    ) -> Result<AssignmentOutcome>;
}

/// JSON-over-HTTP client for the portal backend.
#[derive(Clone)]
pub struct PortalClient {
    http: Client,
    base_url: Url,
}

impl PortalClient {
    pub fn new(base_url: Url) -> Self {
        Self::with_http_client(Client::new(), base_url)
    }

    pub fn with_http_client(http: Client, base_url: Url) -> Self {
        Self {
            http,
            base_url: with_trailing_slash(base_url),
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .context("failed to build portal http client")?;
        Ok(Self::with_http_client(http, settings.base_url()?))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .with_context(|| format!("invalid portal endpoint path '{path}'"))
    }
}

/// `Url::join` drops the last path segment unless the base ends in '/'.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[async_trait]
impl CatalogService for PortalClient {
    async fn list_subcommittees(&self) -> Result<Vec<Subcommittee>> {
        let url = self.endpoint(SUBCOMMITTEES_ROUTE)?;
        let subcommittees: Vec<Subcommittee> = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("invalid subcommittee catalog payload")?;
        info!("catalog: fetched subcommittees count={}", subcommittees.len());
        Ok(subcommittees)
    }
}

#[async_trait]
impl AssignmentService for PortalClient {
    async fn assign(
        &self,
        resolution_id: ResolutionId,
        request: &AssignmentRequest,
    ) -> Result<AssignmentOutcome> {
        let url = self.endpoint(&assign_resolution_path(resolution_id))?;
        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .context("assignment request could not be sent")?;
        let status = response.status();
        let body = response
            .text()
            .await
            .context("assignment response body could not be read")?;

        let outcome = classify_assignment_response(status, &body);
        if let AssignmentOutcome::Rejected { reason } = &outcome {
            warn!(
                "assignment: rejected resolution={} status={} reason={:?}",
                resolution_id, status, reason
            );
        }
        Ok(outcome)
    }
}

/// Success needs both a 2xx status and `success: true` in the body.
pub fn classify_assignment_response(status: StatusCode, body: &str) -> AssignmentOutcome {
    let parsed = serde_json::from_str::<AssignmentResponse>(body).ok();
    if status.is_success() && parsed.as_ref().is_some_and(|r| r.success) {
        return AssignmentOutcome::Accepted;
    }

    let reason = parsed
        .and_then(|r| r.error)
        .or_else(|| {
            serde_json::from_str::<ApiError>(body)
                .ok()
                .map(|e| e.message)
        })
        .filter(|reason| !reason.trim().is_empty());
    AssignmentOutcome::Rejected { reason }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
