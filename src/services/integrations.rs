// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Integration lifecycle: create, connect (with a live credential check),
//! update, credential re-display, and live summary calls.
//!
//! Credentials are sealed with [`SecretBox`] before they reach the database
//! and only opened here, right before a provider call.

use crate::db::Database;
use crate::error::AppError;
use crate::models::{
    ConnectIntegrationRequest, CreateIntegrationRequest, CredentialBag, CredentialView,
    Integration, IntegrationStatus, Project, UpdateIntegrationRequest,
};
use crate::registry::IntegrationKind;
use crate::services::aws::{AwsClient, AwsCredentials, RdsInstanceInfo, RdsMetrics, S3BucketInfo, S3Metrics};
use crate::services::secrets::SecretBox;
use crate::services::vercel::{VercelClient, VercelCredentials, VercelSummary};
use std::collections::BTreeMap;
use std::future::Future;
use uuid::Uuid;

/// Service for managing integrations and calling providers on their behalf.
#[derive(Clone)]
pub struct IntegrationService {
    db: Database,
    secrets: SecretBox,
    vercel: VercelClient,
    aws: AwsClient,
}

impl IntegrationService {
    pub fn new(db: Database, secrets: SecretBox, vercel: VercelClient, aws: AwsClient) -> Self {
        Self {
            db,
            secrets,
            vercel,
            aws,
        }
    }

    pub fn vercel(&self) -> &VercelClient {
        &self.vercel
    }

    /// Integrations of a project, without credentials.
    pub async fn list(&self, project_id: Uuid) -> Result<Vec<Integration>, AppError> {
        self.require_project(project_id).await?;
        self.db.list_integrations(project_id).await
    }

    /// Create a PENDING integration with no credentials.
    pub async fn create_pending(
        &self,
        project_id: Uuid,
        request: &CreateIntegrationRequest,
    ) -> Result<Integration, AppError> {
        let kind = parse_kind(&request.integration_type)?;
        let display_name = request
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::BadRequest("Integrations must have a display name".into()))?;
        self.require_project(project_id).await?;

        let integration = self
            .db
            .insert_pending_integration(project_id, kind, display_name)
            .await?;
        tracing::info!(
            integration_id = %integration.id,
            project_id = %project_id,
            integration_type = %kind,
            "Created pending integration"
        );
        Ok(integration)
    }

    /// Verify credentials against the provider and persist them.
    ///
    /// Nothing is written unless the live check succeeds.
    pub async fn connect(
        &self,
        project_id: Uuid,
        request: &ConnectIntegrationRequest,
    ) -> Result<Integration, AppError> {
        let kind = parse_kind(&request.integration_type)?;
        let bag = kind.normalize(&request.credentials);
        kind.validate_required(&bag).map_err(AppError::BadRequest)?;
        self.require_project(project_id).await?;

        self.verify(kind, &bag).await?;

        let display_name = request
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| kind.display_name_from(&bag));

        let integration = self
            .db
            .save_connected_integration(project_id, kind, &display_name, |id| {
                self.secrets.seal(id, &bag)
            })
            .await?;

        tracing::info!(
            integration_id = %integration.id,
            project_id = %project_id,
            integration_type = %kind,
            "Integration connected"
        );
        Ok(integration)
    }

    /// Merge non-blank submitted fields into the stored credentials, then
    /// verify the result live before writing it.
    pub async fn update(
        &self,
        project_id: Uuid,
        request: &UpdateIntegrationRequest,
    ) -> Result<Integration, AppError> {
        let kind = parse_kind(&request.integration_type)?;
        let (integration, mut bag) = self.stored_credentials(project_id, kind).await?;

        let changed = kind.merge(&mut bag, &request.credentials);
        if changed.is_empty() {
            tracing::debug!(integration_id = %integration.id, "Update changed no fields");
            return Ok(integration);
        }

        // The stored row stays as it was unless the merged bag passes
        self.verify(kind, &bag).await?;

        let sealed = self.secrets.seal(integration.id, &bag)?;
        let updated = self
            .db
            .update_integration_secret(integration.id, kind, &sealed)
            .await?;

        // Field names only; values never reach the log
        tracing::info!(
            integration_id = %integration.id,
            fields = %changed.join(","),
            "Integration credentials updated"
        );
        Ok(updated)
    }

    /// Stored credentials as masked/plain/unset views per registry field.
    pub async fn credentials_view(
        &self,
        project_id: Uuid,
        integration_type: &str,
    ) -> Result<BTreeMap<&'static str, CredentialView>, AppError> {
        let kind = parse_kind(integration_type)?;
        let (_, bag) = self.stored_credentials(project_id, kind).await?;
        Ok(kind.credential_view(&bag))
    }

    // ─── Live summaries ──────────────────────────────────────────

    pub async fn vercel_summary(&self, project_id: Uuid) -> Result<VercelSummary, AppError> {
        self.with_live_credentials(project_id, IntegrationKind::Vercel, |bag| async move {
            let creds = VercelCredentials::from_bag(&bag)?;
            self.vercel
                .get_summary(&creds.auth, &creds.project_name)
                .await
                .map_err(AppError::from)
        })
        .await
    }

    pub async fn s3_buckets(&self, project_id: Uuid) -> Result<Vec<S3BucketInfo>, AppError> {
        self.with_live_credentials(project_id, IntegrationKind::Aws, |bag| async move {
            let creds = AwsCredentials::from_bag(&bag)?;
            self.aws.get_buckets(&creds).await.map_err(AppError::from)
        })
        .await
    }

    pub async fn s3_metrics(&self, project_id: Uuid) -> Result<S3Metrics, AppError> {
        self.with_live_credentials(project_id, IntegrationKind::Aws, |bag| async move {
            let creds = AwsCredentials::from_bag(&bag)?;
            self.aws.get_s3_metrics(&creds).await.map_err(AppError::from)
        })
        .await
    }

    pub async fn rds_instances(&self, project_id: Uuid) -> Result<Vec<RdsInstanceInfo>, AppError> {
        self.with_live_credentials(project_id, IntegrationKind::Aws, |bag| async move {
            let creds = AwsCredentials::from_bag(&bag)?;
            self.aws.get_rds_instances(&creds).await.map_err(AppError::from)
        })
        .await
    }

    pub async fn rds_metrics(&self, project_id: Uuid) -> Result<RdsMetrics, AppError> {
        self.with_live_credentials(project_id, IntegrationKind::Aws, |bag| async move {
            let creds = AwsCredentials::from_bag(&bag)?;
            self.aws.get_rds_metrics(&creds).await.map_err(AppError::from)
        })
        .await
    }

    /// Flip an integration between CONNECTED and ERROR after a live call.
    ///
    /// Only provider failures count; our own errors leave the status alone.
    pub async fn record_outcome<T>(
        &self,
        integration: &Integration,
        result: &Result<T, AppError>,
    ) -> Result<(), AppError> {
        let next = match result {
            Ok(_) if integration.status == IntegrationStatus::Error => IntegrationStatus::Connected,
            Err(AppError::Provider(_)) if integration.status == IntegrationStatus::Connected => {
                IntegrationStatus::Error
            }
            _ => return Ok(()),
        };

        self.db.set_integration_status(integration.id, next).await?;
        tracing::info!(
            integration_id = %integration.id,
            from = %integration.status,
            to = %next,
            "Integration status changed"
        );
        Ok(())
    }

    // ─── Helper Methods ──────────────────────────────────────────

    async fn require_project(&self, project_id: Uuid) -> Result<Project, AppError> {
        self.db
            .get_project(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project {} not found", project_id)))
    }

    /// The integration of `kind` and its opened credentials. Integrations
    /// that never had credentials stored count as not connected.
    async fn stored_credentials(
        &self,
        project_id: Uuid,
        kind: IntegrationKind,
    ) -> Result<(Integration, CredentialBag), AppError> {
        let not_connected =
            || AppError::NotFound(format!("No connected {} integration found for project", kind.name()));

        let integration = self
            .db
            .get_integration(project_id, kind)
            .await?
            .ok_or_else(not_connected)?;
        let sealed = self
            .db
            .get_integration_secret(integration.id)
            .await?
            .ok_or_else(not_connected)?;
        let bag = self.secrets.open(integration.id, &sealed)?;
        Ok((integration, bag))
    }

    /// Run a live provider call with the stored credentials and record the
    /// outcome on the integration.
    async fn with_live_credentials<T, F, Fut>(
        &self,
        project_id: Uuid,
        kind: IntegrationKind,
        call: F,
    ) -> Result<T, AppError>
    where
        F: FnOnce(CredentialBag) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let (integration, bag) = self.stored_credentials(project_id, kind).await?;
        if !matches!(
            integration.status,
            IntegrationStatus::Connected | IntegrationStatus::Error
        ) {
            return Err(AppError::NotFound(format!(
                "No connected {} integration found for project",
                kind.name()
            )));
        }

        let result = call(bag).await;
        if let Err(e) = self.record_outcome(&integration, &result).await {
            tracing::warn!(integration_id = %integration.id, error = %e, "Failed to record integration status");
        }
        result
    }

    /// Live credential check run before `connect` and `update` write.
    async fn verify(&self, kind: IntegrationKind, bag: &CredentialBag) -> Result<(), AppError> {
        let outcome = match kind {
            IntegrationKind::Vercel => {
                let creds = VercelCredentials::from_bag(bag)?;
                self.vercel
                    .get_project(&creds.auth, &creds.project_name)
                    .await
                    .map(|project| {
                        tracing::debug!(vercel_project_id = %project.id, "Vercel credentials verified");
                    })
            }
            IntegrationKind::Aws => {
                let creds = AwsCredentials::from_bag(bag)?;
                match self.aws.resolve_credentials(&creds).await {
                    Ok(resolved) => self.aws.list_buckets(&resolved).await.map(|buckets| {
                        tracing::debug!(buckets = buckets.len(), "AWS credentials verified");
                    }),
                    Err(e) => Err(e),
                }
            }
        };

        outcome.map_err(|e| {
            tracing::warn!(
                provider = %e.provider,
                status = ?e.status,
                code = ?e.code,
                message = %e.message,
                "Live credential check failed"
            );
            AppError::from_connect_failure(e)
        })
    }
}

fn parse_kind(raw: &str) -> Result<IntegrationKind, AppError> {
    raw.parse::<IntegrationKind>().map_err(AppError::BadRequest)
}
