// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Vercel REST API client.
//!
//! Handles:
//! - Project lookup (also the live credential check on connect)
//! - Latest deployment, domains and environment variable keys
//! - Normalizing all of it into one summary shape

use crate::error::AppError;
use crate::models::CredentialBag;
use crate::services::provider::{Provider, ProviderError};
use crate::time_utils::millis_to_rfc3339;
use serde::{Deserialize, Serialize};

/// Token plus optional team scope, attached to every call.
#[derive(Debug, Clone)]
pub struct VercelAuth {
    pub token: String,
    pub team_id: Option<String>,
}

/// Credentials stored for a Vercel integration.
#[derive(Debug, Clone)]
pub struct VercelCredentials {
    pub auth: VercelAuth,
    pub project_name: String,
}

impl VercelCredentials {
    pub fn from_bag(bag: &CredentialBag) -> Result<Self, AppError> {
        let field = |key: &str| bag.get(key).filter(|v| !v.is_empty()).cloned();
        let token = field("apiToken").ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("Stored Vercel credentials lack apiToken"))
        })?;
        let project_name = field("projectName").ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("Stored Vercel credentials lack projectName"))
        })?;
        Ok(Self {
            auth: VercelAuth {
                token,
                team_id: field("teamId"),
            },
            project_name,
        })
    }
}

/// Vercel API client.
#[derive(Clone)]
pub struct VercelClient {
    http: reqwest::Client,
    base_url: String,
}

impl VercelClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Get a project by name or id.
    pub async fn get_project(
        &self,
        auth: &VercelAuth,
        name_or_id: &str,
    ) -> Result<VercelProject, ProviderError> {
        let path = format!("/v9/projects/{}", urlencoding::encode(name_or_id));
        self.get_json(&path, &[], auth).await
    }

    /// Most recent deployment of a project, if it has any.
    pub async fn latest_deployment(
        &self,
        auth: &VercelAuth,
        project_id: &str,
    ) -> Result<Option<VercelDeployment>, ProviderError> {
        let list: VercelDeploymentList = self
            .get_json(
                "/v6/deployments",
                &[("projectId", project_id), ("limit", "1")],
                auth,
            )
            .await?;
        Ok(list.deployments.into_iter().next())
    }

    pub async fn get_domains(
        &self,
        auth: &VercelAuth,
        project_id: &str,
    ) -> Result<Vec<VercelDomain>, ProviderError> {
        let path = format!("/v9/projects/{}/domains", urlencoding::encode(project_id));
        let list: VercelDomainList = self.get_json(&path, &[], auth).await?;
        Ok(list.domains)
    }

    /// Environment variable keys and targets. Values are never requested.
    pub async fn get_env_keys(
        &self,
        auth: &VercelAuth,
        project_id: &str,
    ) -> Result<Vec<EnvKey>, ProviderError> {
        let path = format!("/v10/projects/{}/env", urlencoding::encode(project_id));
        let list: VercelEnvList = self.get_json(&path, &[], auth).await?;
        Ok(list
            .envs
            .into_iter()
            .map(|e| EnvKey {
                key: e.key,
                target: e.target.map(EnvTarget::into_vec).unwrap_or_default(),
            })
            .collect())
    }

    /// Live summary of one project.
    pub async fn get_summary(
        &self,
        auth: &VercelAuth,
        name_or_id: &str,
    ) -> Result<VercelSummary, ProviderError> {
        let project = self.get_project(auth, name_or_id).await?;
        let (latest, domains, envs) = tokio::try_join!(
            self.latest_deployment(auth, &project.id),
            self.get_domains(auth, &project.id),
            self.get_env_keys(auth, &project.id),
        )?;

        tracing::debug!(
            project_id = %project.id,
            domains = domains.len(),
            has_deployment = latest.is_some(),
            "Fetched Vercel summary"
        );

        Ok(VercelSummary {
            project: ProjectInfo {
                repo: project.repo(),
                created_at: project.created_at.and_then(millis_to_rfc3339),
                id: project.id,
                name: project.name,
                framework: project.framework,
            },
            latest_deployment: latest.map(DeploymentInfo::from),
            domains: domains
                .into_iter()
                .map(|d| DomainInfo {
                    name: d.name,
                    verified: d.verified,
                    primary: d.primary,
                })
                .collect(),
            envs,
        })
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        auth: &VercelAuth,
    ) -> Result<T, ProviderError> {
        let mut request = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&auth.token)
            .query(query);
        if let Some(team_id) = &auth.team_id {
            request = request.query(&[("teamId", team_id)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::network(Provider::Vercel, &e))?;

        check_response_json(response).await
    }
}

/// Check response status and parse the JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<VercelErrorBody>(&body) {
            Ok(parsed) => (parsed.error.code, parsed.error.message),
            Err(_) => (None, body.chars().take(200).collect()),
        };

        if status.as_u16() == 429 {
            tracing::warn!("Vercel rate limit hit (429)");
        }
        return Err(ProviderError::from_status(
            Provider::Vercel,
            status.as_u16(),
            code,
            message,
        ));
    }

    response
        .json()
        .await
        .map_err(|e| ProviderError::malformed(Provider::Vercel, format!("JSON parse error: {}", e)))
}

// ─── Vercel API shapes ───────────────────────────────────────

#[derive(Debug, Deserialize)]
struct VercelErrorBody {
    error: VercelErrorDetail,
}

#[derive(Debug, Deserialize)]
struct VercelErrorDetail {
    code: Option<String>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VercelProject {
    pub id: String,
    pub name: String,
    pub framework: Option<String>,
    /// Epoch milliseconds
    pub created_at: Option<i64>,
    pub link: Option<VercelLink>,
}

impl VercelProject {
    /// `owner/repo` of the linked Git repository.
    pub fn repo(&self) -> Option<String> {
        let link = self.link.as_ref()?;
        match (&link.org, &link.repo) {
            (Some(org), Some(repo)) => Some(format!("{}/{}", org, repo)),
            (None, Some(repo)) => Some(repo.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VercelLink {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub org: Option<String>,
    pub repo: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VercelDeploymentList {
    #[serde(default)]
    deployments: Vec<VercelDeployment>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VercelDeployment {
    /// List endpoints call the id `uid`
    pub uid: Option<String>,
    pub id: Option<String>,
    pub url: Option<String>,
    pub state: Option<String>,
    pub ready_state: Option<String>,
    pub target: Option<String>,
    /// Epoch milliseconds; list endpoints call it `created`
    pub created: Option<i64>,
    pub created_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct VercelDomainList {
    #[serde(default)]
    domains: Vec<VercelDomain>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VercelDomain {
    pub name: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub primary: bool,
}

#[derive(Debug, Deserialize)]
struct VercelEnvList {
    #[serde(default)]
    envs: Vec<VercelEnv>,
}

#[derive(Debug, Deserialize)]
struct VercelEnv {
    key: String,
    target: Option<EnvTarget>,
}

/// Vercel sends `target` as a list, or as a bare string for a single target.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EnvTarget {
    One(String),
    Many(Vec<String>),
}

impl EnvTarget {
    fn into_vec(self) -> Vec<String> {
        match self {
            EnvTarget::One(target) => vec![target],
            EnvTarget::Many(targets) => targets,
        }
    }
}

// ─── Summary shape ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VercelSummary {
    pub project: ProjectInfo,
    pub latest_deployment: Option<DeploymentInfo>,
    pub domains: Vec<DomainInfo>,
    pub envs: Vec<EnvKey>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    pub id: String,
    pub name: String,
    pub framework: Option<String>,
    pub repo: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentInfo {
    pub id: String,
    pub url: Option<String>,
    pub state: Option<String>,
    pub target: Option<String>,
    pub created_at: Option<String>,
}

impl From<VercelDeployment> for DeploymentInfo {
    fn from(d: VercelDeployment) -> Self {
        Self {
            id: d.uid.or(d.id).unwrap_or_default(),
            url: d.url,
            state: d.state.or(d.ready_state),
            target: d.target,
            created_at: d.created_at.or(d.created).and_then(millis_to_rfc3339),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainInfo {
    pub name: String,
    pub verified: bool,
    pub primary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvKey {
    pub key: String,
    pub target: Vec<String>,
}
