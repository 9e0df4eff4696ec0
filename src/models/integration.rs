// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Integration model and request bodies.

use super::credentials::SubmittedCredentials;
use crate::registry::IntegrationKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle state of an integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntegrationStatus {
    /// Created without credentials, not yet verified
    Pending,
    Connected,
    /// The last live provider call failed
    Error,
    Revoked,
}

impl IntegrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationStatus::Pending => "PENDING",
            IntegrationStatus::Connected => "CONNECTED",
            IntegrationStatus::Error => "ERROR",
            IntegrationStatus::Revoked => "REVOKED",
        }
    }
}

impl fmt::Display for IntegrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntegrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(IntegrationStatus::Pending),
            "CONNECTED" => Ok(IntegrationStatus::Connected),
            "ERROR" => Ok(IntegrationStatus::Error),
            "REVOKED" => Ok(IntegrationStatus::Revoked),
            other => Err(format!("Unknown integration status: {}", other)),
        }
    }
}

/// Integration as returned by every listing and mutation. Never carries
/// credentials: those live in a separate table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Integration {
    pub id: Uuid,
    pub project_id: Uuid,
    pub integration_type: IntegrationKind,
    pub status: IntegrationStatus,
    pub display_name: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Body of `POST /projects/{id}/integrations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntegrationRequest {
    #[serde(default)]
    pub integration_type: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Body of `POST /projects/{id}/integrations/connect`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectIntegrationRequest {
    #[serde(default)]
    pub integration_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub credentials: SubmittedCredentials,
}

/// Body of `PUT /projects/{id}/integrations/update`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIntegrationRequest {
    #[serde(default)]
    pub integration_type: String,
    #[serde(default)]
    pub credentials: SubmittedCredentials,
}
