// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! STS `AssumeRole` for integrations configured with a role ARN.

use super::{AwsClient, AwsCredentials};
use crate::services::provider::ProviderError;
use serde::Deserialize;

const STS_VERSION: &str = "2011-06-15";
const SESSION_DURATION_SECS: u32 = 900;

#[derive(Debug, Deserialize)]
struct AssumeRoleResponse {
    #[serde(rename = "AssumeRoleResult")]
    result: AssumeRoleResult,
}

#[derive(Debug, Deserialize)]
struct AssumeRoleResult {
    #[serde(rename = "Credentials")]
    credentials: StsCredentials,
}

#[derive(Debug, Deserialize)]
struct StsCredentials {
    #[serde(rename = "AccessKeyId")]
    access_key_id: String,
    #[serde(rename = "SecretAccessKey")]
    secret_access_key: String,
    #[serde(rename = "SessionToken")]
    session_token: String,
}

impl AwsClient {
    /// Exchange the stored keys for short-lived role credentials.
    pub(super) async fn assume_role(
        &self,
        creds: &AwsCredentials,
        role_arn: &str,
    ) -> Result<AwsCredentials, ProviderError> {
        let session_name = format!("threadspace-{}", chrono::Utc::now().timestamp_millis());
        let response: AssumeRoleResponse = self
            .query_action(
                "sts",
                creds,
                "AssumeRole",
                STS_VERSION,
                &[
                    ("RoleArn", role_arn.to_string()),
                    ("RoleSessionName", session_name),
                    ("DurationSeconds", SESSION_DURATION_SECS.to_string()),
                ],
            )
            .await?;

        tracing::debug!(role_arn, "Assumed AWS role");

        let issued = response.result.credentials;
        Ok(AwsCredentials {
            access_key_id: issued.access_key_id,
            secret_access_key: issued.secret_access_key,
            session_token: Some(issued.session_token),
            region: creds.region.clone(),
            role_arn: None,
        })
    }
}
