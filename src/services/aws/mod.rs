// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! AWS client for the S3, RDS, CloudWatch and STS calls the dashboard needs.
//!
//! Requests are SigV4-signed by hand and sent with the shared reqwest client.
//! S3 speaks REST+XML, the others the Query protocol (form POST, XML reply).

pub mod rds;
pub mod s3;
pub mod sigv4;
pub mod sts;

use crate::error::AppError;
use crate::models::CredentialBag;
use crate::services::provider::{Provider, ProviderError};
use chrono::Utc;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub use rds::{MetricDataPoint, RdsInstanceInfo, RdsMetrics};
pub use s3::{S3BucketInfo, S3Metrics};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// Credentials stored for an AWS integration (or issued by STS).
#[derive(Debug, Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    pub region: String,
    pub role_arn: Option<String>,
}

impl AwsCredentials {
    pub fn from_bag(bag: &CredentialBag) -> Result<Self, AppError> {
        let field = |key: &str| bag.get(key).filter(|v| !v.is_empty()).cloned();
        let required = |key: &'static str| {
            field(key).ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("Stored AWS credentials lack {}", key))
            })
        };
        Ok(Self {
            access_key_id: required("accessKeyId")?,
            secret_access_key: required("secretAccessKey")?,
            session_token: None,
            region: required("region")?,
            role_arn: field("roleArn"),
        })
    }
}

/// AWS API client.
#[derive(Clone)]
pub struct AwsClient {
    http: reqwest::Client,
    /// Send every service to this base URL instead of the AWS endpoints.
    endpoint_override: Option<String>,
}

impl AwsClient {
    pub fn new(http: reqwest::Client, endpoint_override: Option<String>) -> Self {
        Self {
            http,
            endpoint_override: endpoint_override.map(|e| e.trim_end_matches('/').to_string()),
        }
    }

    fn endpoint(&self, service: &str, region: &str) -> String {
        if let Some(base) = &self.endpoint_override {
            return base.clone();
        }
        match (service, region) {
            ("s3", "us-east-1") => "https://s3.amazonaws.com".to_string(),
            _ => format!("https://{}.{}.amazonaws.com", service, region),
        }
    }

    /// Credentials to sign data calls with: the stored keys, or temporary
    /// ones from `AssumeRole` when a role ARN is configured.
    pub async fn resolve_credentials(
        &self,
        creds: &AwsCredentials,
    ) -> Result<AwsCredentials, ProviderError> {
        match &creds.role_arn {
            Some(role_arn) => self.assume_role(creds, role_arn).await,
            None => Ok(creds.clone()),
        }
    }

    /// Sign and send one request, returning the body of a 2xx response.
    async fn send(
        &self,
        service: &str,
        creds: &AwsCredentials,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        form_body: Option<String>,
    ) -> Result<String, ProviderError> {
        let base = self.endpoint(service, &creds.region);
        let mut url = Url::parse(&format!("{}{}", base, path)).map_err(|e| {
            ProviderError::malformed(Provider::Aws, format!("Invalid AWS endpoint: {}", e))
        })?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        let body = form_body.unwrap_or_default();
        let payload_hash = sigv4::sha256_hex(body.as_bytes());
        let now = Utc::now();
        let params = sigv4::SigningParams {
            access_key_id: &creds.access_key_id,
            secret_access_key: &creds.secret_access_key,
            region: &creds.region,
            service,
            time: now,
        };

        let mut headers = vec![
            ("host".to_string(), sigv4::host_header(&url)),
            ("x-amz-content-sha256".to_string(), payload_hash.clone()),
            ("x-amz-date".to_string(), params.amz_date()),
        ];
        if method == Method::POST {
            headers.push(("content-type".to_string(), FORM_CONTENT_TYPE.to_string()));
        }
        if let Some(token) = &creds.session_token {
            headers.push(("x-amz-security-token".to_string(), token.clone()));
        }
        let authorization =
            sigv4::authorization(&params, method.as_str(), &url, &headers, &payload_hash);

        let mut request = self
            .http
            .request(method, url)
            .header(reqwest::header::AUTHORIZATION, authorization);
        for (name, value) in headers.iter().filter(|(name, _)| name != "host") {
            request = request.header(name.as_str(), value.as_str());
        }
        if !body.is_empty() {
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::network(Provider::Aws, &e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::network(Provider::Aws, &e))?;

        if !status.is_success() {
            let (code, message) = parse_error(&text);
            tracing::debug!(
                service,
                status = status.as_u16(),
                code = ?code,
                "AWS call failed"
            );
            return Err(ProviderError::from_status(
                Provider::Aws,
                status.as_u16(),
                code,
                message,
            ));
        }

        Ok(text)
    }

    /// Call a Query-protocol action (RDS, CloudWatch, STS).
    async fn query_action<T: DeserializeOwned>(
        &self,
        service: &str,
        creds: &AwsCredentials,
        action: &str,
        version: &str,
        params: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let mut form = format!(
            "Action={}&Version={}",
            urlencoding::encode(action),
            urlencoding::encode(version)
        );
        for (key, value) in params {
            form.push('&');
            form.push_str(&urlencoding::encode(key));
            form.push('=');
            form.push_str(&urlencoding::encode(value));
        }

        let text = self
            .send(service, creds, Method::POST, "/", &[], Some(form))
            .await?;
        parse_xml(&text)
    }
}

/// Deserialize an XML reply, treating a shape mismatch as an upstream error.
fn parse_xml<T: DeserializeOwned>(text: &str) -> Result<T, ProviderError> {
    quick_xml::de::from_str(text)
        .map_err(|e| ProviderError::malformed(Provider::Aws, format!("XML parse error: {}", e)))
}

/// Error body of both dialects:
/// `<ErrorResponse><Error><Code/>...` (Query) and `<Error><Code/>...` (S3).
#[derive(Debug, Default, Deserialize)]
struct AwsErrorXml {
    #[serde(rename = "Code")]
    code: Option<String>,
    #[serde(rename = "Message")]
    message: Option<String>,
    #[serde(rename = "Error")]
    error: Option<Box<AwsErrorXml>>,
}

fn parse_error(text: &str) -> (Option<String>, String) {
    let parsed: AwsErrorXml = quick_xml::de::from_str(text).unwrap_or_default();
    let (code, message) = match parsed.error {
        Some(inner) => (inner.code, inner.message),
        None => (parsed.code, parsed.message),
    };
    (code, message.unwrap_or_default())
}
