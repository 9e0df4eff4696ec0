// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! S3 bucket listing and storage totals.

use super::{parse_xml, AwsClient, AwsCredentials};
use crate::services::provider::ProviderError;
use crate::time_utils::normalize_timestamp;
use futures_util::stream::{self, StreamExt};
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Buckets inspected at once.
const BUCKET_CONCURRENCY: usize = 8;
const MAX_KEYS: &str = "1000";
const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3BucketInfo {
    pub name: String,
    pub creation_date: String,
    pub object_count: u64,
    pub size_bytes: u64,
    pub region: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Metrics {
    pub total_buckets: usize,
    pub total_objects: u64,
    #[serde(rename = "totalStorageGB")]
    pub total_storage_gb: f64,
    pub buckets: Vec<S3BucketInfo>,
}

impl S3Metrics {
    pub fn from_buckets(buckets: Vec<S3BucketInfo>) -> Self {
        let total_objects = buckets.iter().map(|b| b.object_count).sum();
        let total_bytes: u64 = buckets.iter().map(|b| b.size_bytes).sum();
        Self {
            total_buckets: buckets.len(),
            total_objects,
            total_storage_gb: total_bytes as f64 / BYTES_PER_GB,
            buckets,
        }
    }
}

// ─── XML shapes ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ListAllMyBucketsResult {
    #[serde(rename = "Buckets", default)]
    buckets: BucketList,
}

#[derive(Debug, Default, Deserialize)]
struct BucketList {
    #[serde(rename = "Bucket", default)]
    bucket: Vec<BucketEntry>,
}

#[derive(Debug, Deserialize)]
struct BucketEntry {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "CreationDate", default)]
    creation_date: String,
}

#[derive(Debug, Deserialize)]
struct ListBucketResult {
    #[serde(rename = "KeyCount")]
    key_count: Option<u64>,
    #[serde(rename = "Contents", default)]
    contents: Vec<ObjectEntry>,
}

#[derive(Debug, Deserialize)]
struct ObjectEntry {
    #[serde(rename = "Size", default)]
    size: u64,
}

impl AwsClient {
    /// `ListBuckets`. Also serves as the live credential check on connect.
    pub async fn list_buckets(&self, creds: &AwsCredentials) -> Result<Vec<String>, ProviderError> {
        Ok(self
            .list_bucket_entries(creds)
            .await?
            .into_iter()
            .map(|b| b.name)
            .collect())
    }

    async fn list_bucket_entries(
        &self,
        creds: &AwsCredentials,
    ) -> Result<Vec<BucketEntry>, ProviderError> {
        let text = self.send("s3", creds, Method::GET, "/", &[], None).await?;
        let parsed: ListAllMyBucketsResult = parse_xml(&text)?;
        Ok(parsed.buckets.bucket)
    }

    /// Every bucket with its object count and size from the first page of keys.
    pub async fn get_buckets(
        &self,
        creds: &AwsCredentials,
    ) -> Result<Vec<S3BucketInfo>, ProviderError> {
        let creds = self.resolve_credentials(creds).await?;
        let entries = self.list_bucket_entries(&creds).await?;

        let buckets = stream::iter(entries)
            .map(|entry| {
                let creds = &creds;
                async move {
                    let (object_count, size_bytes) = match self.bucket_usage(creds, &entry.name).await
                    {
                        Ok(usage) => usage,
                        Err(e) => {
                            tracing::warn!(bucket = %entry.name, error = %e, "Could not list bucket objects");
                            (0, 0)
                        }
                    };
                    S3BucketInfo {
                        creation_date: normalize_timestamp(&entry.creation_date),
                        name: entry.name,
                        object_count,
                        size_bytes,
                        region: creds.region.clone(),
                    }
                }
            })
            .buffered(BUCKET_CONCURRENCY)
            .collect::<Vec<_>>()
            .await;

        tracing::debug!(buckets = buckets.len(), "Fetched S3 buckets");
        Ok(buckets)
    }

    pub async fn get_s3_metrics(&self, creds: &AwsCredentials) -> Result<S3Metrics, ProviderError> {
        Ok(S3Metrics::from_buckets(self.get_buckets(creds).await?))
    }

    /// `(objects, bytes)` from one `ListObjectsV2` page.
    async fn bucket_usage(
        &self,
        creds: &AwsCredentials,
        bucket: &str,
    ) -> Result<(u64, u64), ProviderError> {
        let path = format!("/{}", urlencoding::encode(bucket));
        let text = self
            .send(
                "s3",
                creds,
                Method::GET,
                &path,
                &[("list-type", "2"), ("max-keys", MAX_KEYS)],
                None,
            )
            .await?;
        let parsed: ListBucketResult = parse_xml(&text)?;
        let size = parsed.contents.iter().map(|o| o.size).sum();
        let count = parsed
            .key_count
            .unwrap_or(parsed.contents.len() as u64);
        Ok((count, size))
    }
}
