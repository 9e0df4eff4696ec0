// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! RDS instances and their CloudWatch metrics.

use super::{AwsClient, AwsCredentials};
use crate::services::provider::ProviderError;
use crate::time_utils::{format_utc_rfc3339, normalize_timestamp};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

const RDS_VERSION: &str = "2014-10-31";
const CLOUDWATCH_VERSION: &str = "2010-08-01";
const METRIC_WINDOW_HOURS: i64 = 24;
const METRIC_PERIOD_SECS: &str = "3600";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RdsInstanceInfo {
    pub instance_id: String,
    pub instance_class: String,
    /// Engine name and version, e.g. `postgres 16.3`
    pub engine: String,
    pub status: String,
    #[serde(rename = "storageGB")]
    pub storage_gb: u32,
    pub multi_az: bool,
    pub availability_zone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDataPoint {
    pub timestamp: String,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RdsMetrics {
    pub total_databases: usize,
    pub active_connections: u64,
    #[serde(rename = "storageUsedGB")]
    pub storage_used_gb: u64,
    pub avg_cpu_utilization: f64,
    pub cpu_data: Vec<MetricDataPoint>,
    pub connections_data: Vec<MetricDataPoint>,
    pub read_iops_data: Vec<MetricDataPoint>,
    pub write_iops_data: Vec<MetricDataPoint>,
}

impl RdsMetrics {
    fn empty() -> Self {
        Self {
            total_databases: 0,
            active_connections: 0,
            storage_used_gb: 0,
            avg_cpu_utilization: 0.0,
            cpu_data: Vec::new(),
            connections_data: Vec::new(),
            read_iops_data: Vec::new(),
            write_iops_data: Vec::new(),
        }
    }
}

// ─── XML shapes ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct DescribeDbInstancesResponse {
    #[serde(rename = "DescribeDBInstancesResult")]
    result: DescribeDbInstancesResult,
}

#[derive(Debug, Deserialize)]
struct DescribeDbInstancesResult {
    #[serde(rename = "DBInstances", default)]
    instances: DbInstanceList,
}

#[derive(Debug, Default, Deserialize)]
struct DbInstanceList {
    #[serde(rename = "DBInstance", default)]
    items: Vec<DbInstance>,
}

#[derive(Debug, Deserialize)]
struct DbInstance {
    #[serde(rename = "DBInstanceIdentifier")]
    identifier: String,
    #[serde(rename = "DBInstanceClass", default)]
    class: String,
    #[serde(rename = "Engine", default)]
    engine: String,
    #[serde(rename = "EngineVersion", default)]
    engine_version: String,
    #[serde(rename = "DBInstanceStatus", default)]
    status: String,
    #[serde(rename = "AllocatedStorage", default)]
    allocated_storage: u32,
    #[serde(rename = "MultiAZ", default)]
    multi_az: bool,
    #[serde(rename = "AvailabilityZone")]
    availability_zone: Option<String>,
}

impl From<DbInstance> for RdsInstanceInfo {
    fn from(db: DbInstance) -> Self {
        Self {
            instance_id: db.identifier,
            instance_class: db.class,
            engine: format!("{} {}", db.engine, db.engine_version)
                .trim()
                .to_string(),
            status: db.status,
            storage_gb: db.allocated_storage,
            multi_az: db.multi_az,
            availability_zone: db.availability_zone,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GetMetricStatisticsResponse {
    #[serde(rename = "GetMetricStatisticsResult")]
    result: GetMetricStatisticsResult,
}

#[derive(Debug, Deserialize)]
struct GetMetricStatisticsResult {
    #[serde(rename = "Datapoints", default)]
    datapoints: DatapointList,
}

#[derive(Debug, Default, Deserialize)]
struct DatapointList {
    #[serde(rename = "member", default)]
    members: Vec<Datapoint>,
}

#[derive(Debug, Deserialize)]
struct Datapoint {
    #[serde(rename = "Timestamp")]
    timestamp: String,
    #[serde(rename = "Average", default)]
    average: f64,
}

/// Normalize and order datapoints oldest first.
fn to_series(datapoints: Vec<Datapoint>) -> Vec<MetricDataPoint> {
    let mut series: Vec<MetricDataPoint> = datapoints
        .into_iter()
        .map(|dp| MetricDataPoint {
            timestamp: normalize_timestamp(&dp.timestamp),
            value: dp.average,
        })
        .collect();
    series.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    series
}

fn summarize(
    instances: &[RdsInstanceInfo],
    cpu_data: Vec<MetricDataPoint>,
    connections_data: Vec<MetricDataPoint>,
    read_iops_data: Vec<MetricDataPoint>,
    write_iops_data: Vec<MetricDataPoint>,
) -> RdsMetrics {
    let avg_cpu_utilization = if cpu_data.is_empty() {
        0.0
    } else {
        cpu_data.iter().map(|dp| dp.value).sum::<f64>() / cpu_data.len() as f64
    };
    // Latest sample, not an average
    let active_connections = connections_data
        .last()
        .map(|dp| dp.value.max(0.0) as u64)
        .unwrap_or(0);

    RdsMetrics {
        total_databases: instances.len(),
        active_connections,
        storage_used_gb: instances.iter().map(|i| u64::from(i.storage_gb)).sum(),
        avg_cpu_utilization,
        cpu_data,
        connections_data,
        read_iops_data,
        write_iops_data,
    }
}

impl AwsClient {
    pub async fn get_rds_instances(
        &self,
        creds: &AwsCredentials,
    ) -> Result<Vec<RdsInstanceInfo>, ProviderError> {
        let creds = self.resolve_credentials(creds).await?;
        self.describe_db_instances(&creds).await
    }

    /// Aggregates over all instances plus 24 h of hourly series for the first.
    pub async fn get_rds_metrics(&self, creds: &AwsCredentials) -> Result<RdsMetrics, ProviderError> {
        let creds = self.resolve_credentials(creds).await?;
        let instances = self.describe_db_instances(&creds).await?;
        let Some(first) = instances.first() else {
            return Ok(RdsMetrics::empty());
        };

        let id = first.instance_id.as_str();
        let (cpu, connections, read_iops, write_iops) = tokio::try_join!(
            self.metric_series(&creds, id, "CPUUtilization"),
            self.metric_series(&creds, id, "DatabaseConnections"),
            self.metric_series(&creds, id, "ReadIOPS"),
            self.metric_series(&creds, id, "WriteIOPS"),
        )?;

        tracing::debug!(
            instances = instances.len(),
            cpu_points = cpu.len(),
            "Fetched RDS metrics"
        );
        Ok(summarize(&instances, cpu, connections, read_iops, write_iops))
    }

    async fn describe_db_instances(
        &self,
        creds: &AwsCredentials,
    ) -> Result<Vec<RdsInstanceInfo>, ProviderError> {
        let response: DescribeDbInstancesResponse = self
            .query_action("rds", creds, "DescribeDBInstances", RDS_VERSION, &[])
            .await?;
        Ok(response
            .result
            .instances
            .items
            .into_iter()
            .map(RdsInstanceInfo::from)
            .collect())
    }

    /// `GetMetricStatistics` for one `AWS/RDS` metric of one instance.
    async fn metric_series(
        &self,
        creds: &AwsCredentials,
        instance_id: &str,
        metric: &str,
    ) -> Result<Vec<MetricDataPoint>, ProviderError> {
        let end = Utc::now();
        let start = end - Duration::hours(METRIC_WINDOW_HOURS);
        let response: GetMetricStatisticsResponse = self
            .query_action(
                "monitoring",
                creds,
                "GetMetricStatistics",
                CLOUDWATCH_VERSION,
                &[
                    ("Namespace", "AWS/RDS".to_string()),
                    ("MetricName", metric.to_string()),
                    ("Dimensions.member.1.Name", "DBInstanceIdentifier".to_string()),
                    ("Dimensions.member.1.Value", instance_id.to_string()),
                    ("StartTime", format_utc_rfc3339(start)),
                    ("EndTime", format_utc_rfc3339(end)),
                    ("Period", METRIC_PERIOD_SECS.to_string()),
                    ("Statistics.member.1", "Average".to_string()),
                ],
            )
            .await?;
        Ok(to_series(response.result.datapoints.members))
    }
}
