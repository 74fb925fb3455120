//! HTTP client for the external seller ads platform.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use engine_core::{Campaign, DailyAggregate, DateRange, Error, Result};
use telemetry::metrics;

use crate::config::PlatformConfig;
use crate::payload::{normalize_campaigns, RawCampaignList, RawReport, ReportPayload};

/// Boundary to the external ad platform's reporting and campaign-listing
/// endpoints. Implementations authenticate with per-account session cookies
/// and hand back normalized records only.
#[async_trait]
pub trait AdsPlatform: Send + Sync {
    /// Fetch the account's metrics for the full range, at whatever
    /// granularity the platform provides.
    async fn fetch_range(
        &self,
        credential: &str,
        account_id: &str,
        range: DateRange,
    ) -> Result<ReportPayload>;

    /// Fetch one day. `None` means the platform reported no activity.
    async fn fetch_day(
        &self,
        credential: &str,
        account_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyAggregate>>;

    /// List the account's campaigns with their rolling totals for the range.
    async fn fetch_campaigns(&self, credential: &str, range: DateRange) -> Result<Vec<Campaign>>;
}

/// Concrete reqwest-backed platform client.
pub struct PlatformClient {
    http: reqwest::Client,
    config: PlatformConfig,
}

impl PlatformClient {
    pub fn new(config: PlatformConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Issue one authenticated GET and decode the JSON body.
    ///
    /// 401/403 mean the session cookie itself was rejected; everything else
    /// non-2xx is a transient platform failure.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        credential: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let start = std::time::Instant::now();
        metrics().platform_calls.inc();

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::COOKIE, credential)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                metrics().platform_call_errors.inc();
                Error::external(format!("Request to {} failed: {}", path, e))
            })?;

        metrics()
            .platform_call_latency_ms
            .observe(start.elapsed().as_millis() as u64);

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            metrics().platform_call_errors.inc();
            metrics().credential_rejections.inc();
            return Err(Error::credential_rejected(format!(
                "Platform rejected session cookie ({})",
                status
            )));
        }
        if !status.is_success() {
            metrics().platform_call_errors.inc();
            return Err(Error::external(format!(
                "Platform returned {} for {}",
                status, path
            )));
        }

        response.json::<T>().await.map_err(|e| {
            metrics().platform_call_errors.inc();
            Error::external(format!("Malformed payload from {}: {}", path, e))
        })
    }
}

#[async_trait]
impl AdsPlatform for PlatformClient {
    async fn fetch_range(
        &self,
        credential: &str,
        account_id: &str,
        range: DateRange,
    ) -> Result<ReportPayload> {
        let query = [
            ("start_date", range.start().to_string()),
            ("end_date", range.end().to_string()),
            ("granularity", "day".to_string()),
        ];

        let raw: RawReport = self
            .get_json("/api/v1/ads/report", credential, &query)
            .await?;

        let payload = raw.resolve(account_id);
        debug!(account_id = account_id, range = %range, "Fetched report range");
        Ok(payload)
    }

    async fn fetch_day(
        &self,
        credential: &str,
        account_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyAggregate>> {
        let payload = self
            .fetch_range(credential, account_id, DateRange::single(date))
            .await?;

        Ok(payload.day(account_id, date))
    }

    async fn fetch_campaigns(&self, credential: &str, range: DateRange) -> Result<Vec<Campaign>> {
        let query = [
            ("start_date", range.start().to_string()),
            ("end_date", range.end().to_string()),
        ];

        let raw: RawCampaignList = self
            .get_json("/api/v1/ads/campaigns", credential, &query)
            .await?;

        let campaigns = normalize_campaigns(raw);
        debug!(count = campaigns.len(), range = %range, "Fetched campaign listing");
        Ok(campaigns)
    }
}
