use crate::config::Settings;
use crate::ingest::provider::BalanceSheetSource;
use crate::ingest::types::{BalanceSheetResponse, ReportRow};
use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const BALANCE_SHEET_FUNCTION: &str = "BALANCE_SHEET";

#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl AlphaVantageClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.alphavantage_api_key.clone();
        let base_url = std::env::var("ALPHAVANTAGE_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = std::env::var("ALPHAVANTAGE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build Alpha Vantage http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    fn url(&self) -> String {
        format!("{}/query", self.base_url.trim_end_matches('/'))
    }

    fn query<'a>(&'a self, symbol: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut params = vec![("function", BALANCE_SHEET_FUNCTION), ("symbol", symbol)];
        if let Some(api_key) = &self.api_key {
            params.push(("apikey", api_key.as_str()));
        }
        params
    }
}

#[async_trait::async_trait]
impl BalanceSheetSource for AlphaVantageClient {
    fn provider_name(&self) -> &'static str {
        "alpha_vantage"
    }

    async fn fetch_quarterly_reports(&self, symbol: &str) -> Result<Vec<ReportRow>> {
        let res = self
            .http
            .get(self.url())
            .query(&self.query(symbol))
            .send()
            .await
            .context("Alpha Vantage request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Alpha Vantage response")?;

        if !status.is_success() {
            anyhow::bail!("Alpha Vantage HTTP {status}: {text}");
        }

        parse_balance_sheet_body(&text)
    }
}

/// Decodes a `BALANCE_SHEET` body into its quarterly rows.
///
/// Alpha Vantage reports rejections (unknown symbol, rate limit, bad key) as
/// HTTP 200 with a single message key; those become errors. An empty object
/// or a body without `quarterlyReports` yields no rows.
pub fn parse_balance_sheet_body(text: &str) -> Result<Vec<ReportRow>> {
    let raw_json = serde_json::from_str::<Value>(text)
        .with_context(|| format!("Alpha Vantage response is not valid JSON: {text}"))?;
    let parsed = serde_json::from_value::<BalanceSheetResponse>(raw_json)
        .context("failed to parse Alpha Vantage response into BalanceSheetResponse")?;

    if let Some(message) = parsed.rejection() {
        anyhow::bail!("Alpha Vantage rejected request: {message}");
    }

    Ok(parsed.quarterly_reports)
}
