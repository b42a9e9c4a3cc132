use crate::coerce::to_float;
use crate::domain::balance_sheet::{BalanceSheetRecord, OptionalMetric};
use crate::ingest::types::ReportRow;
use anyhow::Result;
use chrono::NaiveDate;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;

const FISCAL_DATE_KEY: &str = "fiscalDateEnding";

#[async_trait::async_trait]
pub trait BalanceSheetSource: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Quarterly balance-sheet rows for `symbol`, in whatever order the provider returns them.
    async fn fetch_quarterly_reports(&self, symbol: &str) -> Result<Vec<ReportRow>>;
}

/// Fetches and normalizes the most recent quarterly balance sheet.
///
/// Returns `None` when the provider has no rows for the symbol or the call
/// fails; failures are logged here and never reach the caller.
pub async fn fetch_balance_sheet(
    source: &dyn BalanceSheetSource,
    symbol: &str,
) -> Option<BalanceSheetRecord> {
    let rows = match source.fetch_quarterly_reports(symbol).await {
        Ok(rows) => rows,
        Err(err) => {
            tracing::warn!(
                symbol,
                provider = source.provider_name(),
                error = %format!("{err:#}"),
                "balance sheet fetch failed"
            );
            return None;
        }
    };

    let Some(row) = most_recent_row(&rows) else {
        tracing::info!(
            symbol,
            provider = source.provider_name(),
            "provider returned no quarterly reports"
        );
        return None;
    };

    let record = record_from_row(row);
    tracing::debug!(symbol, report_date = %record.report_date, rows = rows.len(), "selected balance sheet row");
    Some(record)
}

/// Latest row by `fiscalDateEnding`. Rows with a missing or unparsable date rank last.
pub fn most_recent_row(rows: &[ReportRow]) -> Option<&ReportRow> {
    let mut ordered: Vec<&ReportRow> = rows.iter().collect();
    // Stable sort keeps provider order among equal dates.
    ordered.sort_by(|a, b| match (fiscal_date(a), fiscal_date(b)) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    ordered.into_iter().next()
}

pub fn record_from_row(row: &ReportRow) -> BalanceSheetRecord {
    let num = |key: &str| to_float(row.get(key));

    let mut additional_metrics = BTreeMap::new();
    for metric in OptionalMetric::ALL {
        if let Some(v) = row.get(metric.source_key()) {
            additional_metrics.insert(metric.key().to_string(), to_float(Some(v)));
        }
    }

    BalanceSheetRecord {
        report_date: text_field(row, FISCAL_DATE_KEY),
        total_assets: num("totalAssets"),
        current_assets: num("totalCurrentAssets"),
        total_liabilities: num("totalLiabilities"),
        current_liabilities: num("totalCurrentLiabilities"),
        total_shareholder_equity: num("totalShareholderEquity"),
        retained_earnings: num("retainedEarnings"),
        short_long_term_debt_total: num("shortLongTermDebtTotal"),
        cash_and_cash_equivalents: num("cashAndCashEquivalentsAtCarryingValue"),
        additional_metrics,
    }
}

fn text_field(row: &ReportRow, key: &str) -> String {
    match row.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn fiscal_date(row: &ReportRow) -> Option<NaiveDate> {
    let s = row.get(FISCAL_DATE_KEY)?.as_str()?;
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}
