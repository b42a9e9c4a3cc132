use serde::Serialize;
use std::collections::BTreeMap;

/// Normalized snapshot of the most recent quarterly balance sheet.
///
/// Every numeric field is finite; missing or malformed source values are
/// stored as `0.0`. Optional income-statement style metrics live in
/// `additional_metrics`, keyed by [`OptionalMetric::key`], and are flattened
/// into the JSON form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceSheetRecord {
    pub report_date: String,
    pub total_assets: f64,
    pub current_assets: f64,
    pub total_liabilities: f64,
    pub current_liabilities: f64,
    pub total_shareholder_equity: f64,
    pub retained_earnings: f64,
    pub short_long_term_debt_total: f64,
    pub cash_and_cash_equivalents: f64,

    #[serde(flatten)]
    pub additional_metrics: BTreeMap<String, f64>,
}

impl BalanceSheetRecord {
    /// Required numeric fields in display order, paired with their labels.
    pub fn required_fields(&self) -> [(&'static str, f64); 8] {
        [
            ("Total Assets", self.total_assets),
            ("Current Assets", self.current_assets),
            ("Total Liabilities", self.total_liabilities),
            ("Current Liabilities", self.current_liabilities),
            ("Total Shareholder Equity", self.total_shareholder_equity),
            ("Retained Earnings", self.retained_earnings),
            ("Short/Long Term Debt Total", self.short_long_term_debt_total),
            ("Cash And Cash Equivalents", self.cash_and_cash_equivalents),
        ]
    }

    pub fn metric(&self, metric: OptionalMetric) -> Option<f64> {
        self.additional_metrics.get(metric.key()).copied()
    }

    /// Optional metrics present on this record, in catalogue order.
    pub fn present_metrics(&self) -> impl Iterator<Item = (OptionalMetric, f64)> + '_ {
        OptionalMetric::ALL
            .into_iter()
            .filter_map(|m| self.metric(m).map(|v| (m, v)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionalMetric {
    TotalRevenue,
    GrossProfit,
    OperatingIncome,
    NetIncome,
}

impl OptionalMetric {
    pub const ALL: [Self; 4] = [
        Self::TotalRevenue,
        Self::GrossProfit,
        Self::OperatingIncome,
        Self::NetIncome,
    ];

    /// Key used on [`BalanceSheetRecord`].
    pub fn key(self) -> &'static str {
        match self {
            Self::TotalRevenue => "total_revenue",
            Self::GrossProfit => "gross_profit",
            Self::OperatingIncome => "operating_income",
            Self::NetIncome => "net_income",
        }
    }

    /// Field name in the provider's report row.
    pub fn source_key(self) -> &'static str {
        match self {
            Self::TotalRevenue => "totalRevenue",
            Self::GrossProfit => "grossProfit",
            Self::OperatingIncome => "operatingIncome",
            Self::NetIncome => "netIncome",
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_record() -> BalanceSheetRecord {
    BalanceSheetRecord {
        report_date: "2024-03-31".to_string(),
        total_assets: 1000.0,
        current_assets: 200.0,
        total_liabilities: 300.0,
        current_liabilities: 100.0,
        total_shareholder_equity: 150.0,
        retained_earnings: 75.0,
        short_long_term_debt_total: 60.0,
        cash_and_cash_equivalents: 50.0,
        additional_metrics: BTreeMap::new(),
    }
}
