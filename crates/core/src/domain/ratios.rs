use crate::domain::balance_sheet::BalanceSheetRecord;
use serde::{Serialize, Serializer};

/// Liquidity and solvency ratios derived from one balance sheet.
///
/// Zero denominators are not special-cased: the affected ratio is infinite or
/// NaN. In serialized form such values are written as the strings `"inf"`,
/// `"-inf"` or `"NaN"` rather than collapsing to `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatioSet {
    #[serde(serialize_with = "serialize_ratio")]
    pub current_ratio: f64,
    #[serde(serialize_with = "serialize_ratio")]
    pub cash_ratio: f64,
    #[serde(serialize_with = "serialize_ratio")]
    pub debt_index: f64,
    #[serde(serialize_with = "serialize_ratio")]
    pub debt_equity: f64,
}

impl RatioSet {
    pub fn all_finite(&self) -> bool {
        [
            self.current_ratio,
            self.cash_ratio,
            self.debt_index,
            self.debt_equity,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

pub fn calculate_ratios(record: &BalanceSheetRecord) -> RatioSet {
    RatioSet {
        current_ratio: record.current_assets / record.current_liabilities,
        cash_ratio: record.cash_and_cash_equivalents / record.current_liabilities,
        debt_index: record.total_liabilities / record.total_shareholder_equity,
        debt_equity: record.short_long_term_debt_total / record.total_shareholder_equity,
    }
}

fn serialize_ratio<S: Serializer>(v: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if v.is_finite() {
        serializer.serialize_f64(*v)
    } else {
        serializer.serialize_str(&v.to_string())
    }
}
