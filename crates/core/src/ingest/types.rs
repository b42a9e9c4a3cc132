use serde::Deserialize;
use serde_json::{Map, Value};

/// One quarterly report row as returned by the provider, field name to raw value.
pub type ReportRow = Map<String, Value>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BalanceSheetResponse {
    #[serde(default, rename = "quarterlyReports")]
    pub quarterly_reports: Vec<ReportRow>,

    #[serde(default, rename = "Error Message")]
    pub error_message: Option<String>,

    /// Rate-limit notice.
    #[serde(default, rename = "Note")]
    pub note: Option<String>,

    /// Premium-endpoint or invalid-key notice.
    #[serde(default, rename = "Information")]
    pub information: Option<String>,
}

impl BalanceSheetResponse {
    /// Provider-level rejection carried inside an HTTP 200 body, if any.
    pub fn rejection(&self) -> Option<&str> {
        self.error_message
            .as_deref()
            .or(self.note.as_deref())
            .or(self.information.as_deref())
    }
}
