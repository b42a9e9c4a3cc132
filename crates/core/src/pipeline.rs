use crate::domain::balance_sheet::BalanceSheetRecord;
use crate::domain::ratios::{calculate_ratios, RatioSet};
use crate::ingest::provider::{fetch_balance_sheet, BalanceSheetSource};
use crate::llm::LlmClient;
use crate::narrative::generate_narrative;
use crate::report::format_report;
use anyhow::Context;

pub const NO_DATA_FOR_SYMBOL: &str = "No data available for this stock symbol";

#[derive(Debug, Clone)]
pub enum Analysis {
    NoData {
        symbol: String,
    },
    Complete {
        symbol: String,
        record: BalanceSheetRecord,
        ratios: RatioSet,
        narrative: String,
    },
}

/// Trims and upper-cases user input. No further validation is applied.
pub fn normalize_symbol(input: &str) -> String {
    input.trim().to_uppercase()
}

/// Fetch, compute, narrate, in that order. Ratios and the narrative are only
/// produced when a balance sheet was found.
pub async fn analyze(
    source: &dyn BalanceSheetSource,
    llm: &dyn LlmClient,
    symbol: &str,
) -> Analysis {
    let symbol = normalize_symbol(symbol);

    let Some(record) = fetch_balance_sheet(source, &symbol).await else {
        return Analysis::NoData { symbol };
    };

    let ratios = calculate_ratios(&record);
    if !ratios.all_finite() {
        tracing::warn!(%symbol, ?ratios, "some ratios are undefined (zero denominator)");
    }

    let narrative = generate_narrative(llm, &record, &ratios).await;
    tracing::info!(%symbol, report_date = %record.report_date, "analysis complete");

    Analysis::Complete {
        symbol,
        record,
        ratios,
        narrative,
    }
}

/// Printable output for one run, each section under its own header.
pub fn render_analysis(analysis: &Analysis) -> anyhow::Result<String> {
    let mut out = String::new();
    out.push_str("\nStock Information:\n");
    out.push_str("-----------------\n");

    match analysis {
        Analysis::NoData { .. } => {
            out.push_str(NO_DATA_FOR_SYMBOL);
            out.push('\n');
        }
        Analysis::Complete {
            record,
            ratios,
            narrative,
            ..
        } => {
            let record_json =
                serde_json::to_string_pretty(record).context("serialize balance sheet")?;
            let ratios_json = serde_json::to_string_pretty(ratios).context("serialize ratios")?;

            out.push_str("\nBalance Sheet JSON:\n");
            out.push_str(&record_json);
            out.push_str("\n\nFormatted Data:\n");
            out.push_str(&format_report(Some(record)));
            out.push_str("\n\nFinancial Ratios JSON:\n");
            out.push_str(&ratios_json);
            out.push_str("\n\nFinancial Analysis:\n");
            out.push_str(&"-".repeat(20));
            out.push('\n');
            out.push_str(narrative);
            out.push('\n');
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::provider::tests::{apple_like_row, CountingSource, FakeSource};
    use crate::narrative::tests::FakeLlm;
    use crate::narrative::NARRATIVE_FALLBACK;

    #[test]
    fn normalizes_symbol_case() {
        assert_eq!(normalize_symbol("  msft\n"), "MSFT");
    }

    #[tokio::test]
    async fn missing_data_skips_ratios_and_narrative() {
        let source = CountingSource::new(FakeSource::Rows(Vec::new()));
        let llm = FakeLlm::replying(&["should not be used"]);

        let analysis = analyze(&source, &llm, "zzzz").await;
        match &analysis {
            Analysis::NoData { symbol } => assert_eq!(symbol, "ZZZZ"),
            other => panic!("expected NoData, got {other:?}"),
        }
        assert_eq!(llm.call_count(), 0);

        let out = render_analysis(&analysis).unwrap();
        assert!(out.contains(NO_DATA_FOR_SYMBOL));
        assert!(!out.contains("Financial Analysis"));
    }

    #[tokio::test]
    async fn provider_failure_skips_narrative() {
        let source = CountingSource::new(FakeSource::Fails);
        let llm = FakeLlm::replying(&["unused"]);

        let analysis = analyze(&source, &llm, "ZZZZ").await;
        assert!(matches!(analysis, Analysis::NoData { .. }));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn complete_run_renders_sections_in_order() {
        let source = CountingSource::new(FakeSource::Rows(vec![apple_like_row("2024-03-31")]));
        let llm = FakeLlm::replying(&["Solid liquidity, moderate leverage."]);

        let analysis = analyze(&source, &llm, "aapl").await;
        let Analysis::Complete {
            symbol,
            ratios,
            narrative,
            ..
        } = &analysis
        else {
            panic!("expected Complete, got {analysis:?}");
        };
        assert_eq!(symbol, "AAPL");
        assert_eq!(ratios.current_ratio, 2.0);
        assert_eq!(narrative, "Solid liquidity, moderate leverage.");
        assert_eq!(llm.call_count(), 1);

        let out = render_analysis(&analysis).unwrap();
        let positions: Vec<usize> = [
            "Balance Sheet JSON:",
            "Formatted Data:",
            "Financial Ratios JSON:",
            "Financial Analysis:",
            "Solid liquidity, moderate leverage.",
        ]
        .iter()
        .map(|needle| out.find(needle).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(out.contains("Total Assets: $1,000.00"));
    }

    #[tokio::test]
    async fn narrative_failure_still_renders_report() {
        let source = CountingSource::new(FakeSource::Rows(vec![apple_like_row("2024-03-31")]));
        let llm = FakeLlm::failing("timeout");

        let analysis = analyze(&source, &llm, "AAPL").await;
        let out = render_analysis(&analysis).unwrap();
        assert!(out.contains("Formatted Data:"));
        assert!(out.ends_with(&format!("{NARRATIVE_FALLBACK}\n")));
    }
}
