use crate::domain::balance_sheet::BalanceSheetRecord;
use crate::domain::ratios::RatioSet;
use crate::llm::{ChatMessage, GenerationParams, LlmClient};
use anyhow::Context;

pub const NARRATIVE_FALLBACK: &str = "Financial analysis unavailable";

const SYSTEM_PROMPT: &str = "You are an expert in financial analysis.";

/// Fixed sampling settings: long enough for a full write-up, close to deterministic.
pub fn generation_params() -> GenerationParams {
    GenerationParams {
        max_tokens: 2000,
        temperature: 0.2,
        top_p: 0.2,
        n: 1,
        frequency_penalty: 0.0,
        presence_penalty: 0.0,
        stop: None,
    }
}

pub fn balance_sheet_prompt(record: &BalanceSheetRecord) -> anyhow::Result<String> {
    let data = serde_json::to_string_pretty(record).context("serialize balance sheet")?;
    Ok(format!(
        "Analyze the financial health of the company using its most recent quarterly \
balance sheet below. Interpret the size and composition of its assets, liabilities, \
shareholder equity, retained earnings, debt and cash position, and point out anything \
unusual.\n\nBalance sheet JSON:\n{data}"
    ))
}

pub fn ratio_prompt(ratios: &RatioSet) -> anyhow::Result<String> {
    let data = serde_json::to_string_pretty(ratios).context("serialize ratios")?;
    let undefined_note = if ratios.all_finite() {
        ""
    } else {
        "\nA ratio shown as \"inf\", \"-inf\" or \"NaN\" has a zero denominator; \
say that it is undefined instead of interpreting the number.\n"
    };

    Ok(format!(
        "These liquidity and solvency ratios were computed from the same balance sheet:\n\
{data}\n{undefined_note}\n\
Interpret each ratio using these guidelines:\n\
- Current ratio (current assets / current liabilities): above 1 means short-term \
obligations are covered by current assets; below 1 signals possible liquidity pressure.\n\
- Cash ratio (cash and cash equivalents / current liabilities): shows how much of the \
short-term obligations could be paid with cash alone; values near or above 1 indicate a \
very strong cash position.\n\
- Debt index (total liabilities / shareholder equity): above 1 means the company is \
financed more by third parties than by its owners; higher values mean more leverage.\n\
- Debt-to-equity ratio (interest-bearing debt / shareholder equity): measures reliance \
on borrowed capital; values well above 1 indicate an aggressive financing structure.\n\n\
Finish with an overall conclusion on the company's liquidity and solvency."
    ))
}

pub fn build_messages(
    record: &BalanceSheetRecord,
    ratios: &RatioSet,
) -> anyhow::Result<Vec<ChatMessage>> {
    Ok(vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(balance_sheet_prompt(record)?),
        ChatMessage::user(ratio_prompt(ratios)?),
    ])
}

/// Asks the model for a narrative assessment. Never fails: any error is
/// logged and replaced by [`NARRATIVE_FALLBACK`].
pub async fn generate_narrative(
    llm: &dyn LlmClient,
    record: &BalanceSheetRecord,
    ratios: &RatioSet,
) -> String {
    match request_narrative(llm, record, ratios).await {
        Ok(text) => text,
        Err(err) => {
            tracing::error!(
                provider = ?llm.provider(),
                report_date = %record.report_date,
                error = %format!("{err:#}"),
                "financial analysis request failed"
            );
            NARRATIVE_FALLBACK.to_string()
        }
    }
}

async fn request_narrative(
    llm: &dyn LlmClient,
    record: &BalanceSheetRecord,
    ratios: &RatioSet,
) -> anyhow::Result<String> {
    let messages = build_messages(record, ratios)?;
    let completions = llm.complete(&messages, &generation_params()).await?;
    let first = completions
        .into_iter()
        .next()
        .context("LLM returned no completions")?;
    anyhow::ensure!(!first.trim().is_empty(), "LLM returned an empty completion");
    Ok(first)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::balance_sheet::sample_record;
    use crate::domain::ratios::calculate_ratios;
    use crate::llm::{Provider, Role};
    use std::sync::Mutex;

    /// Records every request and answers with a canned result.
    pub(crate) struct FakeLlm {
        pub(crate) reply: Result<Vec<String>, String>,
        pub(crate) requests: Mutex<Vec<(Vec<ChatMessage>, GenerationParams)>>,
    }

    impl FakeLlm {
        pub(crate) fn replying(texts: &[&str]) -> Self {
            Self {
                reply: Ok(texts.iter().map(|s| s.to_string()).collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for FakeLlm {
        fn provider(&self) -> Provider {
            Provider::OpenAI
        }

        async fn complete(
            &self,
            messages: &[ChatMessage],
            params: &GenerationParams,
        ) -> anyhow::Result<Vec<String>> {
            self.requests
                .lock()
                .unwrap()
                .push((messages.to_vec(), params.clone()));
            match &self.reply {
                Ok(texts) => Ok(texts.clone()),
                Err(message) => Err(anyhow::anyhow!(message.clone())),
            }
        }
    }

    #[tokio::test]
    async fn returns_first_completion() {
        let llm = FakeLlm::replying(&["first analysis", "second analysis"]);
        let record = sample_record();
        let ratios = calculate_ratios(&record);

        let text = generate_narrative(&llm, &record, &ratios).await;
        assert_eq!(text, "first analysis");
    }

    #[tokio::test]
    async fn sends_system_then_two_user_segments_with_fixed_params() {
        let llm = FakeLlm::replying(&["ok"]);
        let record = sample_record();
        let ratios = calculate_ratios(&record);

        generate_narrative(&llm, &record, &ratios).await;

        let requests = llm.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let (messages, params) = &requests[0];
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::User]);
        assert!(messages[0].content.contains("expert in financial analysis"));
        assert!(messages[1].content.contains("\"total_assets\": 1000.0"));
        assert!(messages[2].content.contains("\"current_ratio\": 2.0"));
        assert!(messages[2].content.contains("Debt-to-equity ratio"));
        assert_eq!(params, &generation_params());
        assert_eq!(params.max_tokens, 2000);
        assert!(params.stop.is_none());
    }

    #[tokio::test]
    async fn failure_returns_fallback_verbatim() {
        let llm = FakeLlm::failing("insufficient_quota");
        let record = sample_record();
        let ratios = calculate_ratios(&record);

        let text = generate_narrative(&llm, &record, &ratios).await;
        assert_eq!(text, NARRATIVE_FALLBACK);
    }

    #[tokio::test]
    async fn empty_completion_list_returns_fallback() {
        let llm = FakeLlm::replying(&[]);
        let record = sample_record();
        let ratios = calculate_ratios(&record);

        assert_eq!(
            generate_narrative(&llm, &record, &ratios).await,
            NARRATIVE_FALLBACK
        );
    }

    #[test]
    fn ratio_prompt_flags_undefined_ratios() {
        let mut record = sample_record();
        let finite = ratio_prompt(&calculate_ratios(&record)).unwrap();
        assert!(!finite.contains("zero denominator"));

        record.current_liabilities = 0.0;
        let degenerate = ratio_prompt(&calculate_ratios(&record)).unwrap();
        assert!(degenerate.contains("\"current_ratio\": \"inf\""));
        assert!(degenerate.contains("zero denominator"));
    }
}
