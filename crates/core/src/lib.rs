pub mod coerce;
pub mod domain;
pub mod ingest;
pub mod llm;
pub mod narrative;
pub mod pipeline;
pub mod report;

pub mod config {
    use crate::llm::Provider;

    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub alphavantage_api_key: Option<String>,
        pub openai_api_key: Option<String>,
        pub anthropic_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                alphavantage_api_key: non_empty_var("ALPHAVANTAGE_API_KEY"),
                openai_api_key: non_empty_var("OPENAI_API_KEY"),
                anthropic_api_key: non_empty_var("ANTHROPIC_API_KEY"),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }

        /// Names of credential variables that are not set.
        ///
        /// Credentials are never required up front: a missing key surfaces as a
        /// provider rejection on the first request.
        pub fn missing_credentials(&self, llm: Provider) -> Vec<&'static str> {
            let (llm_key, llm_key_var) = match llm {
                Provider::OpenAI => (&self.openai_api_key, "OPENAI_API_KEY"),
                Provider::Anthropic => (&self.anthropic_api_key, "ANTHROPIC_API_KEY"),
            };

            let mut out = Vec::new();
            if self.alphavantage_api_key.is_none() {
                out.push("ALPHAVANTAGE_API_KEY");
            }
            if llm_key.is_none() {
                out.push(llm_key_var);
            }
            out
        }
    }

    fn non_empty_var(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|s| !s.trim().is_empty())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn reports_missing_credentials_for_selected_provider() {
            let settings = Settings {
                alphavantage_api_key: Some("av".to_string()),
                openai_api_key: None,
                anthropic_api_key: Some("ant".to_string()),
                sentry_dsn: None,
            };

            assert_eq!(
                settings.missing_credentials(Provider::OpenAI),
                vec!["OPENAI_API_KEY"]
            );
            assert!(settings.missing_credentials(Provider::Anthropic).is_empty());
        }
    }
}
