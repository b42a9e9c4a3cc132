use anyhow::Context;
use clap::{Parser, ValueEnum};
use fincheck_core::ingest::alpha_vantage::AlphaVantageClient;
use fincheck_core::llm::anthropic::AnthropicClient;
use fincheck_core::llm::openai::OpenAiClient;
use fincheck_core::llm::{LlmClient, Provider};
use fincheck_core::pipeline;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "fincheck", about = "Balance sheet health check for one ticker")]
struct Args {
    /// Ticker symbol (e.g. AAPL). Prompted for on stdin when omitted.
    #[arg(long)]
    symbol: Option<String>,

    /// Inference provider used for the narrative.
    #[arg(long, value_enum, default_value_t = LlmProviderArg::Openai)]
    provider: LlmProviderArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LlmProviderArg {
    Openai,
    Anthropic,
}

impl From<LlmProviderArg> for Provider {
    fn from(arg: LlmProviderArg) -> Self {
        match arg {
            LlmProviderArg::Openai => Provider::OpenAI,
            LlmProviderArg::Anthropic => Provider::Anthropic,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = fincheck_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let result = run(&settings, args).await;
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %format!("{err:#}"), "run failed");
    }
    result
}

async fn run(settings: &fincheck_core::config::Settings, args: Args) -> anyhow::Result<()> {
    let provider = Provider::from(args.provider);
    for var in settings.missing_credentials(provider) {
        tracing::warn!(var, "credential not set; requests will likely be rejected");
    }

    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(b"Stock Analyzer\n==============\n")
        .await
        .context("write to stdout failed")?;

    let raw_symbol = match args.symbol {
        Some(s) => s,
        None => prompt_symbol(&mut stdout).await?,
    };

    let source = AlphaVantageClient::from_settings(settings)?;
    let llm: Box<dyn LlmClient> = match provider {
        Provider::OpenAI => Box::new(OpenAiClient::from_settings(settings)?),
        Provider::Anthropic => Box::new(AnthropicClient::from_settings(settings)?),
    };

    let analysis = pipeline::analyze(&source, llm.as_ref(), &raw_symbol).await;
    let rendered = pipeline::render_analysis(&analysis)?;

    stdout
        .write_all(rendered.as_bytes())
        .await
        .context("write to stdout failed")?;
    stdout.flush().await.context("flush stdout failed")?;
    Ok(())
}

async fn prompt_symbol(stdout: &mut tokio::io::Stdout) -> anyhow::Result<String> {
    stdout
        .write_all(b"Enter the stock symbol (e.g., AAPL, MSFT): ")
        .await
        .context("write prompt failed")?;
    stdout.flush().await.context("flush stdout failed")?;

    let mut line = String::new();
    let read = BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("failed to read symbol from stdin")?;
    anyhow::ensure!(read > 0, "stdin closed before a symbol was entered");
    Ok(line)
}

fn init_sentry(settings: &fincheck_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
