//! `orai` command-line entry point.
//!
//! Loads a `.env` file, reads backend configuration from the environment,
//! installs logging on stderr, runs the agent flow once, and reports failures by category so the
//! operator knows whether to fix configuration, retry later, or file a bug.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use orai::console::{ConsoleInput, ConsoleOutput, FixedInput, InputSource};
use orai::stages::LlmSettings;
use orai::{run_agent, BackendConfig, BackendMode, ErrorCategory, PipelineError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "orai", version, about = "Run the Orai five-stage agent pipeline on one query")]
struct Cli {
    /// Completion backend: `auto` picks live when OPENAI_API_KEY is set.
    #[arg(long, default_value = "auto", env = "ORAI_MODE")]
    mode: BackendMode,

    /// Use this query instead of prompting on stdin.
    #[arg(long, short)]
    query: Option<String>,

    /// Model for every stage; defaults to OPENAI_MODEL or gpt-4o-mini.
    #[arg(long)]
    model: Option<String>,

    /// Sampling temperature for every stage.
    #[arg(long, default_value_t = 0.7)]
    temperature: f64,

    /// Artificial latency of the stub backend, in milliseconds.
    #[arg(long, default_value_t = 500)]
    stub_delay_ms: u64,

    /// Print the final shared context as JSON after the report.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// List the backend's models and exit.
    #[arg(long, default_value_t = false)]
    list_models: bool,

    /// Read OPENAI_* settings from this file instead of searching for `.env`.
    #[arg(long, env = "ORAI_ENV_FILE")]
    env_file: Option<PathBuf>,

    /// Log filter (e.g. `info`, `orai=debug`).
    #[arg(long, default_value = "warn", env = "ORAI_LOG")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, default_value_t = false)]
    log_json: bool,
}

fn init_logging(filter: &str, json: bool) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_new(filter)?;
    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()?;
    }
    Ok(())
}

/// Load variables from `path`, or from the nearest `.env` when no path is
/// given. Variables already set in the process environment are kept.
fn load_env_file(path: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)?;
            Ok(Some(path.to_path_buf()))
        }
        None => match dotenvy::dotenv() {
            Ok(found) => Ok(Some(found)),
            Err(err) if err.not_found() => Ok(None),
            Err(err) => Err(err.into()),
        },
    }
}

fn headline(category: ErrorCategory) -> &'static str {
    match category {
        ErrorCategory::NotConfigured => {
            "Backend not configured: set OPENAI_API_KEY or run with --mode stub."
        }
        ErrorCategory::BackendFailure => {
            "Backend call failed: the completion service returned an error."
        }
        ErrorCategory::WiringDefect => {
            "Internal wiring error: this is a defect, please report it."
        }
        ErrorCategory::InvalidInput => "Invalid input: the query cannot be sent to the backend.",
        ErrorCategory::Io => "Console I/O failed.",
    }
}

fn report_error(err: &PipelineError) {
    eprintln!("{}", headline(err.category()));
    if let Some((stage, phase)) = err.location() {
        eprintln!("  stage: {}, phase: {}", stage, phase);
    }
    eprintln!("  cause: {}", err.root());
}

async fn run(cli: Cli) -> Result<(), PipelineError> {
    let config = BackendConfig::from_env(cli.mode)
        .with_stub_delay(Duration::from_millis(cli.stub_delay_ms));
    tracing::debug!(?config, "backend configuration");
    config.require_configured()?;
    let client = config.build_client()?;

    if cli.list_models {
        for model in client.list_models().await? {
            println!("{}", model);
        }
        return Ok(());
    }

    let input: Arc<dyn InputSource> = match cli.query {
        Some(query) => Arc::new(FixedInput::new(query)),
        None => Arc::new(ConsoleInput),
    };
    let mut settings = LlmSettings::default().with_temperature(cli.temperature);
    settings.model = cli.model;

    let ctx = run_agent(client, input, Arc::new(ConsoleOutput), settings).await?;

    if cli.json {
        let dump = serde_json::to_string_pretty(&ctx)
            .map_err(|e| PipelineError::Other(format!("failed to serialize context: {}", e)))?;
        println!("{}", dump);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_json)?;
    if let Some(path) = load_env_file(cli.env_file.as_deref())? {
        tracing::debug!(path = %path.display(), "loaded environment file");
    }

    match run(cli).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            tracing::error!(error = %err, "pipeline run failed");
            report_error(&err);
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["orai"]).unwrap();
        assert_eq!(cli.mode, BackendMode::Auto);
        assert!(cli.env_file.is_none());
        assert_eq!(cli.temperature, 0.7);
        assert_eq!(cli.stub_delay_ms, 500);
        assert!(cli.query.is_none());
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "orai", "--mode", "stub", "-q", "2+2=?", "--model", "gpt-4o", "--json",
        ])
        .unwrap();
        assert_eq!(cli.mode, BackendMode::Stub);
        assert_eq!(cli.query.as_deref(), Some("2+2=?"));
        assert_eq!(cli.model.as_deref(), Some("gpt-4o"));
        assert!(cli.json);
    }

    #[test]
    fn test_cli_mode_aliases_and_rejects_unknown() {
        let cli = Cli::try_parse_from(["orai", "--mode", "mock"]).unwrap();
        assert_eq!(cli.mode, BackendMode::Stub);
        assert!(Cli::try_parse_from(["orai", "--mode", "remote"]).is_err());
    }

    #[test]
    fn test_env_file_fills_unset_variables() {
        use orai::config::MODEL_VAR;

        let preset = std::env::var(MODEL_VAR).ok();
        let path = std::env::temp_dir().join(format!("orai-{}.env", std::process::id()));
        std::fs::write(&path, format!("{}=model-from-file\n", MODEL_VAR)).unwrap();

        let loaded = load_env_file(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.as_deref(), Some(path.as_path()));

        let config = BackendConfig::from_env(BackendMode::Stub);
        let expected = preset.unwrap_or_else(|| "model-from-file".to_string());
        assert_eq!(config.default_model, expected);
    }

    #[test]
    fn test_missing_explicit_env_file_is_an_error() {
        let path = std::env::temp_dir().join("orai-no-such-file.env");
        assert!(load_env_file(Some(&path)).is_err());
    }

    #[test]
    fn test_headlines_differ_by_category() {
        let configured = headline(PipelineError::NotConfigured.category());
        let wiring = headline(
            PipelineError::MissingContextKey(orai::ContextKey::History).category(),
        );
        assert!(configured.contains("not configured"));
        assert!(wiring.contains("defect"));
    }
}
