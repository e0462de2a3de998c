use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use consent_risk_core::{
    is_blank,
    report::{render_heuristic, render_result, OutputFormat},
    sample::SAMPLE_CONSENT_TEXT,
    AnalysisResult, AnalyzerSettings, EndpointResolver, HeuristicScorer, Lexicon, RemoteAnalyzer,
    ScoringRule,
};
use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "consent-risk",
    author,
    version,
    about = "Privacy-risk scoring for consent notices"
)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON) with an `[analyzer]` table
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score consent text read from a file or stdin
    Analyze {
        /// Read text from this file instead of stdin
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
        /// Delegate scoring to the remote analyzer
        #[arg(long)]
        remote: bool,
        /// Per-call endpoint override for the remote analyzer
        #[arg(long, value_name = "URL", requires = "remote")]
        endpoint: Option<String>,
        /// Fall back to the local heuristic when the remote call fails
        #[arg(long, requires = "remote")]
        fallback: bool,
        /// Request timeout for the remote analyzer (e.g. `10s`, `1m`)
        #[arg(long, value_name = "DURATION", value_parser = parse_timeout)]
        timeout: Option<Duration>,
        #[arg(long, value_enum, default_value_t = FormatArg::Human)]
        format: FormatArg,
        /// Include the per-factor breakdown of the local heuristic
        #[arg(long, conflicts_with = "remote")]
        explain: bool,
    },
    /// Print the bundled sample consent notice
    Sample,
    /// List the keyword groups driving the heuristic
    Lexicon {
        /// Emit the lexicon as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
    /// Show which remote endpoint would be used
    Endpoint {
        /// Per-call endpoint override to test against sanitization
        #[arg(long, value_name = "URL")]
        endpoint: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Human,
    Json,
    Yaml,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Human => OutputFormat::Human,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Yaml => OutputFormat::Yaml,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    analyzer: Option<AnalyzerSettings>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;
    match cli.command.unwrap_or(Commands::Lexicon { json: false }) {
        Commands::Analyze {
            file,
            remote,
            endpoint,
            fallback,
            timeout,
            format,
            explain,
        } => {
            let text = read_input(file.as_deref()).await?;
            let mut settings = settings;
            if let Some(timeout) = timeout {
                settings.timeout_secs = Some(ceil_secs(timeout));
            }
            let output = if remote {
                analyze_remote(&settings, &text, endpoint.as_deref(), fallback, format.into())
                    .await?
            } else {
                analyze_local(&text, format.into(), explain)?
            };
            println!("{}", output.trim_end());
        }
        Commands::Sample => println!("{SAMPLE_CONSENT_TEXT}"),
        Commands::Lexicon { json } => list_lexicon(json)?,
        Commands::Endpoint { endpoint } => {
            let resolved = EndpointResolver::new(settings.endpoint.clone())
                .resolve(endpoint.as_deref())
                .context("failed to resolve analyzer endpoint")?;
            println!("{resolved}");
        }
    }
    Ok(())
}

fn load_settings(config_path: Option<&Path>) -> Result<AnalyzerSettings> {
    let from_env = AnalyzerSettings::from_env();
    let Some(path) = config_path else {
        return Ok(from_env);
    };
    let file: FileConfig = config::Config::builder()
        .add_source(config::File::from(path))
        .build()
        .with_context(|| format!("failed to read config file {}", path.display()))?
        .try_deserialize()
        .with_context(|| format!("invalid config file {}", path.display()))?;
    Ok(from_env.or(file.analyzer.unwrap_or_default()))
}

async fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read consent text from {}", path.display())),
        None => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("failed to read consent text from stdin")?;
            Ok(text)
        }
    }
}

fn analyze_local(text: &str, format: OutputFormat, explain: bool) -> Result<String> {
    let scorer = HeuristicScorer::new();
    if explain {
        render_heuristic(&scorer.score_detailed(text), format)
    } else {
        render_result(&scorer.score(text), format)
    }
}

async fn analyze_remote(
    settings: &AnalyzerSettings,
    text: &str,
    endpoint: Option<&str>,
    fallback: bool,
    format: OutputFormat,
) -> Result<String> {
    if is_blank(text) {
        info!("no consent text provided; skipping remote analyzer");
        return render_result(&AnalysisResult::no_content(), format);
    }
    let client = RemoteAnalyzer::new(settings)?;
    match client.analyze_remote(text, endpoint).await {
        Ok(result) => render_result(&result, format),
        Err(err) if fallback => {
            warn!(error = %err, "remote analyzer failed; falling back to local heuristic");
            render_result(&HeuristicScorer::new().score(text), format)
        }
        Err(err) => Err(anyhow::Error::new(err).context("remote analysis failed")),
    }
}

fn list_lexicon(json: bool) -> Result<()> {
    let lexicon = Lexicon::builtin();
    if json {
        println!("{}", serde_json::to_string_pretty(&lexicon)?);
        return Ok(());
    }

    println!(
        "Lexicon {} :: {} group(s)",
        lexicon.version,
        lexicon.groups.len()
    );
    for group in lexicon.groups {
        let rule = match group.rule {
            ScoringRule::PerOccurrence { points, cap } => format!("{points:+} each, cap {cap}"),
            ScoringRule::DistinctTerms { points, cap } => {
                format!("{points:+} per distinct term, cap {cap}")
            }
            ScoringRule::Flat { points } => format!("{points:+} if present"),
            ScoringRule::Annotation => "annotation only".to_string(),
        };
        println!(
            "- {id:<22} {rule:<30} :: {name}",
            id = group.id.as_str(),
            rule = rule,
            name = group.name
        );
        println!("    terms: {}", group.terms.join(", "));
    }
    let years = lexicon.retention_years;
    println!(
        "- {id:<22} {rule:<30} :: retention period in years",
        id = "retention_years",
        rule = format!(
            "{:+} if >= {}, {:+} if >= {}",
            years.long_term_points,
            years.long_term_years,
            years.short_term_points,
            years.short_term_years
        ),
    );
    Ok(())
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    let duration = humantime::parse_duration(value).map_err(|err| err.to_string())?;
    if duration.is_zero() {
        return Err("timeout must be greater than zero".to_string());
    }
    Ok(duration)
}

fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tokio=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
