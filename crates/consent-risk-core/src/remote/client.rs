use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Serialize;
use tracing::{debug, instrument};

use super::{normalize, AnalyzerSettings, EndpointResolver};
use crate::error::AnalyzerError;
use crate::scanner::{AnalysisResult, Analyzer};

/// Delegates scoring to an external HTTP analyzer and normalizes its reply.
#[derive(Debug, Clone)]
pub struct RemoteAnalyzer {
    http: Client,
    resolver: EndpointResolver,
}

impl RemoteAnalyzer {
    /// Build a client whose process-wide override comes from `settings`.
    pub fn new(settings: &AnalyzerSettings) -> Result<Self> {
        Self::with_resolver(settings, EndpointResolver::new(settings.endpoint.clone()))
    }

    pub fn with_resolver(settings: &AnalyzerSettings, resolver: EndpointResolver) -> Result<Self> {
        let mut builder = Client::builder().user_agent(settings.user_agent.as_str());
        if let Some(timeout) = settings.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .context("failed to build analyzer HTTP client")?;
        Ok(Self { http, resolver })
    }

    /// Send `text` to the resolved endpoint. `call_override` takes precedence over the
    /// configured endpoints when it passes sanitization.
    #[instrument(
        name = "analyze_remote",
        skip(self, text, call_override),
        fields(input_len = text.len())
    )]
    pub async fn analyze_remote(
        &self,
        text: &str,
        call_override: Option<&str>,
    ) -> Result<AnalysisResult, AnalyzerError> {
        let endpoint = self.resolver.resolve(call_override)?;
        debug!(%endpoint, "calling remote analyzer");

        let response = self
            .http
            .post(&endpoint)
            .header(header::ACCEPT, "application/json")
            .json(&AnalyzeRequest { text })
            .send()
            .await
            .map_err(|source| AnalyzerError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = response.status();
        let raw = match response.bytes().await {
            Ok(raw) => raw.to_vec(),
            Err(source) if status.is_success() => {
                return Err(AnalyzerError::Transport { endpoint, source });
            }
            Err(_) => Vec::new(),
        };
        let result = interpret_response(endpoint, status, &raw)?;
        debug!(score = result.score, label = %result.label, "remote analysis completed");
        Ok(result)
    }
}

#[async_trait]
impl Analyzer for RemoteAnalyzer {
    async fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalyzerError> {
        self.analyze_remote(text, None).await
    }
}

/// Map a received status and body onto the canonical result. Any non-2xx status is a
/// protocol error; a 2xx body that is not the expected shape degrades to defaults.
fn interpret_response(
    endpoint: String,
    status: StatusCode,
    raw: &[u8],
) -> Result<AnalysisResult, AnalyzerError> {
    if !status.is_success() {
        let body = String::from_utf8_lossy(raw).into_owned();
        return Err(protocol_error(endpoint, status, body));
    }
    Ok(normalize::normalize_response(&normalize::parse_body(raw)))
}

fn protocol_error(endpoint: String, status: StatusCode, body: String) -> AnalyzerError {
    AnalyzerError::Protocol {
        endpoint,
        status: status.as_u16(),
        body: truncate(&body, 512),
    }
}

fn truncate(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    input.chars().take(max_chars).collect::<String>() + "…"
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
}
