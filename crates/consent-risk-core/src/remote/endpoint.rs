use tracing::warn;

use crate::error::AnalyzerError;

/// Endpoint used when neither the caller nor the process configuration overrides it.
pub const DEFAULT_ANALYZER_ENDPOINT: Option<&str> =
    Some("https://swai-backend.onrender.com/api/check");

/// Lowercase fragments that identify a page URL or query string rather than an API endpoint.
const REJECTED_FRAGMENTS: [&str; 3] = ["analysis-result", ".html", "?text="];

/// Selects the remote-analyzer URL from the per-call override, the process-wide override,
/// and the compiled default, in that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointResolver {
    process_override: Option<String>,
    default: Option<String>,
}

impl EndpointResolver {
    /// Resolver using the compiled default endpoint.
    pub fn new(process_override: Option<String>) -> Self {
        Self::with_default(process_override, DEFAULT_ANALYZER_ENDPOINT.map(str::to_string))
    }

    pub fn with_default(process_override: Option<String>, default: Option<String>) -> Self {
        Self {
            process_override,
            default,
        }
    }

    /// Resolve the endpoint for one call.
    pub fn resolve(&self, call_override: Option<&str>) -> Result<String, AnalyzerError> {
        sanitize(call_override)
            .or_else(|| sanitize(self.process_override.as_deref()))
            .or_else(|| self.default.as_deref().filter(|d| !d.trim().is_empty()))
            .map(|endpoint| endpoint.trim().to_string())
            .ok_or(AnalyzerError::Configuration)
    }
}

/// Drop blank candidates and ones that look like the current page URL.
pub fn sanitize(candidate: Option<&str>) -> Option<&str> {
    let candidate = candidate?.trim();
    if candidate.is_empty() {
        return None;
    }
    let lowered = candidate.to_lowercase();
    if REJECTED_FRAGMENTS
        .iter()
        .any(|fragment| lowered.contains(fragment))
    {
        warn!(endpoint = candidate, "ignoring invalid analyzer endpoint override");
        return None;
    }
    Some(candidate)
}
