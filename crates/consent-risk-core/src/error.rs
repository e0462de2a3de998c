use thiserror::Error;

/// Failures surfaced by scoring paths. The heuristic scorer never produces one.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Every endpoint candidate was rejected and no compiled default exists.
    #[error("no usable analyzer endpoint could be resolved")]
    Configuration,
    /// The request could not be sent, the connection failed, or the body could not be read.
    #[error("failed to reach analyzer endpoint {endpoint}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// The analyzer answered with a status outside the 2xx range.
    #[error("analyzer endpoint {endpoint} returned HTTP {status}")]
    Protocol {
        endpoint: String,
        status: u16,
        body: String,
    },
}

impl AnalyzerError {
    /// HTTP status carried by protocol failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            AnalyzerError::Protocol { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_error_exposes_status() {
        let err = AnalyzerError::Protocol {
            endpoint: "https://example.test/api".into(),
            status: 503,
            body: "unavailable".into(),
        };
        assert_eq!(err.status(), Some(503));
        assert_eq!(
            err.to_string(),
            "analyzer endpoint https://example.test/api returned HTTP 503"
        );
        assert_eq!(AnalyzerError::Configuration.status(), None);
    }
}
