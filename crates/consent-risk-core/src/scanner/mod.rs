use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AnalyzerError;

pub mod heuristic;
/// Static keyword groups and weights driving the heuristic.
pub mod lexicon;

pub const MAX_SCORE: u8 = 100;

/// Label returned for empty or whitespace-only input.
pub const NO_CONTENT_LABEL: &str = "no content";

/// Thresholds that map numeric scores into risk labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub moderate: u8,
    pub high: u8,
    pub very_high: u8,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            moderate: 30,
            high: 60,
            very_high: 80,
        }
    }
}

/// Closed set of categories the heuristic assigns to a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    #[serde(rename = "low")]
    Low,
    #[serde(rename = "moderate")]
    Moderate,
    #[serde(rename = "high")]
    High,
    #[serde(rename = "very high")]
    VeryHigh,
}

impl RiskLabel {
    /// Map a 0-100 score into a label using the default thresholds.
    pub fn from_score(score: u8) -> Self {
        Self::from_score_with_thresholds(score, &RiskThresholds::default())
    }

    pub fn from_score_with_thresholds(score: u8, thresholds: &RiskThresholds) -> Self {
        if score >= thresholds.very_high {
            Self::VeryHigh
        } else if score >= thresholds.high {
            Self::High
        } else if score >= thresholds.moderate {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::Low => "low",
            RiskLabel::Moderate => "moderate",
            RiskLabel::High => "high",
            RiskLabel::VeryHigh => "very high",
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical result shape produced by every scoring path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Risk score, always within `0..=100`.
    pub score: u8,
    pub label: String,
    /// Short findings supporting the score; present even when empty.
    #[serde(default)]
    pub bullets: Vec<String>,
}

impl AnalysisResult {
    /// Construct a result, clamping the score into range.
    pub fn new(score: u8, label: impl Into<String>, bullets: Vec<String>) -> Self {
        Self {
            score: score.min(MAX_SCORE),
            label: label.into(),
            bullets,
        }
    }

    /// Result for text that carries nothing to analyze.
    pub fn no_content() -> Self {
        Self::new(0, NO_CONTENT_LABEL, Vec::new())
    }
}

/// True when the text holds nothing but whitespace and byte-order marks.
pub fn is_blank(text: &str) -> bool {
    text.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
        .is_empty()
}

/// Clamp an unbounded running total into the score range.
pub fn clamp_score(total: i64) -> u8 {
    total.clamp(0, i64::from(MAX_SCORE)) as u8
}

/// Primary scoring interface shared by the local heuristic and the remote analyzer.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Score the provided consent text.
    async fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalyzerError>;
}
