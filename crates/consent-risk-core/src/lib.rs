pub mod error;
pub mod remote;
pub mod report;
pub mod sample;
pub mod scanner;

pub use error::AnalyzerError;
pub use remote::{AnalyzerSettings, EndpointResolver, RemoteAnalyzer};
pub use scanner::{
    heuristic::{HeuristicReport, HeuristicScorer},
    lexicon::{GroupId, KeywordGroup, Lexicon, ScoringRule, LEXICON_VERSION},
    is_blank, AnalysisResult, Analyzer, RiskLabel,
};
