use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

/// Version tag of the built-in keyword tables. Bump whenever a term or weight changes.
pub const LEXICON_VERSION: &str = "2024.09-ko";

/// Extracts `<N>년` (N years) mentions; one or two digits, optional whitespace before `년`.
pub const RETENTION_YEARS_PATTERN: &str = r"([0-9]{1,2})\s*년";

/// Identifies the role a keyword group plays in the heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupId {
    ThirdParty,
    BusinessEntity,
    SensitiveData,
    Marketing,
    DataCategory,
    IndefiniteRetention,
    PurposeFulfilment,
    OptOut,
    Anonymization,
}

impl GroupId {
    pub const ALL: [GroupId; 9] = [
        GroupId::ThirdParty,
        GroupId::BusinessEntity,
        GroupId::SensitiveData,
        GroupId::Marketing,
        GroupId::DataCategory,
        GroupId::IndefiniteRetention,
        GroupId::PurposeFulfilment,
        GroupId::OptOut,
        GroupId::Anonymization,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupId::ThirdParty => "third_party",
            GroupId::BusinessEntity => "business_entity",
            GroupId::SensitiveData => "sensitive_data",
            GroupId::Marketing => "marketing",
            GroupId::DataCategory => "data_category",
            GroupId::IndefiniteRetention => "indefinite_retention",
            GroupId::PurposeFulfilment => "purpose_fulfilment",
            GroupId::OptOut => "opt_out",
            GroupId::Anonymization => "anonymization",
        }
    }
}

/// How the hits of a keyword group turn into points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoringRule {
    /// `points` for every occurrence of every term, capped at `cap`.
    PerOccurrence { points: i32, cap: i32 },
    /// `points` once if any term occurs. Negative values are mitigations.
    Flat { points: i32 },
    /// `points` per distinct term found, capped at `cap`.
    DistinctTerms { points: i32, cap: i32 },
    /// Contributes no points; only feeds bullets or notes.
    Annotation,
}

/// Thresholds applied to the largest retention period (in years) found in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RetentionYearsRule {
    pub long_term_years: u32,
    pub long_term_points: i32,
    pub short_term_years: u32,
    pub short_term_points: i32,
}

/// A named category of literal terms together with its scoring rule.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct KeywordGroup {
    pub id: GroupId,
    pub name: &'static str,
    pub terms: &'static [&'static str],
    pub rule: ScoringRule,
}

impl KeywordGroup {
    /// Validate the invariants the scorer relies on.
    pub fn validate(&self) -> Result<(), LexiconValidationError> {
        let group = self.id.as_str();
        if self.name.trim().is_empty() {
            return Err(LexiconValidationError::EmptyName { group });
        }
        if self.terms.is_empty() {
            return Err(LexiconValidationError::NoTerms { group });
        }
        let mut seen = HashSet::new();
        for term in self.terms {
            if term.trim().is_empty() {
                return Err(LexiconValidationError::BlankTerm { group });
            }
            if !seen.insert(*term) {
                return Err(LexiconValidationError::DuplicateTerm {
                    group,
                    term: (*term).to_string(),
                });
            }
        }
        match self.rule {
            ScoringRule::PerOccurrence { points, cap }
            | ScoringRule::DistinctTerms { points, cap } => {
                check_points(group, points)?;
                check_points(group, cap)?;
                if cap < points {
                    return Err(LexiconValidationError::CapBelowPoints { group, points, cap });
                }
            }
            ScoringRule::Flat { points } => check_points(group, points)?,
            ScoringRule::Annotation => {}
        }
        Ok(())
    }
}

fn check_points(group: &'static str, points: i32) -> Result<(), LexiconValidationError> {
    if !(-100..=100).contains(&points) {
        return Err(LexiconValidationError::InvalidPoints { group, points });
    }
    Ok(())
}

/// Errors emitted while validating keyword tables.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexiconValidationError {
    #[error("group `{group}` must have a name")]
    EmptyName { group: &'static str },
    #[error("group `{group}` must list at least one term")]
    NoTerms { group: &'static str },
    #[error("group `{group}` contains a blank term")]
    BlankTerm { group: &'static str },
    #[error("group `{group}` lists term `{term}` more than once")]
    DuplicateTerm { group: &'static str, term: String },
    #[error("group `{group}` points must be within -100..=100 (got {points})")]
    InvalidPoints { group: &'static str, points: i32 },
    #[error("group `{group}` cap {cap} is below its per-hit points {points}")]
    CapBelowPoints {
        group: &'static str,
        points: i32,
        cap: i32,
    },
    #[error("lexicon is missing group `{group}`")]
    MissingGroup { group: &'static str },
    #[error("lexicon defines group `{group}` more than once")]
    DuplicateGroup { group: &'static str },
    #[error("retention thresholds are inverted ({short_term} >= {long_term} years)")]
    InvertedRetention { short_term: u32, long_term: u32 },
}

/// Complete, versioned set of keyword groups and weights driving the heuristic.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Lexicon {
    pub version: &'static str,
    pub groups: &'static [KeywordGroup],
    pub retention_years: RetentionYearsRule,
    pub retention_years_pattern: &'static str,
}

impl Lexicon {
    /// The built-in table tuned for Korean consent notices.
    pub fn builtin() -> Self {
        Self {
            version: LEXICON_VERSION,
            groups: BUILTIN_GROUPS,
            retention_years: BUILTIN_RETENTION_YEARS,
            retention_years_pattern: RETENTION_YEARS_PATTERN,
        }
    }

    pub fn group(&self, id: GroupId) -> Option<&KeywordGroup> {
        self.groups.iter().find(|group| group.id == id)
    }

    /// Validate every group and require each `GroupId` exactly once.
    pub fn validate(&self) -> Result<(), LexiconValidationError> {
        let mut seen = HashSet::new();
        for group in self.groups {
            group.validate()?;
            if !seen.insert(group.id) {
                return Err(LexiconValidationError::DuplicateGroup {
                    group: group.id.as_str(),
                });
            }
        }
        if let Some(missing) = GroupId::ALL.iter().find(|id| !seen.contains(*id)) {
            return Err(LexiconValidationError::MissingGroup {
                group: missing.as_str(),
            });
        }
        let years = &self.retention_years;
        if years.short_term_years >= years.long_term_years {
            return Err(LexiconValidationError::InvertedRetention {
                short_term: years.short_term_years,
                long_term: years.long_term_years,
            });
        }
        Ok(())
    }
}

const BUILTIN_RETENTION_YEARS: RetentionYearsRule = RetentionYearsRule {
    long_term_years: 3,
    long_term_points: 10,
    short_term_years: 1,
    short_term_points: 5,
};

static BUILTIN_GROUPS: &[KeywordGroup] = &[
    KeywordGroup {
        id: GroupId::ThirdParty,
        name: "third-party sharing / outsourcing",
        terms: &[
            "제3자",
            "제3 자",
            "제3",
            "수탁자",
            "위탁",
            "제공",
            "제공받는자",
            "제공받는 자",
        ],
        rule: ScoringRule::PerOccurrence { points: 5, cap: 30 },
    },
    KeywordGroup {
        id: GroupId::BusinessEntity,
        name: "business entity mentions",
        terms: &["주식회사", "㈜", "유한회사"],
        rule: ScoringRule::Annotation,
    },
    KeywordGroup {
        id: GroupId::SensitiveData,
        name: "sensitive data",
        terms: &[
            "민감정보",
            "고유식별정보",
            "주민등록번호",
            "여권번호",
            "운전면허번호",
            "건강정보",
            "바이오정보",
            "지문",
            "얼굴인식",
        ],
        rule: ScoringRule::Flat { points: 25 },
    },
    KeywordGroup {
        id: GroupId::Marketing,
        name: "marketing / advertising",
        terms: &[
            "마케팅",
            "광고",
            "홍보",
            "프로모션",
            "광고성 정보",
            "맞춤형",
            "광고성",
        ],
        rule: ScoringRule::Flat { points: 15 },
    },
    KeywordGroup {
        id: GroupId::DataCategory,
        name: "collected data categories",
        terms: &[
            "이름",
            "성명",
            "생년월일",
            "주소",
            "전화",
            "휴대전화",
            "이메일",
            "계좌",
            "카드",
            "위치",
            "쿠키",
            "결제",
            "기기",
            "IP",
            "식별자",
            "로그",
        ],
        rule: ScoringRule::DistinctTerms { points: 2, cap: 20 },
    },
    KeywordGroup {
        id: GroupId::IndefiniteRetention,
        name: "indefinite retention",
        terms: &["영구", "무기한", "별도 보유기간", "탈퇴 후에도"],
        rule: ScoringRule::Flat { points: 20 },
    },
    KeywordGroup {
        id: GroupId::PurposeFulfilment,
        name: "destroyed upon purpose fulfillment",
        terms: &["목적 달성 시", "목적달성 시"],
        rule: ScoringRule::Annotation,
    },
    KeywordGroup {
        id: GroupId::OptOut,
        name: "consent refusal / withdrawal",
        terms: &["동의 거부", "철회", "옵트아웃", "수신 거부"],
        rule: ScoringRule::Flat { points: -10 },
    },
    KeywordGroup {
        id: GroupId::Anonymization,
        name: "anonymization / pseudonymization",
        terms: &["익명", "가명처리", "가명화"],
        rule: ScoringRule::Flat { points: -5 },
    },
];
