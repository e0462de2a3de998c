use std::{collections::BTreeSet, fmt, sync::Arc};

use aho_corasick::AhoCorasick;
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, instrument};

use super::{
    clamp_score, is_blank,
    lexicon::{GroupId, KeywordGroup, Lexicon, RetentionYearsRule, ScoringRule},
    AnalysisResult, Analyzer, RiskLabel, RiskThresholds,
};
use crate::error::AnalyzerError;

static BUILTIN: Lazy<Arc<CompiledLexicon>> = Lazy::new(|| {
    Arc::new(
        CompiledLexicon::compile(&Lexicon::builtin())
            .expect("built-in lexicon is validated by unit tests"),
    )
});

/// Factor of the heuristic that contributed (or could have contributed) points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    ThirdParty,
    SensitiveData,
    Marketing,
    DataCategories,
    Retention,
    OptOut,
    Anonymization,
}

/// Points contributed by one factor, before the final clamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactorContribution {
    pub factor: Factor,
    pub hits: usize,
    pub points: i32,
}

/// What the retention-period analysis concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "years", rename_all = "snake_case")]
pub enum RetentionNote {
    Indefinite,
    AtLeast(u32),
    Within(u32),
    Unspecified,
    PurposeFulfilled,
}

impl fmt::Display for RetentionNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetentionNote::Indefinite => f.write_str("indefinite/unclear"),
            RetentionNote::AtLeast(years) => write!(f, "{years} years or more"),
            RetentionNote::Within(years) => write!(f, "within {years} years"),
            RetentionNote::Unspecified => f.write_str("unspecified/general"),
            RetentionNote::PurposeFulfilled => f.write_str("destroyed upon purpose fulfillment"),
        }
    }
}

/// Canonical result plus the per-factor breakdown that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeuristicReport {
    pub result: AnalysisResult,
    pub raw_total: i32,
    pub retention: Option<RetentionNote>,
    pub contributions: Vec<FactorContribution>,
}

/// Keyword matcher for a single group.
struct GroupMatcher {
    group: KeywordGroup,
    automaton: AhoCorasick,
}

impl GroupMatcher {
    fn new(lexicon: &Lexicon, id: GroupId) -> Result<Self> {
        let group = *lexicon
            .group(id)
            .with_context(|| format!("lexicon has no `{}` group", id.as_str()))?;
        let automaton = AhoCorasick::new(group.terms)
            .with_context(|| format!("failed to build matcher for group {}", id.as_str()))?;
        Ok(Self { group, automaton })
    }

    /// Sum of non-overlapping occurrences of each term, counted term by term.
    fn occurrences(&self, text: &str) -> usize {
        self.group
            .terms
            .iter()
            .map(|term| text.matches(term).count())
            .sum()
    }

    fn any(&self, text: &str) -> bool {
        self.automaton.is_match(text)
    }

    /// Number of distinct terms found anywhere in the text, including terms nested in others.
    fn distinct(&self, text: &str) -> usize {
        self.automaton
            .find_overlapping_iter(text)
            .map(|mat| mat.pattern())
            .collect::<BTreeSet<_>>()
            .len()
    }

    fn points(&self, hits: usize) -> i32 {
        match self.group.rule {
            ScoringRule::PerOccurrence { points, cap }
            | ScoringRule::DistinctTerms { points, cap } => {
                let hits = i32::try_from(hits).unwrap_or(i32::MAX);
                hits.saturating_mul(points).min(cap)
            }
            ScoringRule::Flat { points } if hits > 0 => points,
            ScoringRule::Flat { .. } | ScoringRule::Annotation => 0,
        }
    }
}

/// Keyword tables compiled into matchers, ready for repeated scoring.
pub struct CompiledLexicon {
    third_party: GroupMatcher,
    business_entity: GroupMatcher,
    sensitive: GroupMatcher,
    marketing: GroupMatcher,
    categories: GroupMatcher,
    indefinite: GroupMatcher,
    purpose: GroupMatcher,
    opt_out: GroupMatcher,
    anonymization: GroupMatcher,
    years_pattern: Regex,
    years_rule: RetentionYearsRule,
}

impl CompiledLexicon {
    pub fn compile(lexicon: &Lexicon) -> Result<Self> {
        lexicon.validate().context("invalid lexicon")?;
        let years_pattern = Regex::new(lexicon.retention_years_pattern)
            .context("invalid retention years pattern")?;
        Ok(Self {
            third_party: GroupMatcher::new(lexicon, GroupId::ThirdParty)?,
            business_entity: GroupMatcher::new(lexicon, GroupId::BusinessEntity)?,
            sensitive: GroupMatcher::new(lexicon, GroupId::SensitiveData)?,
            marketing: GroupMatcher::new(lexicon, GroupId::Marketing)?,
            categories: GroupMatcher::new(lexicon, GroupId::DataCategory)?,
            indefinite: GroupMatcher::new(lexicon, GroupId::IndefiniteRetention)?,
            purpose: GroupMatcher::new(lexicon, GroupId::PurposeFulfilment)?,
            opt_out: GroupMatcher::new(lexicon, GroupId::OptOut)?,
            anonymization: GroupMatcher::new(lexicon, GroupId::Anonymization)?,
            years_pattern,
            years_rule: lexicon.retention_years,
        })
    }

    /// Largest non-zero `<N>년` mention, if any.
    fn max_years(&self, text: &str) -> Option<u32> {
        self.years_pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
            .filter(|years| *years > 0)
            .max()
    }

    fn retention(&self, text: &str) -> (usize, i32, RetentionNote) {
        let indefinite_hits = self.indefinite.occurrences(text);
        if indefinite_hits > 0 {
            return (
                indefinite_hits,
                self.indefinite.points(indefinite_hits),
                RetentionNote::Indefinite,
            );
        }
        let rule = &self.years_rule;
        let mentions = self.years_pattern.find_iter(text).count();
        let (points, note) = match self.max_years(text) {
            Some(years) if years >= rule.long_term_years => {
                (rule.long_term_points, RetentionNote::AtLeast(years))
            }
            Some(years) if years >= rule.short_term_years => {
                (rule.short_term_points, RetentionNote::Within(years))
            }
            _ => (0, RetentionNote::Unspecified),
        };
        let note = if self.purpose.any(text) {
            RetentionNote::PurposeFulfilled
        } else {
            note
        };
        (mentions, points, note)
    }
}

/// Local, offline, keyword-weighted scorer. Total over every string input.
#[derive(Clone)]
pub struct HeuristicScorer {
    lexicon: Arc<CompiledLexicon>,
    thresholds: RiskThresholds,
}

impl Default for HeuristicScorer {
    fn default() -> Self {
        Self {
            lexicon: Arc::clone(&BUILTIN),
            thresholds: RiskThresholds::default(),
        }
    }
}

impl HeuristicScorer {
    /// Scorer backed by the built-in lexicon.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scorer backed by a caller-provided lexicon.
    pub fn with_lexicon(lexicon: &Lexicon) -> Result<Self> {
        Ok(Self {
            lexicon: Arc::new(CompiledLexicon::compile(lexicon)?),
            thresholds: RiskThresholds::default(),
        })
    }

    /// Score text into the canonical result shape.
    pub fn score(&self, text: &str) -> AnalysisResult {
        self.score_detailed(text).result
    }

    /// Score text and keep the per-factor breakdown.
    #[instrument(name = "heuristic_score", skip(self, text), fields(input_len = text.len()))]
    pub fn score_detailed(&self, text: &str) -> HeuristicReport {
        if is_blank(text) {
            return HeuristicReport {
                result: AnalysisResult::no_content(),
                raw_total: 0,
                retention: None,
                contributions: Vec::new(),
            };
        }

        let lex = &*self.lexicon;
        let mut contributions = Vec::with_capacity(7);

        let third_hits = lex.third_party.occurrences(text);
        contributions.push(FactorContribution {
            factor: Factor::ThirdParty,
            hits: third_hits,
            points: lex.third_party.points(third_hits),
        });

        let sensitive_hits = lex.sensitive.occurrences(text);
        contributions.push(FactorContribution {
            factor: Factor::SensitiveData,
            hits: sensitive_hits,
            points: lex.sensitive.points(sensitive_hits),
        });

        let marketing_hits = lex.marketing.occurrences(text);
        contributions.push(FactorContribution {
            factor: Factor::Marketing,
            hits: marketing_hits,
            points: lex.marketing.points(marketing_hits),
        });

        let categories = lex.categories.distinct(text);
        contributions.push(FactorContribution {
            factor: Factor::DataCategories,
            hits: categories,
            points: lex.categories.points(categories),
        });

        let (retention_hits, retention_points, retention_note) = lex.retention(text);
        contributions.push(FactorContribution {
            factor: Factor::Retention,
            hits: retention_hits,
            points: retention_points,
        });

        let opt_out_hits = lex.opt_out.occurrences(text);
        contributions.push(FactorContribution {
            factor: Factor::OptOut,
            hits: opt_out_hits,
            points: lex.opt_out.points(opt_out_hits),
        });

        let anon_hits = lex.anonymization.occurrences(text);
        contributions.push(FactorContribution {
            factor: Factor::Anonymization,
            hits: anon_hits,
            points: lex.anonymization.points(anon_hits),
        });

        let raw_total: i32 = contributions.iter().map(|c| c.points).sum();
        let score = clamp_score(i64::from(raw_total));
        let label = RiskLabel::from_score_with_thresholds(score, &self.thresholds);

        let business_mentions = lex.business_entity.occurrences(text);
        let mut bullets = vec![
            third_party_bullet(third_hits, business_mentions),
            format!("Sensitive data included: {}", yes_no(sensitive_hits > 0)),
            format!("Marketing/advertising use: {}", yes_no(marketing_hits > 0)),
            format!("Collected data categories: {categories} detected"),
            format!("Retention period: {retention_note}"),
        ];
        let mitigations: Vec<&str> = [
            (opt_out_hits > 0).then_some("consent refusal/withdrawal notice"),
            (anon_hits > 0).then_some("anonymization/pseudonymization"),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !mitigations.is_empty() {
            bullets.push(format!("Mitigating factors: {}", mitigations.join(", ")));
        }

        debug!(raw_total, score, label = %label, "heuristic scoring completed");

        HeuristicReport {
            result: AnalysisResult::new(score, label.as_str(), bullets),
            raw_total,
            retention: Some(retention_note),
            contributions,
        }
    }
}

#[async_trait::async_trait]
impl Analyzer for HeuristicScorer {
    async fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalyzerError> {
        Ok(self.score(text))
    }
}

fn third_party_bullet(hits: usize, business_mentions: usize) -> String {
    let presence = if hits > 0 { "present" } else { "none" };
    if business_mentions > 0 {
        format!(
            "Third-party sharing/outsourcing: {presence} (business entities mentioned ~{business_mentions} times)"
        )
    } else {
        format!("Third-party sharing/outsourcing: {presence}")
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn points_for(report: &HeuristicReport, factor: Factor) -> i32 {
        report
            .contributions
            .iter()
            .find(|c| c.factor == factor)
            .map(|c| c.points)
            .unwrap_or_default()
    }

    #[test]
    fn empty_and_blank_text_yield_no_content() {
        let scorer = HeuristicScorer::new();
        for text in ["", "   ", "\n\t ", "\u{feff}  \n"] {
            let result = scorer.score(text);
            assert_eq!(result, AnalysisResult::no_content());
            assert_eq!(result.label, "no content");
            assert!(result.bullets.is_empty());
        }
    }

    #[test]
    fn custom_lexicon_changes_weights() {
        let groups: Vec<KeywordGroup> = Lexicon::builtin()
            .groups
            .iter()
            .map(|group| match group.id {
                GroupId::Marketing => KeywordGroup {
                    rule: ScoringRule::Flat { points: 40 },
                    ..*group
                },
                _ => *group,
            })
            .collect();
        let lexicon = Lexicon {
            groups: Box::leak(groups.into_boxed_slice()),
            ..Lexicon::builtin()
        };
        let scorer = HeuristicScorer::with_lexicon(&lexicon).unwrap();
        let result = scorer.score("광고");
        assert_eq!(result.score, 40);
        assert_eq!(result.label, "moderate");
        assert_eq!(HeuristicScorer::new().score("광고").score, 15);
    }

    #[test]
    fn invalid_custom_lexicon_is_rejected() {
        let groups: Vec<KeywordGroup> = Lexicon::builtin()
            .groups
            .iter()
            .filter(|group| group.id != GroupId::OptOut)
            .copied()
            .collect();
        let lexicon = Lexicon {
            groups: Box::leak(groups.into_boxed_slice()),
            ..Lexicon::builtin()
        };
        assert!(HeuristicScorer::with_lexicon(&lexicon).is_err());
    }

    #[test]
    fn third_party_points_are_capped() {
        let scorer = HeuristicScorer::new();
        let report = scorer.score_detailed(&"위탁 ".repeat(10));
        assert_eq!(points_for(&report, Factor::ThirdParty), 30);
    }

    #[test]
    fn overlapping_third_party_terms_inflate_counts() {
        // `제3자` also contains `제3`; both count.
        let report = HeuristicScorer::new().score_detailed("제3자");
        let third = &report.contributions[0];
        assert_eq!(third.hits, 2);
        assert_eq!(third.points, 10);
    }

    #[test]
    fn sensitive_and_marketing_are_flat_bonuses() {
        let report = HeuristicScorer::new().score_detailed("지문 지문 지문, 광고 광고");
        assert_eq!(points_for(&report, Factor::SensitiveData), 25);
        assert_eq!(points_for(&report, Factor::Marketing), 15);
        assert_eq!(report.result.score, 40);
        assert_eq!(report.result.label, "moderate");
    }

    #[test]
    fn data_categories_count_distinct_terms_including_nested_ones() {
        let report = HeuristicScorer::new().score_detailed("휴대전화, 휴대전화, 이메일");
        let categories = &report.contributions[3];
        assert_eq!(categories.factor, Factor::DataCategories);
        // 휴대전화 and the nested 전화, plus 이메일.
        assert_eq!(categories.hits, 3);
        assert_eq!(categories.points, 6);
    }

    #[test]
    fn data_category_points_are_capped() {
        let text = "이름 성명 생년월일 주소 전화 이메일 계좌 카드 위치 쿠키 결제 기기";
        let report = HeuristicScorer::new().score_detailed(text);
        assert_eq!(report.contributions[3].hits, 12);
        assert_eq!(points_for(&report, Factor::DataCategories), 20);
    }

    #[test]
    fn retention_uses_largest_year_mention() {
        let report = HeuristicScorer::new().score_detailed("보관: 5년, 일부 2년");
        assert_eq!(points_for(&report, Factor::Retention), 10);
        assert_eq!(report.retention, Some(RetentionNote::AtLeast(5)));
        assert!(report
            .result
            .bullets
            .contains(&"Retention period: 5 years or more".to_string()));
    }

    #[test]
    fn short_retention_adds_smaller_bonus() {
        let report = HeuristicScorer::new().score_detailed("보관 기간은 2 년입니다");
        assert_eq!(points_for(&report, Factor::Retention), 5);
        assert_eq!(report.retention, Some(RetentionNote::Within(2)));
    }

    #[test]
    fn zero_years_is_ignored() {
        let report = HeuristicScorer::new().score_detailed("0년 보관");
        assert_eq!(points_for(&report, Factor::Retention), 0);
        assert_eq!(report.retention, Some(RetentionNote::Unspecified));
    }

    #[test]
    fn indefinite_retention_overrides_years() {
        let report = HeuristicScorer::new().score_detailed("5년 보관 후 영구 보관");
        assert_eq!(points_for(&report, Factor::Retention), 20);
        assert_eq!(report.retention, Some(RetentionNote::Indefinite));
    }

    #[test]
    fn purpose_fulfilment_overrides_note_but_not_points() {
        let report = HeuristicScorer::new().score_detailed("최대 5년, 목적 달성 시 파기");
        assert_eq!(points_for(&report, Factor::Retention), 10);
        assert_eq!(report.retention, Some(RetentionNote::PurposeFulfilled));
        assert!(report
            .result
            .bullets
            .contains(&"Retention period: destroyed upon purpose fulfillment".to_string()));
    }

    #[test]
    fn mitigations_can_drive_total_negative_before_clamp() {
        let report = HeuristicScorer::new().score_detailed("동의 거부 가능, 가명처리");
        assert_eq!(report.raw_total, -15);
        assert_eq!(report.result.score, 0);
        assert_eq!(
            report.result.bullets.last().map(String::as_str),
            Some("Mitigating factors: consent refusal/withdrawal notice, anonymization/pseudonymization")
        );
    }

    #[test]
    fn business_entities_are_reported_in_third_party_bullet() {
        let result = HeuristicScorer::new().score("주식회사 가나와 ㈜다라에 제공");
        assert_eq!(
            result.bullets[0],
            "Third-party sharing/outsourcing: present (business entities mentioned ~2 times)"
        );
    }

    #[test]
    fn bullets_without_mitigations_have_five_entries() {
        let result = HeuristicScorer::new().score("hello world");
        assert_eq!(
            result.bullets,
            vec![
                "Third-party sharing/outsourcing: none",
                "Sensitive data included: no",
                "Marketing/advertising use: no",
                "Collected data categories: 0 detected",
                "Retention period: unspecified/general",
            ]
        );
        assert_eq!(result.score, 0);
        assert_eq!(result.label, "low");
    }

    #[test]
    fn heuristic_analyzer_never_fails() {
        let scorer = HeuristicScorer::new();
        let result = futures::executor::block_on(Analyzer::analyze(&scorer, "광고")).unwrap();
        assert_eq!(result.score, 15);
    }

    proptest! {
        #[test]
        fn score_is_always_in_range(text in ".{0,256}") {
            let result = HeuristicScorer::new().score(&text);
            prop_assert!(result.score <= 100);
        }

        #[test]
        fn scoring_is_idempotent(
            text in proptest::collection::vec(
                prop_oneof![
                    Just("제3자 "), Just("위탁 "), Just("광고 "), Just("지문 "),
                    Just("이메일 "), Just("5년 "), Just("영구 "), Just("철회 "),
                    Just("익명 "), Just("목적 달성 시 "), Just("text "),
                ],
                0..40,
            ).prop_map(|parts| parts.concat())
        ) {
            let scorer = HeuristicScorer::new();
            prop_assert_eq!(scorer.score_detailed(&text), scorer.score_detailed(&text));
        }
    }
}
