use std::fmt::Write;

use crate::scanner::{heuristic::HeuristicReport, AnalysisResult};

/// Format styles supported by the default renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
    Yaml,
}

/// Produce a report string from an `AnalysisResult` using the desired format.
pub fn render_result(result: &AnalysisResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Human => render_human(result),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(result)?),
    }
}

/// Render a heuristic report; human output gains a per-factor breakdown.
pub fn render_heuristic(report: &HeuristicReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Human => {
            let mut out = render_human(&report.result)?;
            if report.contributions.is_empty() {
                return Ok(out);
            }
            writeln!(out)?;
            writeln!(out, "Breakdown:")?;
            for contribution in &report.contributions {
                let factor = serde_json::to_value(contribution.factor)?;
                writeln!(
                    out,
                    "  - {factor:>16}: {points:+} (hits: {hits})",
                    factor = factor.as_str().unwrap_or_default(),
                    points = contribution.points,
                    hits = contribution.hits,
                )?;
            }
            writeln!(out, "\nRaw total: {}", report.raw_total)?;
            Ok(out)
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(report)?),
    }
}

fn render_human(result: &AnalysisResult) -> anyhow::Result<String> {
    let mut out = String::new();
    writeln!(out, "Risk Score: {} ({})", result.score, result.label)?;
    writeln!(out)?;

    if result.bullets.is_empty() {
        writeln!(out, "No findings.")?;
    } else {
        writeln!(out, "Findings:")?;
        for bullet in &result.bullets {
            writeln!(out, "  - {}", sanitize_bullet(bullet))?;
        }
    }
    Ok(out)
}

fn sanitize_bullet(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '\n' | '\r' => ' ',
            _ => c,
        })
        .collect()
}
