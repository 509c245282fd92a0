//! Report rendering.

use std::fmt::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::analyze::Analysis;
use super::plan::ResearchPlan;

/// Points shown in a summary report.
const SUMMARY_POINTS: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    #[default]
    Comprehensive,
    Summary,
    Technical,
}

impl ReportType {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportType::Comprehensive => "comprehensive",
            ReportType::Summary => "summary",
            ReportType::Technical => "technical",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "comprehensive" => Ok(ReportType::Comprehensive),
            "summary" => Ok(ReportType::Summary),
            "technical" => Ok(ReportType::Technical),
            other => Err(format!(
                "unknown report type '{other}' (expected comprehensive, summary or technical)"
            )),
        }
    }
}

/// Sibling document describing a written report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub topic: String,
    pub report_type: ReportType,
    pub generated_at: DateTime<Utc>,
    pub content_length: usize,
    pub report_path: PathBuf,
}

/// Render the markdown report for `plan` and `analysis`.
pub fn render(
    plan: &ResearchPlan,
    analysis: &Analysis,
    report_type: ReportType,
    generated_at: DateTime<Utc>,
) -> String {
    let mut doc = String::new();
    let generated = generated_at.format("%Y-%m-%d %H:%M:%S UTC");

    // Writing to a String cannot fail.
    let _ = match report_type {
        ReportType::Comprehensive => comprehensive(&mut doc, plan, analysis, &generated),
        ReportType::Summary => summary(&mut doc, plan, analysis, &generated),
        ReportType::Technical => technical(&mut doc, plan, analysis, &generated),
    };
    doc
}

fn comprehensive(
    doc: &mut String,
    plan: &ResearchPlan,
    analysis: &Analysis,
    generated: &dyn fmt::Display,
) -> fmt::Result {
    writeln!(doc, "# Research Report: {}", plan.topic)?;
    writeln!(doc)?;
    writeln!(doc, "*Generated {generated} (comprehensive)*")?;
    writeln!(doc)?;
    writeln!(doc, "## Executive Summary")?;
    writeln!(doc)?;
    writeln!(doc, "{}", analysis.summary)?;
    writeln!(doc)?;
    writeln!(doc, "## Research Objectives")?;
    writeln!(doc)?;
    bullets(doc, &plan.objectives)?;
    writeln!(doc)?;
    writeln!(doc, "## Methodology")?;
    writeln!(doc)?;
    writeln!(
        doc,
        "{} search queries were issued, one per line below; the results were analyzed with the `{}` focus.",
        plan.search_queries.len(),
        analysis.focus
    )?;
    writeln!(doc)?;
    bullets(doc, &plan.search_queries)?;
    writeln!(doc)?;
    writeln!(doc, "## Key Findings")?;
    writeln!(doc)?;
    findings(doc, &analysis.points)?;
    writeln!(doc)?;
    writeln!(doc, "## Recurring Terms")?;
    writeln!(doc)?;
    let terms: Vec<String> = analysis
        .top_terms
        .iter()
        .map(|t| format!("{} ({})", t.term, t.count))
        .collect();
    if terms.is_empty() {
        writeln!(doc, "_None._")?;
    } else {
        writeln!(doc, "{}", terms.join(", "))?;
    }
    writeln!(doc)?;
    writeln!(doc, "## Conclusion")?;
    writeln!(doc)?;
    writeln!(
        doc,
        "This report covered {} objectives for {} using {} sources.",
        plan.objectives.len(),
        plan.topic,
        analysis.source_count
    )
}

fn summary(
    doc: &mut String,
    plan: &ResearchPlan,
    analysis: &Analysis,
    generated: &dyn fmt::Display,
) -> fmt::Result {
    writeln!(doc, "# {}: Summary", plan.topic)?;
    writeln!(doc)?;
    writeln!(doc, "*Generated {generated}*")?;
    writeln!(doc)?;
    writeln!(doc, "{}", analysis.summary)?;
    writeln!(doc)?;
    writeln!(doc, "## Highlights")?;
    writeln!(doc)?;
    let top: Vec<String> = analysis
        .points
        .iter()
        .take(SUMMARY_POINTS)
        .cloned()
        .collect();
    findings(doc, &top)
}

fn technical(
    doc: &mut String,
    plan: &ResearchPlan,
    analysis: &Analysis,
    generated: &dyn fmt::Display,
) -> fmt::Result {
    writeln!(doc, "# Technical Report: {}", plan.topic)?;
    writeln!(doc)?;
    writeln!(doc, "*Generated {generated}*")?;
    writeln!(doc)?;
    writeln!(doc, "## Scope")?;
    writeln!(doc)?;
    if plan.focus_areas.is_empty() {
        writeln!(doc, "General survey, no focus areas.")?;
    } else {
        bullets(doc, &plan.focus_areas)?;
    }
    writeln!(doc)?;
    writeln!(doc, "## Query Log")?;
    writeln!(doc)?;
    for (i, query) in plan.search_queries.iter().enumerate() {
        writeln!(doc, "{}. `{}`", i + 1, query)?;
    }
    writeln!(doc)?;
    writeln!(doc, "## Findings")?;
    writeln!(doc)?;
    findings(doc, &analysis.points)?;
    writeln!(doc)?;
    writeln!(doc, "## Term Frequency")?;
    writeln!(doc)?;
    writeln!(doc, "| Term | Count |")?;
    writeln!(doc, "|------|-------|")?;
    for term in &analysis.top_terms {
        writeln!(doc, "| {} | {} |", term.term, term.count)?;
    }
    writeln!(doc)?;
    writeln!(doc, "## Statistics")?;
    writeln!(doc)?;
    writeln!(doc, "- Focus: {}", analysis.focus)?;
    writeln!(doc, "- Sources: {}", analysis.source_count)?;
    writeln!(doc, "- Words: {}", analysis.word_count)?;
    writeln!(doc, "- Sentences: {}", analysis.sentence_count)
}

fn bullets(doc: &mut String, items: &[String]) -> fmt::Result {
    for item in items {
        writeln!(doc, "- {item}")?;
    }
    Ok(())
}

fn findings(doc: &mut String, points: &[String]) -> fmt::Result {
    if points.is_empty() {
        return writeln!(doc, "_No findings._");
    }
    for (i, point) in points.iter().enumerate() {
        writeln!(doc, "{}. {}", i + 1, point)?;
    }
    Ok(())
}
