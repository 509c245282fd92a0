//! Deterministic analysis of raw search text.
//!
//! No capability is invoked here; the same results and focus always produce
//! the same analysis.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Maximum number of points kept by any focus mode.
const MAX_POINTS: usize = 10;
/// Number of frequent terms reported.
const TOP_TERMS: usize = 10;

const TREND_MARKERS: &[&str] = &[
    "trend", "growth", "growing", "increase", "increasing", "decline", "emerging", "future",
    "recent", "recently", "rising", "adoption", "forecast", "shift", "new",
];

const STOPWORDS: &[&str] = &[
    "about", "after", "also", "been", "being", "between", "both", "could", "does", "each", "from",
    "have", "here", "into", "more", "most", "other", "over", "such", "than", "that", "their",
    "them", "then", "there", "these", "they", "this", "those", "through", "very", "were", "what",
    "when", "where", "which", "while", "will", "with", "would", "your",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisFocus {
    #[default]
    KeyPoints,
    Trends,
    General,
}

impl AnalysisFocus {
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisFocus::KeyPoints => "key_points",
            AnalysisFocus::Trends => "trends",
            AnalysisFocus::General => "general",
        }
    }
}

impl fmt::Display for AnalysisFocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisFocus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "key_points" => Ok(AnalysisFocus::KeyPoints),
            "trends" => Ok(AnalysisFocus::Trends),
            "general" => Ok(AnalysisFocus::General),
            other => Err(format!(
                "unknown analysis focus '{other}' (expected key_points, trends or general)"
            )),
        }
    }
}

/// Raw output of one search query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub query: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermCount {
    pub term: String,
    pub count: usize,
}

/// Structured summary handed to the report stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub topic: String,
    pub focus: AnalysisFocus,
    pub summary: String,
    pub points: Vec<String>,
    pub top_terms: Vec<TermCount>,
    pub source_count: usize,
    pub word_count: usize,
    pub sentence_count: usize,
}

pub fn analyze(topic: &str, results: &[SearchResult], focus: AnalysisFocus) -> Analysis {
    let per_source: Vec<Vec<String>> = results.iter().map(|r| sentences(&r.content)).collect();
    let all: Vec<&String> = per_source.iter().flatten().collect();

    let word_count = results
        .iter()
        .map(|r| r.content.split_whitespace().count())
        .sum();
    let top_terms = top_terms(results);

    let points = match focus {
        AnalysisFocus::KeyPoints => {
            // Leading sentences carry the gist of each source.
            let leading = per_source.iter().flat_map(|s| s.iter().take(2));
            dedupe(leading, MAX_POINTS)
        }
        AnalysisFocus::Trends => dedupe(
            all.iter().copied().filter(|s| mentions_trend(s)),
            MAX_POINTS,
        ),
        AnalysisFocus::General => dedupe(per_source.iter().filter_map(|s| s.first()), MAX_POINTS),
    };

    let summary = summarize(topic, focus, results.len(), word_count, all.len(), &points, &top_terms);

    Analysis {
        topic: topic.to_string(),
        focus,
        summary,
        points,
        top_terms,
        source_count: results.len(),
        word_count,
        sentence_count: all.len(),
    }
}

fn summarize(
    topic: &str,
    focus: AnalysisFocus,
    sources: usize,
    words: usize,
    sentences: usize,
    points: &[String],
    terms: &[TermCount],
) -> String {
    let mut summary = format!(
        "Analyzed {sources} search results about {topic} ({words} words, {sentences} sentences)."
    );

    match focus {
        AnalysisFocus::KeyPoints => {
            summary.push_str(&format!(" Extracted {} key points.", points.len()));
        }
        AnalysisFocus::Trends if points.is_empty() => {
            summary.push_str(" No trend signals were found in the results.");
        }
        AnalysisFocus::Trends => {
            summary.push_str(&format!(" Found {} statements about trends.", points.len()));
        }
        AnalysisFocus::General => {
            let leading: Vec<&str> = terms.iter().take(3).map(|t| t.term.as_str()).collect();
            if !leading.is_empty() {
                summary.push_str(&format!(" Recurring themes: {}.", leading.join(", ")));
            }
        }
    }

    summary
}

/// Split text into trimmed sentences on `.`, `!` and `?`.
fn sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        if c == '\n' {
            push_sentence(&mut out, &mut current);
            continue;
        }
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            push_sentence(&mut out, &mut current);
        }
    }
    push_sentence(&mut out, &mut current);
    out
}

fn push_sentence(out: &mut Vec<String>, current: &mut String) {
    let sentence = current.trim();
    // Drop fragments like list markers or stray punctuation.
    if sentence.chars().filter(|c| c.is_alphanumeric()).count() >= 3 {
        out.push(sentence.to_string());
    }
    current.clear();
}

fn dedupe<'a>(items: impl Iterator<Item = &'a String>, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .filter(|s| seen.insert(s.to_lowercase()))
        .take(limit)
        .cloned()
        .collect()
}

fn mentions_trend(sentence: &str) -> bool {
    words(sentence).any(|w| TREND_MARKERS.contains(&w.as_str()))
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

/// Most frequent content words; ties broken alphabetically.
fn top_terms(results: &[SearchResult]) -> Vec<TermCount> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for word in results.iter().flat_map(|r| words(&r.content)) {
        if word.chars().count() > 3
            && !word.chars().all(|c| c.is_ascii_digit())
            && !STOPWORDS.contains(&word.as_str())
        {
            *counts.entry(word).or_default() += 1;
        }
    }

    let mut ranked: Vec<TermCount> = counts
        .into_iter()
        .map(|(term, count)| TermCount { term, count })
        .collect();
    // Stable sort keeps the alphabetical order of the BTreeMap for equal counts.
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(TOP_TERMS);
    ranked
}
