//! Research plan synthesis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Created,
}

/// Objectives and search queries for one topic.
///
/// Fully determined by the topic and focus areas, apart from `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchPlan {
    pub topic: String,
    pub created_at: DateTime<Utc>,
    pub focus_areas: Vec<String>,
    pub objectives: Vec<String>,
    pub search_queries: Vec<String>,
    pub status: PlanStatus,
}

impl ResearchPlan {
    pub fn new(topic: &str, focus_areas: &[String], created_at: DateTime<Utc>) -> Self {
        let topic = topic.trim();

        let mut objectives = vec![
            format!("Understand the fundamentals of {topic}"),
            format!("Identify recent developments in {topic}"),
            format!("Assess the key challenges facing {topic}"),
            format!("Outline the future outlook for {topic}"),
        ];
        let mut search_queries = vec![
            format!("{topic} overview"),
            format!("{topic} latest developments"),
            format!("{topic} key challenges"),
            format!("{topic} future trends"),
        ];

        for focus in focus_areas {
            objectives.push(format!("Investigate {focus} in the context of {topic}"));
            search_queries.push(format!("{topic} {focus}"));
        }

        Self {
            topic: topic.to_string(),
            created_at,
            focus_areas: focus_areas.to_vec(),
            objectives,
            search_queries,
            status: PlanStatus::Created,
        }
    }
}

/// Split a comma-separated focus list, dropping blanks.
pub fn parse_focus_areas(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_focus_gives_four_and_four() {
        let plan = ResearchPlan::new("Quantum Computing", &[], Utc::now());
        assert_eq!(plan.search_queries.len(), 4);
        assert_eq!(plan.objectives.len(), 4);
        assert_eq!(plan.search_queries[0], "Quantum Computing overview");
    }

    #[test]
    fn each_focus_adds_one_query_and_objective() {
        let focus = parse_focus_areas("hardware, error correction,,");
        let plan = ResearchPlan::new("Quantum Computing", &focus, Utc::now());
        assert_eq!(plan.focus_areas, vec!["hardware", "error correction"]);
        assert_eq!(plan.search_queries.len(), 6);
        assert_eq!(plan.objectives.len(), 6);
        assert_eq!(plan.search_queries[5], "Quantum Computing error correction");
        assert_eq!(
            plan.objectives[4],
            "Investigate hardware in the context of Quantum Computing"
        );
    }

    #[test]
    fn json_round_trip_is_structurally_equal() {
        let plan = ResearchPlan::new("Rust", &parse_focus_areas("async"), Utc::now());
        let json = serde_json::to_string(&plan).unwrap();
        let back: ResearchPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(plan, back);
    }
}
