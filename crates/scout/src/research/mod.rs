//! The research workflow: plan, search, analyze, report, index.

pub mod analyze;
pub mod error;
pub mod index;
pub mod pipeline;
pub mod plan;
pub mod report;

pub use analyze::{Analysis, AnalysisFocus, SearchResult, TermCount, analyze};
pub use error::{ErrorKind, PipelineError};
pub use index::{ResearchIndex, build_index};
pub use pipeline::{
    PipelineConfig, PipelineRun, ResearchPipeline, ResearchRequest, RunFailure, RunStage,
};
pub use plan::{PlanStatus, ResearchPlan, parse_focus_areas};
pub use report::{ReportMetadata, ReportType, render};
