use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub pronunciation: f64,
    pub grammar: f64,
    pub fluency: f64,
    pub vocabulary: f64,
    pub overall: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummarySource {
    MaterializedView,
    #[default]
    Computed,
}

/// Outcome of one metric's sub-fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricStatus {
    #[default]
    Loaded,
    /// The sources answered but held no rows.
    Missing,
    /// The fetch failed; the metric carries its zero default.
    Failed(String),
}

impl MetricStatus {
    pub fn is_failed(&self) -> bool { matches!(self, Self::Failed(_)) }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricReport {
    pub sessions: MetricStatus,
    pub time: MetricStatus,
    pub scores: MetricStatus,
    pub vocabulary: MetricStatus,
    pub lessons: MetricStatus,
}

impl MetricReport {
    pub fn all(status: MetricStatus) -> Self {
        Self {
            sessions: status.clone(),
            time: status.clone(),
            scores: status.clone(),
            vocabulary: status.clone(),
            lessons: status,
        }
    }

    pub fn failed(&self) -> Vec<&'static str> {
        [
            ("sessions", &self.sessions),
            ("time", &self.time),
            ("scores", &self.scores),
            ("vocabulary", &self.vocabulary),
            ("lessons", &self.lessons),
        ]
        .into_iter()
        .filter(|(_, status)| status.is_failed())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Best-effort progress for one user and language.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub session_count: u64,
    pub total_time_seconds: i64,
    pub scores: ScoreSummary,
    pub vocabulary_count: u64,
    pub lessons_completed: u64,
    pub source: SummarySource,
    pub metrics: MetricReport,
}

impl ProgressSummary {
    /// Zeroed summary for a caller without an identity.
    pub fn empty() -> Self {
        Self {
            metrics: MetricReport::all(MetricStatus::Missing),
            ..Self::default()
        }
    }
}
