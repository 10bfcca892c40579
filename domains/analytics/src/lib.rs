pub mod analytics_service;
pub mod config;
pub mod error;
pub mod materialized_views;
pub mod models;
pub mod scores;
pub mod sources;

pub use analytics_service::ProgressAggregator;
pub use config::{AggregationConfig, TimeAccounting};
pub use error::AnalyticsError;
pub use models::{
    MetricReport, MetricStatus, ProgressSummary, ScoreSummary, SummarySource,
};
