use serde::Deserialize;

/// How session durations are summed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeAccounting {
    /// Sum the duration of every fetched row. A session visible under two
    /// language spellings contributes its duration twice while being
    /// counted once.
    #[default]
    PerSourceRow,
    /// Sum one duration per distinct session identity.
    PerSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AggregationConfig {
    #[serde(default)]
    pub time_accounting: TimeAccounting,
    #[serde(default = "use_materialized_view_default")]
    pub use_materialized_view: bool,
}

fn use_materialized_view_default() -> bool { true }

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            time_accounting: TimeAccounting::default(),
            use_materialized_view: use_materialized_view_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_row_accounting() {
        let config: AggregationConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AggregationConfig::default());
        assert_eq!(config.time_accounting, TimeAccounting::PerSourceRow);

        let config: AggregationConfig =
            serde_json::from_str(r#"{"time_accounting": "per_session"}"#)
                .unwrap();
        assert_eq!(config.time_accounting, TimeAccounting::PerSession);
    }
}
