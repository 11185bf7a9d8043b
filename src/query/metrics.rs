//! Metric resolution: canonical stat keys to graph fields.
//!
//! Each stat resolves through one table that says where its value lives: a
//! pre-aggregated field on the summary node, an aggregation over per-match
//! detail rows, or a ratio of two summary fields. Builders consult the table
//! instead of hard-coding field names, so adding a stat is a table row.

use crate::error::QueryError;

/// How a metric's value is obtained from the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricSource {
    /// Pre-aggregated field on the `Player` or `Team` summary node.
    Summary { field: &'static str },
    /// `sum()` over a field on per-match detail rows.
    DetailSum { field: &'static str },
    /// Count of detail rows satisfying a predicate on one field.
    DetailCountWhere { field: &'static str, at_least: i64 },
    /// Ratio of two summary fields, guarded against a zero denominator.
    Ratio {
        numerator: &'static str,
        denominator: &'static str,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct MetricSpec {
    pub key: &'static str,
    pub source: MetricSource,
    /// Field on the per-match detail row, when the metric can be filtered.
    pub detail_field: Option<&'static str>,
    /// True for team-level metrics that live on `Team` rather than `Player`.
    pub team_level: bool,
}

use MetricSource::{DetailCountWhere, DetailSum, Ratio, Summary};

pub static METRICS: &[MetricSpec] = &[
    MetricSpec {
        key: "Goals",
        source: Summary { field: "totalGoals" },
        detail_field: Some("goals"),
        team_level: false,
    },
    MetricSpec {
        key: "Open Play Goals",
        source: DetailSum { field: "openPlayGoals" },
        detail_field: Some("openPlayGoals"),
        team_level: false,
    },
    MetricSpec {
        key: "Assists",
        source: Summary { field: "totalAssists" },
        detail_field: Some("assists"),
        team_level: false,
    },
    MetricSpec {
        key: "Appearances",
        source: Summary { field: "totalAppearances" },
        detail_field: Some("appearances"),
        team_level: false,
    },
    MetricSpec {
        key: "Minutes",
        source: Summary { field: "totalMinutes" },
        detail_field: Some("minutes"),
        team_level: false,
    },
    MetricSpec {
        key: "Clean Sheets",
        source: Summary { field: "totalCleanSheets" },
        detail_field: Some("cleanSheets"),
        team_level: false,
    },
    MetricSpec {
        key: "Goals Conceded",
        source: Summary { field: "totalConceded" },
        detail_field: Some("conceded"),
        team_level: true,
    },
    MetricSpec {
        key: "Yellow Cards",
        source: Summary { field: "totalYellowCards" },
        detail_field: Some("yellowCards"),
        team_level: false,
    },
    MetricSpec {
        key: "Red Cards",
        source: Summary { field: "totalRedCards" },
        detail_field: Some("redCards"),
        team_level: false,
    },
    MetricSpec {
        key: "Own Goals",
        source: Summary { field: "totalOwnGoals" },
        detail_field: Some("ownGoals"),
        team_level: false,
    },
    MetricSpec {
        key: "Penalties",
        source: Summary { field: "totalPenalties" },
        detail_field: Some("penalties"),
        team_level: false,
    },
    MetricSpec {
        key: "Hat-tricks",
        source: DetailCountWhere {
            field: "goals",
            at_least: 3,
        },
        detail_field: Some("goals"),
        team_level: false,
    },
    MetricSpec {
        key: "Man of the Match",
        source: Summary { field: "totalMotm" },
        detail_field: Some("motm"),
        team_level: false,
    },
    MetricSpec {
        key: "Goals per Appearance",
        source: Ratio {
            numerator: "totalGoals",
            denominator: "totalAppearances",
        },
        detail_field: None,
        team_level: false,
    },
    MetricSpec {
        key: "Minutes per Goal",
        source: Ratio {
            numerator: "totalMinutes",
            denominator: "totalGoals",
        },
        detail_field: None,
        team_level: false,
    },
    MetricSpec {
        key: "Clean Sheets per Appearance",
        source: Ratio {
            numerator: "totalCleanSheets",
            denominator: "totalAppearances",
        },
        detail_field: None,
        team_level: false,
    },
    MetricSpec {
        key: "Wins",
        source: Summary { field: "wins" },
        detail_field: Some("won"),
        team_level: true,
    },
    MetricSpec {
        key: "Draws",
        source: Summary { field: "draws" },
        detail_field: Some("drawn"),
        team_level: true,
    },
    MetricSpec {
        key: "Losses",
        source: Summary { field: "losses" },
        detail_field: Some("lost"),
        team_level: true,
    },
    MetricSpec {
        key: "Points",
        source: Summary { field: "points" },
        detail_field: None,
        team_level: true,
    },
    MetricSpec {
        key: "Win Rate",
        source: Ratio {
            numerator: "wins",
            denominator: "gamesPlayed",
        },
        detail_field: None,
        team_level: true,
    },
];

/// Look up a metric spec by canonical key.
pub fn metric_spec(key: &str) -> Result<&'static MetricSpec, QueryError> {
    METRICS
        .iter()
        .find(|m| m.key == key)
        .ok_or_else(|| QueryError::UnknownMetric {
            metric: key.to_string(),
        })
}

impl MetricSpec {
    /// Whether answering for this metric alone needs per-match detail rows.
    pub fn needs_detail(&self) -> bool {
        matches!(self.source, DetailSum { .. } | DetailCountWhere { .. })
    }

    /// Render the value expression against a summary node bound as `alias`.
    ///
    /// Ratios divide inside a `CASE` so a zero denominator yields 0.0 rather
    /// than a division error.
    pub fn summary_expression(&self, alias: &str) -> String {
        match self.source {
            Summary { field } => format!("{alias}.{field}"),
            Ratio {
                numerator,
                denominator,
            } => format!(
                "CASE WHEN {alias}.{denominator} = 0 OR {alias}.{denominator} IS NULL \
                 THEN 0.0 ELSE toFloat({alias}.{numerator}) / {alias}.{denominator} END"
            ),
            // Detail-backed metrics have no summary rendering; callers route
            // them through detail_expression instead.
            DetailSum { field } | DetailCountWhere { field, .. } => format!("{alias}.{field}"),
        }
    }

    /// Render the aggregate expression against detail rows bound as `alias`.
    pub fn detail_expression(&self, alias: &str) -> Result<String, QueryError> {
        match self.source {
            DetailCountWhere { field, at_least } => Ok(format!(
                "count(CASE WHEN {alias}.{field} >= {at_least} THEN 1 END)"
            )),
            _ => {
                let field = self.detail_field.ok_or_else(|| QueryError::UnknownMetric {
                    metric: format!("{} (per-match)", self.key),
                })?;
                Ok(format!("coalesce(sum({alias}.{field}), 0)"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goals_resolve_to_summary_field() {
        let spec = metric_spec("Goals").unwrap();
        assert_eq!(spec.summary_expression("p"), "p.totalGoals");
        assert!(!spec.needs_detail());
    }

    #[test]
    fn hat_tricks_count_detail_rows() {
        let spec = metric_spec("Hat-tricks").unwrap();
        assert!(spec.needs_detail());
        assert_eq!(
            spec.detail_expression("m").unwrap(),
            "count(CASE WHEN m.goals >= 3 THEN 1 END)"
        );
    }

    #[test]
    fn ratio_guards_zero_denominator() {
        let spec = metric_spec("Goals per Appearance").unwrap();
        let expr = spec.summary_expression("p");
        assert!(expr.contains("CASE WHEN p.totalAppearances = 0"));
        assert!(expr.contains("toFloat(p.totalGoals) / p.totalAppearances"));
    }

    #[test]
    fn unknown_metric_is_an_error() {
        let err = metric_spec("Tackles").unwrap_err();
        assert!(matches!(err, QueryError::UnknownMetric { metric } if metric == "Tackles"));
    }

    #[test]
    fn every_key_is_unique() {
        for (i, spec) in METRICS.iter().enumerate() {
            assert!(
                METRICS[i + 1..].iter().all(|other| other.key != spec.key),
                "duplicate metric key {}",
                spec.key
            );
        }
    }
}
