use std::collections::HashMap;

use anyhow::{Context, Result, bail};
use serde_yaml::{Number, Value};

use crate::model::{Direction, ThresholdRecord, ThresholdRule, UNKNOWN_BOUND};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricMapping {
    pub handler_name: &'static str,
    pub reported_key: &'static str,
    pub direction: Direction,
}

pub const METRIC_MAPPINGS: &[MetricMapping] = &[
    MetricMapping {
        handler_name: "ClusterPFHandler",
        reported_key: "total",
        direction: Direction::LessThan,
    },
    MetricMapping {
        handler_name: "ErrorRateHandler",
        reported_key: "Error",
        direction: Direction::GreaterThan,
    },
    MetricMapping {
        handler_name: "Q30Handler",
        reported_key: "percent_Q30",
        direction: Direction::LessThan,
    },
    MetricMapping {
        handler_name: "ReadsPerSampleHandler",
        reported_key: "mqc-generalstats-bcl2fastq-total",
        direction: Direction::LessThan,
    },
];

pub fn index_records(records: &[ThresholdRecord]) -> HashMap<&str, &ThresholdRecord> {
    records
        .iter()
        .map(|record| (record.name.as_str(), record))
        .collect()
}

// Handlers not in the mapping are never inspected.
pub fn convert_to_rules(
    records: &[ThresholdRecord],
    mappings: &[MetricMapping],
) -> Result<Vec<ThresholdRule>> {
    let by_name = index_records(records);

    mappings
        .iter()
        .map(|mapping| {
            let record = by_name
                .get(mapping.handler_name)
                .with_context(|| format!("missing required metric: {}", mapping.handler_name))?;

            Ok(ThresholdRule {
                reported_key: mapping.reported_key.to_string(),
                direction: mapping.direction,
                warn: clause_bound(record.warning.as_ref(), mapping.handler_name, "warning")?,
                fail: clause_bound(record.error.as_ref(), mapping.handler_name, "error")?,
            })
        })
        .collect()
}

fn clause_bound(
    bound: Option<&Value>,
    handler_name: &str,
    field: &str,
) -> Result<Option<Number>> {
    match bound {
        Some(Value::Number(number)) => Ok(Some(number.clone())),
        Some(Value::String(text)) if text == UNKNOWN_BOUND => Ok(None),
        Some(other) => bail!("invalid {field} bound for {handler_name}: {other:?}"),
        None => bail!("{handler_name} has no {field} bound"),
    }
}
