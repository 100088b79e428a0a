use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

use crate::model::ThresholdRecord;
use crate::util::read_yaml;

const DEFAULT_HANDLERS_KEY: &str = "default_handlers";
const HANDLERS_KEY: &str = "handlers";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunType {
    pub instrument_and_reagent: Option<String>,
    pub read_length: Option<u32>,
}

pub fn load_threshold_records(path: &Path, run_type: &RunType) -> Result<Vec<ThresholdRecord>> {
    let config: Value = read_yaml(path)?;

    match config {
        Value::Sequence(_) => {
            debug!(path = %path.display(), "reading plain handler list");
            serde_yaml::from_value(config)
                .with_context(|| format!("invalid handler list in {}", path.display()))
        }
        Value::Mapping(config) => resolve_handler_configs(&config, run_type)
            .with_context(|| format!("failed to resolve handlers from {}", path.display())),
        _ => bail!("{} is neither a handler list nor a keyed config", path.display()),
    }
}

pub fn resolve_handler_configs(config: &Mapping, run_type: &RunType) -> Result<Vec<ThresholdRecord>> {
    let instrument = run_type
        .instrument_and_reagent
        .as_deref()
        .context("keyed config requires an instrument and reagent key")?;
    let read_length = run_type
        .read_length
        .context("keyed config requires a read length")?;

    let Some(Value::Mapping(by_read_length)) = config.get(instrument) else {
        bail!("no thresholds configured for {instrument}");
    };

    let (matched_key, entry) = closest_read_length(by_read_length, read_length)
        .with_context(|| format!("no read length entries configured for {instrument}"))?;
    info!(
        instrument = %instrument,
        read_length,
        matched = %matched_key,
        "selected threshold configuration"
    );

    let mut records = parse_handlers(entry.get(HANDLERS_KEY))
        .with_context(|| format!("invalid handlers for {instrument} {matched_key}"))?;

    let defaults = parse_handlers(config.get(DEFAULT_HANDLERS_KEY))
        .context("invalid default handlers")?;
    for default in defaults {
        if !records.iter().any(|record| record.name == default.name) {
            records.push(default);
        }
    }

    Ok(records)
}

fn parse_handlers(value: Option<&Value>) -> Result<Vec<ThresholdRecord>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => Ok(serde_yaml::from_value(value.clone())?),
    }
}

// Keys are `151` or an inclusive `"36-51"`; ties go to the earliest key.
fn closest_read_length(by_read_length: &Mapping, read_length: u32) -> Option<(String, &Value)> {
    by_read_length
        .iter()
        .filter_map(|(key, value)| {
            let label = match key {
                Value::Number(number) => number.to_string(),
                Value::String(text) => text.clone(),
                _ => return None,
            };
            let (low, high) = parse_read_length_range(&label)?;
            let distance = if read_length < low {
                low - read_length
            } else {
                read_length.saturating_sub(high)
            };
            Some((distance, label, value))
        })
        .min_by_key(|(distance, _, _)| *distance)
        .map(|(_, label, value)| (label, value))
}

fn parse_read_length_range(label: &str) -> Option<(u32, u32)> {
    match label.split_once('-') {
        Some((low, high)) => {
            let low = low.trim().parse().ok()?;
            let high = high.trim().parse().ok()?;
            Some((low, high))
        }
        None => {
            let length = label.trim().parse().ok()?;
            Some((length, length))
        }
    }
}

pub fn parse_read_length(text: &str) -> Result<u32> {
    text.split('-')
        .next()
        .map(str::trim)
        .unwrap_or_default()
        .parse()
        .with_context(|| format!("invalid read length: {text}"))
}
