use anyhow::{Context, Result};
use tracing::info;

use super::*;
use crate::cli::QcThresholdsArgs;
use crate::commands::metadata::{ReadLayoutSource, RunFolder, first_read_length};
use crate::model::FormattingRules;
use crate::util::write_yaml;

pub fn run(args: QcThresholdsArgs) -> Result<()> {
    let run_type = RunType {
        instrument_and_reagent: args.instrument_and_reagent.clone(),
        read_length: resolve_read_length(&args)?,
    };

    let records = load_threshold_records(&args.config, &run_type)?;
    let rules = convert_to_rules(&records, METRIC_MAPPINGS)?;
    let formatting = FormattingRules::from_rules(rules);

    write_yaml(&args.output, &formatting)?;
    info!(
        path = %args.output.display(),
        rules = formatting.table_cond_formatting_rules.len(),
        "wrote qc thresholds"
    );

    Ok(())
}

fn resolve_read_length(args: &QcThresholdsArgs) -> Result<Option<u32>> {
    if let Some(text) = &args.read_length {
        return parse_read_length(text).map(Some);
    }

    let run_folder = RunFolder::new(&args.runfolder, ReadLayoutSource::RunInfo);
    let read_length = run_folder
        .read_layout()
        .with_context(|| format!("failed to read run layout in {}", args.runfolder.display()))?
        .as_ref()
        .and_then(first_read_length);

    Ok(read_length)
}
