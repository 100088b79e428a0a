use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::*;
use crate::cli::MetadataArgs;
use crate::model::{LabelMap, MetadataSummary};
use crate::util::write_text;

pub fn run(args: MetadataArgs) -> Result<()> {
    let summary = collect_summary(&args)?;
    let rendered = render_summary(&summary)?;

    match &args.output {
        Some(path) => {
            write_text(path, &rendered)?;
            info!(path = %path.display(), fields = summary.fields.len(), "wrote sequencing metadata");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(rendered.as_bytes())
                .context("failed to write sequencing metadata to stdout")?;
            stdout.flush()?;
        }
    }

    Ok(())
}

pub fn collect_summary(args: &MetadataArgs) -> Result<MetadataSummary> {
    let layout_source = match &args.bcl2fastq_outdir {
        Some(outdir) => ReadLayoutSource::DemultiplexingStats {
            outdir: outdir.clone(),
        },
        None => ReadLayoutSource::RunInfo,
    };
    let run_folder = RunFolder::new(&args.runfolder, layout_source);

    info!(runfolder = %run_folder.path().display(), "collecting run metadata");

    let read_cycles = match run_folder.read_layout()? {
        Some(layout) => extract_read_cycles(&layout),
        None => {
            warn!("no read layout found, read cycles omitted");
            LabelMap::new()
        }
    };

    let (run_parameters, flowcell) = match run_folder.locate_run_parameters()? {
        Some(document) => (
            canonicalize_run_parameters(&document),
            extract_flowcell_type(&document),
        ),
        None => {
            warn!("no run parameters file found");
            (LabelMap::new(), None)
        }
    };

    let pipeline_info_dir = args
        .pipeline_info_dir
        .clone()
        .unwrap_or_else(|| args.runfolder.join("pipeline_info"));
    let demultiplexing = resolve_demultiplexing_info(run_folder.path(), &pipeline_info_dir)?;

    Ok(assemble_summary(
        read_cycles,
        run_parameters,
        flowcell,
        demultiplexing,
    ))
}
