use std::fmt::Write;

use anyhow::Result;

use crate::model::{LabelMap, MetadataSummary};
use crate::util::escape_html;

const SECTION_HEADER: &str = "id: 'sequencing_metadata'
section_name: 'Sequencing Metadata'
plot_type: 'html'
description: 'regarding the sequencing run'
data: |
";

pub fn assemble_summary(
    read_cycles: LabelMap,
    run_parameters: LabelMap,
    flowcell: Option<LabelMap>,
    demultiplexing: Option<LabelMap>,
) -> MetadataSummary {
    let mut fields = read_cycles;
    fields.extend(run_parameters);
    if let Some(flowcell) = flowcell {
        fields.extend(flowcell);
    }

    MetadataSummary {
        fields,
        demultiplexing: demultiplexing.unwrap_or_default(),
    }
}

// MultiQC custom content: YAML header, HTML body under `data`.
pub fn render_summary(summary: &MetadataSummary) -> Result<String> {
    let mut output = String::from(SECTION_HEADER);

    push_definition_list(&mut output, &summary.fields)?;
    if !summary.demultiplexing.is_empty() {
        writeln!(output, "    <h4>Demultiplexing</h4>")?;
        push_definition_list(&mut output, &summary.demultiplexing)?;
    }

    Ok(output)
}

fn push_definition_list(output: &mut String, entries: &LabelMap) -> Result<()> {
    writeln!(output, "    <dl class=\"dl-horizontal\">")?;
    for (label, value) in entries.iter() {
        writeln!(
            output,
            "        <dt>{}</dt><dd><samp>{}</samp></dd>",
            escape_html(label),
            escape_html(value)
        )?;
    }
    writeln!(output, "    </dl>")?;
    Ok(())
}
