use tracing::warn;

use super::run_folder::ReadLayout;
use crate::document::Document;
use crate::model::LabelMap;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ReadRecord<'a> {
    num_cycles: &'a str,
    is_indexed: bool,
}

// Stops at the first unreadable record and keeps what came before it.
pub fn extract_read_cycles(layout: &ReadLayout) -> LabelMap {
    match layout {
        ReadLayout::RunInfo(document) => run_info_reads(document),
        ReadLayout::DemultiplexingStats(document) => stats_reads(document),
    }
}

fn run_info_reads(document: &Document) -> LabelMap {
    let Some(reads) = ["RunInfo", "Run", "Reads", "Read"]
        .iter()
        .try_fold(document, |node, tag| node.get(tag))
    else {
        warn!("run info has no reads");
        return LabelMap::new();
    };

    let numbered: Option<Vec<(u32, &Document)>> = reads
        .items()
        .into_iter()
        .map(|read| read_number(read).map(|number| (number, read)))
        .collect();
    let Some(mut numbered) = numbered else {
        warn!("run info read without a usable number");
        return LabelMap::new();
    };
    numbered.sort_by_key(|(number, _)| *number);

    label_reads(numbered.into_iter().map(|(_, read)| read))
}

fn stats_reads(document: &Document) -> LabelMap {
    let reads = document
        .get("ReadInfosForLanes")
        .and_then(|lanes| lanes.items().into_iter().next())
        .and_then(|lane| lane.get("ReadInfos"));
    let Some(reads) = reads else {
        warn!("demultiplexing stats have no read infos");
        return LabelMap::new();
    };

    label_reads(reads.items())
}

fn label_reads<'a>(reads: impl IntoIterator<Item = &'a Document>) -> LabelMap {
    let mut results = LabelMap::new();
    let mut read_counter = 1;
    let mut index_counter = 1;

    for read in reads {
        let Some(record) = read_record(read) else {
            warn!(
                entries = results.len(),
                "stopping at malformed read record"
            );
            break;
        };

        if record.is_indexed {
            results.insert(format!("Index {index_counter} (bp)"), record.num_cycles);
            index_counter += 1;
        } else {
            results.insert(format!("Read {read_counter} (bp)"), record.num_cycles);
            read_counter += 1;
        }
    }

    results
}

fn read_number(read: &Document) -> Option<u32> {
    read.field("Number")?.as_scalar()?.trim().parse().ok()
}

fn read_record(read: &Document) -> Option<ReadRecord<'_>> {
    let num_cycles = read.field("NumCycles")?.as_scalar()?;
    let is_indexed = match read.field("IsIndexedRead")?.as_scalar()? {
        "Y" | "y" | "true" | "True" => true,
        "N" | "n" | "false" | "False" => false,
        _ => return None,
    };

    Some(ReadRecord {
        num_cycles,
        is_indexed,
    })
}

pub fn first_read_length(layout: &ReadLayout) -> Option<u32> {
    extract_read_cycles(layout)
        .get("Read 1 (bp)")?
        .trim()
        .parse()
        .ok()
}
