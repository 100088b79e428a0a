use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::document::Document;

const RUN_PARAMETERS_FILENAMES: [&str; 2] = ["runParameters.xml", "RunParameters.xml"];
const RUN_INFO_FILENAME: &str = "RunInfo.xml";
const STATS_JSON_PATH: [&str; 2] = ["Stats", "Stats.json"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadLayoutSource {
    RunInfo,
    DemultiplexingStats { outdir: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadLayout {
    RunInfo(Document),
    DemultiplexingStats(Document),
}

#[derive(Debug, Clone)]
pub struct RunFolder {
    path: PathBuf,
    layout_source: ReadLayoutSource,
}

impl RunFolder {
    pub fn new(path: impl Into<PathBuf>, layout_source: ReadLayoutSource) -> Self {
        Self {
            path: path.into(),
            layout_source,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn locate_run_parameters(&self) -> Result<Option<Document>> {
        for filename in RUN_PARAMETERS_FILENAMES {
            let path = self.path.join(filename);
            if path.is_file() {
                debug!(path = %path.display(), "reading run parameters");
                return Document::from_xml_file(&path).map(Some);
            }
        }

        Ok(None)
    }

    pub fn read_run_info(&self) -> Result<Option<Document>> {
        let path = self.path.join(RUN_INFO_FILENAME);
        if !path.is_file() {
            return Ok(None);
        }

        debug!(path = %path.display(), "reading run info");
        Document::from_xml_file(&path).map(Some)
    }

    pub fn read_stats_json(&self, outdir: &Path) -> Result<Option<Document>> {
        let path = STATS_JSON_PATH
            .iter()
            .fold(self.path.join(outdir), |path, part| path.join(part));
        if !path.is_file() {
            return Ok(None);
        }

        debug!(path = %path.display(), "reading demultiplexing stats");
        Document::from_json_file(&path).map(Some)
    }

    pub fn read_layout(&self) -> Result<Option<ReadLayout>> {
        let layout = match &self.layout_source {
            ReadLayoutSource::RunInfo => self.read_run_info()?.map(ReadLayout::RunInfo),
            ReadLayoutSource::DemultiplexingStats { outdir } => self
                .read_stats_json(outdir)?
                .map(ReadLayout::DemultiplexingStats),
        };

        Ok(layout)
    }
}
