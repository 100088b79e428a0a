use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "runmeta",
    version,
    about = "Sequencing run metadata and QC threshold helpers for MultiQC reports"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dump a sequencing metadata section for MultiQC
    Metadata(MetadataArgs),
    /// Convert QC thresholds to MultiQC conditional formatting rules
    QcThresholds(QcThresholdsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct MetadataArgs {
    #[arg(long)]
    pub runfolder: PathBuf,

    #[arg(long)]
    pub bcl2fastq_outdir: Option<PathBuf>,

    #[arg(long)]
    pub pipeline_info_dir: Option<PathBuf>,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct QcThresholdsArgs {
    #[arg(long)]
    pub runfolder: PathBuf,

    #[arg(long)]
    pub config: PathBuf,

    #[arg(long)]
    pub instrument_and_reagent: Option<String>,

    #[arg(long)]
    pub read_length: Option<String>,

    #[arg(long, default_value = "qc_thresholds.yaml")]
    pub output: PathBuf,
}
