pub mod metadata;
pub mod qc_thresholds;
