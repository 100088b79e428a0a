use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

use crate::model::LabelMap;
use crate::util::read_yaml;

const BCL2FASTQ_VERSION_FILENAME: &str = "bcl2fastq_version";
const SOFTWARE_VERSIONS_FILENAME: &str = "software_versions.yml";
const SOFTWARE_VERSIONS_SUFFIX: &str = "_software_mqc_versions.yml";

// `bcl2fastq_version` in the run folder wins over the pipeline manifest.
pub fn resolve_demultiplexing_info(
    run_folder: &Path,
    pipeline_info_dir: &Path,
) -> Result<Option<LabelMap>> {
    let version_path = run_folder.join(BCL2FASTQ_VERSION_FILENAME);
    if version_path.is_file() {
        let version = read_bcl2fastq_version(&version_path)?;
        info!(version = %version, "using bcl2fastq version file");
        let mut tools = LabelMap::new();
        tools.insert("bcl2fastq", version);
        return Ok(Some(tools));
    }

    match locate_software_versions(pipeline_info_dir)? {
        Some(manifest_path) => {
            info!(path = %manifest_path.display(), "using software version manifest");
            read_software_versions(&manifest_path).map(Some)
        }
        None => {
            debug!(
                run_folder = %run_folder.display(),
                pipeline_info = %pipeline_info_dir.display(),
                "no demultiplexing provenance found"
            );
            Ok(None)
        }
    }
}

pub fn read_bcl2fastq_version(path: &Path) -> Result<String> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let pattern = Regex::new(r"v([^v]*)").context("failed to compile version regex")?;

    let version = pattern
        .captures(&raw)
        .and_then(|captures| captures.get(1))
        .map(|capture| capture.as_str().trim().to_string())
        .with_context(|| format!("no version string in {}", path.display()))?;

    Ok(version)
}

pub fn locate_software_versions(pipeline_info_dir: &Path) -> Result<Option<PathBuf>> {
    let exact = pipeline_info_dir.join(SOFTWARE_VERSIONS_FILENAME);
    if exact.is_file() {
        return Ok(Some(exact));
    }

    let pattern = format!(
        "{}/*{}",
        glob::Pattern::escape(&pipeline_info_dir.to_string_lossy()),
        SOFTWARE_VERSIONS_SUFFIX
    );
    let mut matches = glob::glob(&pattern)
        .with_context(|| format!("invalid manifest pattern: {pattern}"))?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("failed to list {}", pipeline_info_dir.display()))?;
    matches.retain(|path| path.is_file());

    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.pop()),
        _ => {
            let names = matches
                .iter()
                .map(|path| path.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            bail!("ambiguous software version manifests: {names}")
        }
    }
}

pub fn read_software_versions(path: &Path) -> Result<LabelMap> {
    let manifest: Mapping = read_yaml(path)?;
    let mut tools = LabelMap::new();

    for (category, tool_versions) in &manifest {
        let category = scalar_text(category)
            .with_context(|| format!("non-scalar category in {}", path.display()))?;
        let Value::Mapping(tool_versions) = tool_versions else {
            bail!(
                "category {category} in {} is not a tool -> version mapping",
                path.display()
            );
        };

        for (tool, version) in tool_versions {
            let tool = scalar_text(tool)
                .with_context(|| format!("non-scalar tool name under {category}"))?;
            let version = scalar_text(version)
                .with_context(|| format!("non-scalar version for {tool}"))?;
            tools.insert(tool, version);
        }
    }

    Ok(tools)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
