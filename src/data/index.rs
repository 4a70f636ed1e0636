//! Index builder: deterministic sort of the merged projects and full overwrite
//! of the two output artifacts (the gallery index and its summary metadata).

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::data::merge::{self, MergeError, PipelineConfig};
use crate::data::project::Project;

pub const SCHEMA_VERSION: &str = "1.0.0";
pub const GENERATOR: &str = "vitrine build_index";
pub const INDEX_FILE_NAME: &str = "projects.index.json";
pub const META_FILE_NAME: &str = "meta.json";

/// The full index document consumed by the gallery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectIndex {
    pub schema_version: String,
    pub generated_at: String,
    pub source: IndexSource,
    pub datasets: Vec<String>,
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSource {
    pub generator: String,
    pub notes: String,
}

/// Summary metadata written next to the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexMeta {
    pub generated_at: String,
    pub dataset_count: usize,
    pub project_count: usize,
    pub dataset_files: Vec<String>,
}

/// What a completed build wrote, for CLI and watch-loop reporting.
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub index_path: PathBuf,
    pub meta_path: PathBuf,
    pub project_count: usize,
    pub dataset_count: usize,
}

#[derive(Debug)]
pub enum BuildError {
    Merge(MergeError),
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Merge(err) => write!(f, "{err}"),
            Self::Serialize { path, source } => {
                write!(f, "unable to serialize '{}': {source}", path.display())
            }
            Self::Write { path, source } => {
                write!(f, "unable to write '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for BuildError {}

impl From<MergeError> for BuildError {
    fn from(err: MergeError) -> Self {
        Self::Merge(err)
    }
}

/// Stable total order: year descending (absent sorts as 0), ties broken by
/// ascending title (absent sorts as the empty string).
pub fn sort_projects(projects: &mut [Project]) {
    projects.sort_by(|a, b| {
        b.sort_year()
            .cmp(&a.sort_year())
            .then_with(|| a.sort_title().cmp(b.sort_title()))
    });
}

/// Render a dataset path for the index: relative to the working directory when
/// possible, with OS separators normalized to forward slashes.
fn normalize_dataset_path(path: &Path) -> String {
    let relative = std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(&cwd).map(Path::to_path_buf).ok())
        .unwrap_or_else(|| path.to_path_buf());
    relative.to_string_lossy().replace('\\', "/")
}

fn write_artifact(path: &Path, payload: &str) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| BuildError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, payload).map_err(|source| BuildError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn serialize_pretty<T: Serialize>(path: &Path, value: &T) -> Result<String, BuildError> {
    let mut payload = serde_json::to_string_pretty(value).map_err(|source| BuildError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    payload.push('\n');
    Ok(payload)
}

/// Merge, sort, and overwrite both artifacts. Nothing is written unless the
/// merge succeeded and both documents serialized.
pub fn build_index(config: &PipelineConfig) -> Result<BuildSummary, BuildError> {
    let outcome = merge::merge_datasets(config)?;

    let mut projects = outcome.projects;
    sort_projects(&mut projects);

    let generated_at = Utc::now().format("%Y-%m-%d").to_string();
    let dataset_files: Vec<String> = outcome
        .files
        .iter()
        .map(|path| normalize_dataset_path(path))
        .collect();

    let index = ProjectIndex {
        schema_version: SCHEMA_VERSION.to_string(),
        generated_at: generated_at.clone(),
        source: IndexSource {
            generator: GENERATOR.to_string(),
            notes: format!("Merged datasets from {}", config.datasets_dir.display()),
        },
        datasets: dataset_files.clone(),
        projects,
    };
    let meta = IndexMeta {
        generated_at,
        dataset_count: dataset_files.len(),
        project_count: index.projects.len(),
        dataset_files,
    };

    let index_path = config.out_dir.join(INDEX_FILE_NAME);
    let meta_path = config.out_dir.join(META_FILE_NAME);

    let index_payload = serialize_pretty(&index_path, &index)?;
    let meta_payload = serialize_pretty(&meta_path, &meta)?;
    write_artifact(&index_path, &index_payload)?;
    write_artifact(&meta_path, &meta_payload)?;

    Ok(BuildSummary {
        index_path,
        meta_path,
        project_count: meta.project_count,
        dataset_count: meta.dataset_count,
    })
}
