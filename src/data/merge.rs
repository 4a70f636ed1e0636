//! Dataset discovery and merge: scan the datasets directory, validate each file
//! against the schema, tag accepted projects with their origin file, and run the
//! invariant checker over the union. All-or-nothing: any failure anywhere fails
//! the merge with one aggregated report.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::data::invariants::check_invariants;
use crate::data::project::Project;
use crate::data::schema::{self, SchemaError};

pub const DEFAULT_DATASETS_DIR: &str = "data/datasets";
pub const DEFAULT_OUT_DIR: &str = "public/data";
pub const SCHEMA_FILE_NAME: &str = "projects.schema.json";

/// Resolved pipeline paths. Defaults are repo-relative; each can be overridden
/// via environment (`VITRINE_DATASETS_DIR`, `VITRINE_SCHEMA_PATH`, `VITRINE_OUT_DIR`).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub datasets_dir: PathBuf,
    pub schema_path: PathBuf,
    pub out_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let datasets_dir = PathBuf::from(DEFAULT_DATASETS_DIR);
        let schema_path = datasets_dir.join(SCHEMA_FILE_NAME);
        PipelineConfig {
            datasets_dir,
            schema_path,
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
        }
    }
}

impl PipelineConfig {
    /// Resolve from the environment, falling back to repo-relative defaults.
    /// The schema path follows the datasets directory unless overridden itself.
    pub fn from_env() -> Self {
        let datasets_dir = env::var("VITRINE_DATASETS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATASETS_DIR));
        let schema_path = env::var("VITRINE_SCHEMA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| datasets_dir.join(SCHEMA_FILE_NAME));
        let out_dir = env::var("VITRINE_OUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUT_DIR));
        PipelineConfig {
            datasets_dir,
            schema_path,
            out_dir,
        }
    }
}

/// A project paired with the dataset file it came from. Provenance lives in this
/// pairing, not in [Project], so it can never leak into the generated index.
#[derive(Debug, Clone)]
pub struct TaggedProject {
    pub project: Project,
    pub source_file: String,
}

/// Result of a successful merge: every discovered file contributed.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub files: Vec<PathBuf>,
    pub projects: Vec<Project>,
}

/// Accumulated per-file failures and invariant violations for one run.
#[derive(Debug, Default, Clone)]
pub struct MergeReport {
    pub schema_failures: Vec<String>,
    pub invariant_errors: Vec<String>,
}

impl MergeReport {
    pub fn is_clean(&self) -> bool {
        self.schema_failures.is_empty() && self.invariant_errors.is_empty()
    }
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut blocks: Vec<String> = self.schema_failures.clone();
        if !self.invariant_errors.is_empty() {
            blocks.push(format!(
                "Invariant checks failed:\n- {}",
                self.invariant_errors.join("\n- ")
            ));
        }
        write!(f, "{}", blocks.join("\n\n"))
    }
}

#[derive(Debug)]
pub enum MergeError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    Schema(SchemaError),
    NoDatasets {
        dir: PathBuf,
    },
    Invalid(MergeReport),
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "unable to read '{}': {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "Invalid JSON in {}: {source}", path.display())
            }
            Self::Schema(err) => write!(f, "{err}"),
            Self::NoDatasets { dir } => {
                write!(f, "No dataset JSON files found in {}", dir.display())
            }
            Self::Invalid(report) => write!(f, "{report}"),
        }
    }
}

impl std::error::Error for MergeError {}

impl From<SchemaError> for MergeError {
    fn from(err: SchemaError) -> Self {
        Self::Schema(err)
    }
}

/// How a dataset file that is not syntactically valid JSON is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseFailureMode {
    /// Record the failure for that file and keep validating the rest (validate-all).
    Record,
    /// Abort the whole run before schema/invariant checks for the batch (merge).
    Abort,
}

/// List eligible dataset files: files directly inside the datasets directory
/// whose name ends in `.json`, excluding the schema document itself.
/// Deterministic lexicographic path order.
pub fn list_dataset_files(datasets_dir: &Path) -> Result<Vec<PathBuf>, MergeError> {
    let entries = fs::read_dir(datasets_dir).map_err(|source| MergeError::Io {
        path: datasets_dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| MergeError::Io {
            path: datasets_dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if !name.to_lowercase().ends_with(".json") || name == SCHEMA_FILE_NAME {
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

fn load_json(path: &Path) -> Result<Value, MergeError> {
    let raw = fs::read_to_string(path).map_err(|source| MergeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| MergeError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Pull the `projects` list out of a schema-accepted document.
/// Absent or malformed lists are treated as empty; the global sanity invariant
/// reports the systemic case.
fn extract_projects(document: &Value) -> Vec<Project> {
    let Some(entries) = document.get("projects").and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
        .collect()
}

fn process_datasets(
    config: &PipelineConfig,
    parse_mode: ParseFailureMode,
) -> Result<MergeOutcome, MergeError> {
    let validator = schema::load_schema(&config.schema_path)?;

    let files = list_dataset_files(&config.datasets_dir)?;
    if files.is_empty() {
        return Err(MergeError::NoDatasets {
            dir: config.datasets_dir.clone(),
        });
    }

    let mut report = MergeReport::default();
    let mut tagged: Vec<TaggedProject> = Vec::new();
    let mut accepted_files = 0_usize;

    for path in &files {
        let document = match load_json(path) {
            Ok(document) => document,
            Err(err @ MergeError::Parse { .. }) if parse_mode == ParseFailureMode::Record => {
                report.schema_failures.push(err.to_string());
                continue;
            }
            Err(err) => return Err(err),
        };

        let violations = schema::validate_document(&validator, &document);
        if !violations.is_empty() {
            report.schema_failures.push(format!(
                "Schema validation failed for {}:\n{}",
                path.display(),
                schema::format_violations(&violations)
            ));
            continue;
        }

        accepted_files += 1;
        for project in extract_projects(&document) {
            tagged.push(TaggedProject {
                project,
                source_file: path.display().to_string(),
            });
        }
    }

    report.invariant_errors = check_invariants(&tagged, accepted_files);
    if !report.is_clean() {
        return Err(MergeError::Invalid(report));
    }

    Ok(MergeOutcome {
        files,
        projects: tagged.into_iter().map(|tagged| tagged.project).collect(),
    })
}

/// Validate every dataset file and the cross-file invariants without producing
/// output. A file that fails to parse is fatal only for that file; the rest of
/// the batch is still checked so one run reports the full defect set.
pub fn validate_all(config: &PipelineConfig) -> Result<MergeOutcome, MergeError> {
    process_datasets(config, ParseFailureMode::Record)
}

/// Merge all dataset files into one clean project list. A file that fails to
/// parse aborts the run before schema/invariant checks for the batch.
pub fn merge_datasets(config: &PipelineConfig) -> Result<MergeOutcome, MergeError> {
    process_datasets(config, ParseFailureMode::Abort)
}
