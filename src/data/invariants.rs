//! Cross-file business rules the schema cannot express: global id uniqueness,
//! the exactly-3-images rule, image url dedup, and image completeness.
//! Violations are collected, never short-circuited, so one run reports everything.

use std::collections::{HashMap, HashSet};

use crate::data::merge::TaggedProject;

/// Check every invariant over the full merged set. `dataset_count` is the number
/// of dataset files that passed schema validation. Returns human-readable
/// violation messages in checking order (possibly empty).
pub fn check_invariants(projects: &[TaggedProject], dataset_count: usize) -> Vec<String> {
    let mut errors = Vec::new();

    // Global uniqueness of project ids across all datasets; first occurrence wins.
    // Empty ids are skipped here, the schema already rejects them.
    let mut seen_ids: HashMap<&str, &str> = HashMap::new();
    for tagged in projects {
        let id = tagged.project.id.as_str();
        if id.trim().is_empty() {
            continue;
        }
        match seen_ids.get(id) {
            Some(first_file) => errors.push(format!(
                "Duplicate project id \"{id}\" found in {first_file} and {}",
                tagged.source_file
            )),
            None => {
                seen_ids.insert(id, tagged.source_file.as_str());
            }
        }
    }

    // Per-project rules, in encounter order.
    for tagged in projects {
        let project = &tagged.project;
        let images = &project.images;

        if images.len() != 3 {
            errors.push(format!(
                "Project \"{}\" in {} must have exactly 3 images (found {}).",
                project.id,
                tagged.source_file,
                images.len()
            ));
        }

        let urls: Vec<&str> = images
            .iter()
            .map(|image| image.url.as_str())
            .filter(|url| !url.is_empty())
            .collect();
        let unique_urls: HashSet<&str> = urls.iter().copied().collect();
        if unique_urls.len() != urls.len() {
            errors.push(format!(
                "Project \"{}\" in {} has duplicate image.url values; images must be deduplicated.",
                project.id, tagged.source_file
            ));
        }

        for image in images {
            if image.url.is_empty() || image.source_url.is_empty() {
                errors.push(format!(
                    "Project \"{}\" in {} has an image missing url or sourceUrl.",
                    project.id, tagged.source_file
                ));
            }
        }
    }

    // Systemic sanity: dataset files were accepted yet nothing merged.
    if dataset_count > 0 && projects.is_empty() {
        errors.push("No projects found across dataset files.".to_string());
    }

    errors
}
