//! Filesystem-backed collection discovery

use crate::structure::{
    relative_to, CollectionStructure, ExploreError, RequestFile, Script, StructureExplorer,
    TestCase, ENVIRONMENT_FILE_SUFFIX, POST_RESPONSE_SUFFIX, PRE_REQUEST_SUFFIX, REQUEST_SUFFIX,
    SCRIPT_EXTENSION,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Walks folders depth-first with entries sorted by name
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemExplorer;

impl StructureExplorer for FileSystemExplorer {
    fn explore(&self, path: &Path) -> Result<CollectionStructure, ExploreError> {
        if !path.exists() {
            return Err(ExploreError::NotFound(path.display().to_string()));
        }

        if path.is_file() {
            return explore_single_file(path);
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "collection".to_string());

        let mut structure = CollectionStructure {
            root: path.to_path_buf(),
            name: name.clone(),
            ..Default::default()
        };

        let environment_file = path.join(format!("{}{}", name, ENVIRONMENT_FILE_SUFFIX));
        if environment_file.is_file() {
            structure.environment_file = Some(environment_file);
        }

        explore_folder(path, path, true, &mut structure)?;
        debug!(
            "Explored '{}': {} test cases, {} top-level scripts",
            path.display(),
            structure.test_cases.len(),
            structure.scripts.len()
        );
        Ok(structure)
    }
}

fn explore_single_file(path: &Path) -> Result<CollectionStructure, ExploreError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if !file_name.ends_with(".http") {
        return Err(ExploreError::Unsupported(path.display().to_string()));
    }

    let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let stem = file_name
        .strip_suffix(REQUEST_SUFFIX)
        .or_else(|| file_name.strip_suffix(".http"))
        .unwrap_or(&file_name)
        .to_string();

    let siblings = sorted_entries(&root)?;
    let test_case = build_test_case(&stem, path, &root, &siblings);

    Ok(CollectionStructure {
        root,
        name: stem,
        test_cases: vec![test_case],
        scripts: Vec::new(),
        environment_file: None,
    })
}

fn explore_folder(
    folder: &Path,
    root: &Path,
    is_root: bool,
    structure: &mut CollectionStructure,
) -> Result<(), ExploreError> {
    let entries = sorted_entries(folder)?;

    for entry in &entries {
        let Some(file_name) = file_name_of(entry) else {
            continue;
        };

        if entry.is_file() {
            if let Some(stem) = file_name.strip_suffix(REQUEST_SUFFIX) {
                structure
                    .test_cases
                    .push(build_test_case(stem, entry, root, &entries));
            } else if is_root && is_top_level_script(&file_name) {
                structure.scripts.push(Script::new(entry.clone(), root));
            }
        }
    }

    for entry in &entries {
        if entry.is_dir() {
            explore_folder(entry, root, false, structure)?;
        }
    }

    Ok(())
}

fn build_test_case(stem: &str, request: &Path, root: &Path, siblings: &[PathBuf]) -> TestCase {
    let scripts_with = |suffix: &str| -> Vec<Script> {
        let exact = format!("{}{}", stem, suffix);
        siblings
            .iter()
            .filter(|p| p.is_file() && file_name_of(p).as_deref() == Some(exact.as_str()))
            .map(|p| Script::new(p.clone(), root))
            .collect()
    };

    TestCase {
        name: stem.to_string(),
        request: RequestFile {
            path: request.to_path_buf(),
            relative_path: relative_to(request, root),
        },
        pre_request_scripts: scripts_with(PRE_REQUEST_SUFFIX),
        post_response_scripts: scripts_with(POST_RESPONSE_SUFFIX),
    }
}

fn is_top_level_script(file_name: &str) -> bool {
    let is_script = Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext == SCRIPT_EXTENSION);
    is_script
        && !file_name.ends_with(PRE_REQUEST_SUFFIX)
        && !file_name.ends_with(POST_RESPONSE_SUFFIX)
}

fn file_name_of(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

fn sorted_entries(folder: &Path) -> Result<Vec<PathBuf>, ExploreError> {
    let io_error = |source| ExploreError::Io {
        path: folder.display().to_string(),
        source,
    };

    let mut entries = fs::read_dir(folder)
        .map_err(io_error)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_error)?;
    entries.sort();
    Ok(entries)
}
