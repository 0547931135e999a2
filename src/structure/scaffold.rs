//! Scaffolding for new test cases

use crate::structure::{POST_RESPONSE_SUFFIX, PRE_REQUEST_SUFFIX, REQUEST_SUFFIX};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const REQUEST_TEMPLATE: &str = "# {name}\nGET {{base-url}}/{name}\nAccept: application/json\n";

const PRE_REQUEST_TEMPLATE: &str = "// Runs before the request is sent\n// set id 1\n";

const POST_RESPONSE_TEMPLATE: &str = "// Runs after the response arrives\ntest \"status is 200\" status == 200\n";

/// Create `<name>-req.http`, `<name>-init.tps` and `<name>-test.tps` in `folder`.
///
/// Nothing is written if any of the three files already exists.
pub fn scaffold_test_case(folder: &Path, name: &str) -> Result<Vec<PathBuf>> {
    if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
        anyhow::bail!("Invalid test case name '{}'", name);
    }

    let files = [
        (REQUEST_SUFFIX, REQUEST_TEMPLATE.replace("{name}", name)),
        (PRE_REQUEST_SUFFIX, PRE_REQUEST_TEMPLATE.to_string()),
        (POST_RESPONSE_SUFFIX, POST_RESPONSE_TEMPLATE.to_string()),
    ]
    .map(|(suffix, content)| (folder.join(format!("{}{}", name, suffix)), content));

    if let Some((existing, _)) = files.iter().find(|(path, _)| path.exists()) {
        anyhow::bail!("'{}' already exists", existing.display());
    }

    std::fs::create_dir_all(folder)
        .with_context(|| format!("Failed to create '{}'", folder.display()))?;
    let mut created = Vec::with_capacity(files.len());
    for (path, content) in files {
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
        created.push(path);
    }
    Ok(created)
}
