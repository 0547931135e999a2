//! CLI output formatting

use crate::structure::CollectionStructure;
use console::Emoji;

// Re-export style
pub use console::style;

pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "+ ");

/// Human-readable listing of a collection
pub fn format_structure(structure: &CollectionStructure) -> Vec<String> {
    let mut lines = vec![format!(
        "{}{} {}",
        FOLDER,
        style(&structure.name).bold(),
        style(structure.root.display()).dim()
    )];

    if let Some(env) = &structure.environment_file {
        lines.push(format!("  environments: {}", style(env.display()).cyan()));
    }
    for script in &structure.scripts {
        lines.push(format!("  script {}", style(script.relative_path.display()).cyan()));
    }
    for case in &structure.test_cases {
        lines.push(format!("  {}", style(case.key()).bold()));
        for script in &case.pre_request_scripts {
            lines.push(format!("    pre  {}", style(script.relative_path.display()).dim()));
        }
        for script in &case.post_response_scripts {
            lines.push(format!("    post {}", style(script.relative_path.display()).dim()));
        }
    }
    lines
}

/// JSON view of a collection
pub fn structure_json(structure: &CollectionStructure) -> serde_json::Value {
    let paths = |scripts: &[crate::structure::Script]| -> Vec<String> {
        scripts
            .iter()
            .map(|s| s.relative_path.display().to_string())
            .collect()
    };

    serde_json::json!({
        "name": structure.name,
        "root": structure.root.display().to_string(),
        "environment_file": structure.environment_file.as_ref().map(|p| p.display().to_string()),
        "scripts": paths(&structure.scripts),
        "test_cases": structure.test_cases.iter().map(|case| serde_json::json!({
            "name": case.name,
            "request": case.key(),
            "pre_request_scripts": paths(&case.pre_request_scripts),
            "post_response_scripts": paths(&case.post_response_scripts),
        })).collect::<Vec<_>>(),
    })
}
