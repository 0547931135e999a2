//! Expands the discovered structure into step chains

use crate::core::{ApplicationContext, PipelineHandle, Step, StepRef};
use crate::execution::{FinishTestCaseStep, StartTestCaseStep};
use crate::http::{ExecuteRequestStep, ParseRequestStep, ReadRequestFileStep};
use crate::scripts::script_chain;
use crate::structure::{CollectionStructure, TestCase};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Steps for one test case:
/// start → pre-request scripts → request → post-response scripts → finish
pub fn test_case_chain(case: &TestCase) -> Vec<StepRef> {
    let mut steps: Vec<StepRef> = vec![Arc::new(StartTestCaseStep::new(
        case.key(),
        &case.request.path,
    ))];

    for script in &case.pre_request_scripts {
        steps.extend(script_chain(&script.path));
    }

    let request = &case.request.path;
    steps.push(Arc::new(ReadRequestFileStep::new(request)));
    steps.push(Arc::new(ParseRequestStep::new(request)));
    steps.push(Arc::new(ExecuteRequestStep::new(request)));

    for script in &case.post_response_scripts {
        steps.extend(script_chain(&script.path));
    }

    steps.push(Arc::new(FinishTestCaseStep));
    steps
}

/// Top-level script chains followed by every test case chain
pub fn collection_steps(structure: &CollectionStructure) -> Vec<StepRef> {
    let mut steps = Vec::new();
    for script in &structure.scripts {
        steps.extend(script_chain(&script.path));
    }
    for case in &structure.test_cases {
        steps.extend(test_case_chain(case));
    }
    steps
}

/// Inserts the chains for the whole collection right after itself
#[derive(Debug, Default)]
pub struct GenerateStepsForCollectionStep;

#[async_trait]
impl Step for GenerateStepsForCollectionStep {
    fn name(&self) -> String {
        "GenerateStepsForCollection".to_string()
    }

    async fn execute(
        &self,
        context: &mut ApplicationContext,
        pipeline: &mut PipelineHandle<'_>,
    ) -> anyhow::Result<()> {
        let structure = &context.structure;
        let steps = collection_steps(structure);
        info!(
            "Generated {} steps for {} scripts and {} test cases",
            steps.len(),
            structure.scripts.len(),
            structure.test_cases.len()
        );

        context
            .services
            .reporter
            .report_start(&structure.name, structure.test_cases.len())?;
        pipeline.insert_after_current(steps)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{RequestFile, Script};
    use std::path::{Path, PathBuf};

    fn case(name: &str, pre: usize, post: usize) -> TestCase {
        let root = Path::new("/c");
        TestCase {
            name: name.to_string(),
            request: RequestFile {
                path: PathBuf::from(format!("/c/{}-req.http", name)),
                relative_path: PathBuf::from(format!("{}-req.http", name)),
            },
            pre_request_scripts: (0..pre)
                .map(|i| Script::new(format!("/c/{}-{}-init.tps", name, i), root))
                .collect(),
            post_response_scripts: (0..post)
                .map(|i| Script::new(format!("/c/{}-{}-test.tps", name, i), root))
                .collect(),
        }
    }

    fn names(steps: &[StepRef]) -> Vec<String> {
        steps.iter().map(|s| s.name()).collect()
    }

    #[test]
    fn test_case_chain_order() {
        let steps = test_case_chain(&case("get", 1, 1));
        let names = names(&steps);

        assert_eq!(names.len(), 1 + 5 + 3 + 5 + 1);
        assert!(names[0].starts_with("StartTestCase"));
        assert!(names[1].starts_with("ReadScriptFile(/c/get-0-init.tps"));
        assert!(names[6].starts_with("ReadRequestFile"));
        assert!(names[8].starts_with("ExecuteRequest"));
        assert!(names[13].starts_with("ExecuteScript(/c/get-0-test.tps"));
        assert_eq!(names[14], "FinishTestCase");
    }

    #[test]
    fn test_collection_steps_put_top_level_scripts_first() {
        let structure = CollectionStructure {
            root: PathBuf::from("/c"),
            name: "c".to_string(),
            test_cases: vec![case("a", 0, 0), case("b", 0, 0)],
            scripts: vec![Script::new("/c/setup.tps", Path::new("/c"))],
            environment_file: None,
        };

        let names = names(&collection_steps(&structure));
        assert_eq!(names.len(), 5 + 5 + 5);
        assert_eq!(names[0], "ReadScriptFile(/c/setup.tps)");
        assert_eq!(names[5], "StartTestCase(a-req.http)");
        assert_eq!(names[10], "StartTestCase(b-req.http)");
    }
}
