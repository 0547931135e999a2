//! Discovery step

use crate::core::{ApplicationContext, PipelineHandle, Step};
use anyhow::Context;
use async_trait::async_trait;
use tracing::info;

/// Explores the collection and prepares the temp folder
#[derive(Debug, Default)]
pub struct ExploreStructureStep;

#[async_trait]
impl Step for ExploreStructureStep {
    fn name(&self) -> String {
        "ExploreStructure".to_string()
    }

    async fn execute(
        &self,
        context: &mut ApplicationContext,
        _pipeline: &mut PipelineHandle<'_>,
    ) -> anyhow::Result<()> {
        let structure = context
            .services
            .explorer
            .explore(&context.path)
            .with_context(|| format!("Failed to explore '{}'", context.path.display()))?;

        info!(
            "Collection '{}' has {} test cases",
            structure.name,
            structure.test_cases.len()
        );

        if context.environment_file.is_none() {
            context.environment_file = structure.environment_file.clone();
        }
        context.summary.collection_name = structure.name.clone();
        context.structure = structure;

        tokio::fs::create_dir_all(&context.temp_path)
            .await
            .with_context(|| {
                format!("Failed to create temp folder '{}'", context.temp_path.display())
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CancellationToken, Pipeline, Services, EXIT_FAILURE, EXIT_SUCCESS};
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_explore_fills_context() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("demo");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("ping-req.http"), "GET http://localhost").unwrap();
        std::fs::write(root.join("demo-env.json"), "{}").unwrap();

        let mut context = ApplicationContext::new(&root, Services::default());
        context.temp_path = dir.path().join("tmp");
        let mut pipeline = Pipeline::new();
        pipeline
            .add_steps(vec![Arc::new(ExploreStructureStep)])
            .unwrap();

        let code = pipeline.run(&mut context, CancellationToken::new()).await;
        assert_eq!(code, EXIT_SUCCESS);
        assert_eq!(context.structure.test_cases.len(), 1);
        assert_eq!(context.environment_file, Some(root.join("demo-env.json")));
        assert_eq!(context.summary.collection_name, "demo");
        assert!(context.temp_path.is_dir());
    }

    #[tokio::test]
    async fn test_explore_missing_collection_fails_run() {
        let dir = tempdir().unwrap();
        let mut context = ApplicationContext::new(dir.path().join("missing"), Services::default());
        let mut pipeline = Pipeline::new();
        pipeline
            .add_steps(vec![Arc::new(ExploreStructureStep)])
            .unwrap();

        let code = pipeline.run(&mut context, CancellationToken::new()).await;
        assert_eq!(code, EXIT_FAILURE);
    }
}
