//! Temp folder removal

use crate::core::{ApplicationContext, PipelineHandle, Step};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, warn};

/// Delete the run's temp folder; failures are only logged
pub async fn remove_temp_folder(path: &Path) {
    if !path.exists() {
        return;
    }
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => debug!("Removed temp folder {}", path.display()),
        Err(e) => warn!("Failed to remove temp folder '{}': {}", path.display(), e),
    }
}

#[derive(Debug, Default)]
pub struct CleanUpTemporaryFolderStep;

#[async_trait]
impl Step for CleanUpTemporaryFolderStep {
    fn name(&self) -> String {
        "CleanUpTemporaryFolder".to_string()
    }

    async fn execute(
        &self,
        context: &mut ApplicationContext,
        _pipeline: &mut PipelineHandle<'_>,
    ) -> anyhow::Result<()> {
        remove_temp_folder(&context.temp_path).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CancellationToken, Pipeline, Services, EXIT_SUCCESS};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_removes_temp_folder() {
        let dir = tempfile::tempdir().unwrap();
        let temp = dir.path().join("run");
        std::fs::create_dir_all(temp.join("nested")).unwrap();
        std::fs::write(temp.join("nested/a.tps"), "set a 1").unwrap();

        let mut context = ApplicationContext::new(dir.path(), Services::default());
        context.temp_path = temp.clone();
        let mut pipeline = Pipeline::new();
        pipeline
            .add_steps(vec![Arc::new(CleanUpTemporaryFolderStep)])
            .unwrap();

        assert_eq!(pipeline.run(&mut context, CancellationToken::new()).await, EXIT_SUCCESS);
        assert!(!temp.exists());
    }

    #[tokio::test]
    async fn test_missing_folder_is_fine() {
        remove_temp_folder(Path::new("/nonexistent/tpie/run")).await;
    }
}
