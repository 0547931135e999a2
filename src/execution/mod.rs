//! Step generation for discovered collections and test case bookkeeping

pub mod cleanup;
pub mod generation;
pub mod test_case;

pub use cleanup::{remove_temp_folder, CleanUpTemporaryFolderStep};
pub use generation::{collection_steps, test_case_chain, GenerateStepsForCollectionStep};
pub use test_case::{FinishTestCaseStep, StartTestCaseStep};
