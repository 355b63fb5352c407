//! The manual gate between the test publish and the production publish.

use crate::config::PublishConfig;
use crate::error::{Error, Result};
use crate::layout::ReleaseLayout;

use super::{Stage, StageContext, StageId, StageOutcome, StagePlan};

pub const CONFIRMATION_PROMPT: &str = "Press Ctrl+C to cancel or Enter to continue...";

/// Operator decision port.
///
/// `Ok(false)` means the operator declined (or input ended); the pipeline
/// treats it as cancellation.
pub trait Confirmation {
    fn confirm(&self, message: &str) -> Result<bool>;
}

/// Pre-approved confirmation for unattended runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirm;

impl Confirmation for AutoConfirm {
    fn confirm(&self, _message: &str) -> Result<bool> {
        Ok(true)
    }
}

pub struct AwaitConfirmationStage;

impl Stage for AwaitConfirmationStage {
    fn id(&self) -> StageId {
        StageId::AwaitConfirmation
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> Result<StageOutcome> {
        if ctx.confirmation.confirm(CONFIRMATION_PROMPT)? {
            Ok(StageOutcome::done())
        } else {
            Err(Error::operator_cancelled(self.id().as_str()))
        }
    }

    fn plan(&self, _config: &PublishConfig, _layout: &ReleaseLayout) -> StagePlan {
        StagePlan::default()
    }
}
