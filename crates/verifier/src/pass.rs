//! Verification pass

use crate::{VerificationCtx, VerifyError};

pub trait VerificationPass {
    fn name(&self) -> &'static str;

    /// Whether the pipeline's shared contract step applies to this pass.
    fn check_contract(&self) -> bool {
        true
    }

    fn run(&mut self, ctx: &VerificationCtx<'_>) -> Result<(), VerifyError>;
}
