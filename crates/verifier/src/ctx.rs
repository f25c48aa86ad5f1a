//! Verification context

use loopcheck_ir::{LoopForest, Unit};

use crate::VerifierConfig;

pub struct VerificationCtx<'a> {
    pub unit: &'a Unit,
    pub loops: LoopForest,
    pub cfg: &'a VerifierConfig,
}

impl<'a> VerificationCtx<'a> {
    pub fn new(unit: &'a Unit, cfg: &'a VerifierConfig) -> Self {
        Self::with_loops(unit, unit.compute_loops(), cfg)
    }

    /// Uses a loop decomposition computed elsewhere.
    pub fn with_loops(unit: &'a Unit, loops: LoopForest, cfg: &'a VerifierConfig) -> Self {
        Self { unit, loops, cfg }
    }
}
