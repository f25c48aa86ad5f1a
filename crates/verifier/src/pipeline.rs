use loopcheck_ir::Unit;
use rayon::prelude::*;
use tracing::{debug, debug_span};

use crate::{
    error::Fault, progress::EndlessLoopCheck, report::VerificationReport, VerificationCtx,
    VerificationPass, VerifierConfig, VerifyError,
};

/// Ordered passes run over one unit. The run stops at the first error.
#[derive(Default)]
pub struct Pipeline {
    passes: Vec<Box<dyn VerificationPass>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_passes() -> Self {
        let mut pipeline = Self::new();
        pipeline.add_pass(EndlessLoopCheck);
        pipeline
    }

    pub fn add_pass(&mut self, pass: impl VerificationPass + 'static) -> &mut Self {
        self.passes.push(Box::new(pass));
        self
    }

    pub fn pass_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.passes.iter().map(|pass| pass.name())
    }

    /// Names of the passes the shared contract step applies to.
    pub fn contract_checked(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.passes
            .iter()
            .filter(|pass| pass.check_contract())
            .map(|pass| pass.name())
    }

    pub fn run(&mut self, ctx: &VerificationCtx<'_>) -> Result<(), VerifyError> {
        for pass in &mut self.passes {
            let name = pass.name();
            let _span = debug_span!("pass", name).entered();

            let result = pass.run(ctx);

            // Verification is a pure function of its input; a contract-checked pass must
            // answer the same way twice.
            if pass.check_contract() && ctx.cfg.should_check_contracts() && pass.run(ctx) != result
            {
                return Err(Fault::NondeterministicPass { pass: name }.into());
            }

            if let Err(err) = result {
                debug!(pass = name, %err, "verification stopped");
                return Err(err);
            }
        }
        Ok(())
    }
}

pub fn verify_unit(unit: &Unit, cfg: &VerifierConfig) -> Result<(), VerifyError> {
    let _span = debug_span!("verify_unit", unit = unit.name()).entered();
    let ctx = VerificationCtx::new(unit, cfg);
    Pipeline::with_default_passes().run(&ctx)
}

pub fn verify_unit_or_panic(unit: &Unit, cfg: &VerifierConfig) {
    if let Err(err) = verify_unit(unit, cfg) {
        let marker = failure_marker(&err);
        eprintln!("{marker}: unit {}", unit.name());
        eprintln!("{}", err.to_diagnostic());
        panic!("{marker}: {err}");
    }
}

/// Verifies independent units in parallel. Diagnostics are ordered by unit index.
pub fn verify_units(units: &[Unit], cfg: &VerifierConfig) -> VerificationReport {
    let mut results: Vec<_> = units
        .par_iter()
        .enumerate()
        .filter_map(|(idx, unit)| {
            verify_unit(unit, cfg)
                .err()
                .map(|err| (idx, err.to_diagnostic().with_unit(unit.name())))
        })
        .collect();
    results.sort_by_key(|(idx, _)| *idx);

    let mut report = VerificationReport::default();
    for (_, diagnostic) in results {
        report.push(diagnostic, cfg.max_diagnostics);
    }
    report
}

fn failure_marker(err: &VerifyError) -> &'static str {
    match err {
        VerifyError::Violation(_) => "LOOPCHECK_ENDLESS_LOOP",
        VerifyError::Fault(_) => "LOOPCHECK_INTERNAL_FAULT",
    }
}
