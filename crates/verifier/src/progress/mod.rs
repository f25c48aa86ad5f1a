//! Loop progress verification.
//!
//! Every path from a back edge of a loop to its header must make progress: some merge node at
//! the header takes a new value on that back edge, or the path passes an operation that mutates
//! state or leaves an inner loop. The first back edge without progress ends the run.
mod classify;
mod inputs;
mod report;
mod search;

pub use classify::has_progress;
pub use report::EndlessLoop;
pub use search::{walk_back, SearchOutcome};

use tracing::{debug, trace};

use crate::{error::Fault, VerificationCtx, VerificationPass, VerifyError};

#[derive(Debug, Default, Clone, Copy)]
pub struct EndlessLoopCheck;

impl EndlessLoopCheck {
    pub const NAME: &'static str = "endless-loops";
}

impl VerificationPass for EndlessLoopCheck {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn check_contract(&self) -> bool {
        false
    }

    fn run(&mut self, ctx: &VerificationCtx<'_>) -> Result<(), VerifyError> {
        let unit = ctx.unit;
        let graph = &unit.graph;

        if ctx.cfg.should_check_scheduling() {
            inputs::check_scheduling(unit)?;
        }

        for lp in ctx.loops.loops() {
            let header = ctx.loops.header(lp);
            if ctx.cfg.should_check_merge_arity() {
                inputs::check_merge_arity(graph, header)?;
            }

            for &loop_end in ctx.loops.loop_ends(graph, lp) {
                if has_progress(graph, header, loop_end) {
                    trace!(%header, %loop_end, "merge value changes on back edge");
                    continue;
                }

                let Some(start) = unit.schedule.block_of(loop_end) else {
                    return Err(Fault::UnscheduledNode { node: loop_end }.into());
                };

                trace!(%header, %loop_end, %start, "searching back edge for side effects");
                match walk_back(unit, header, loop_end, start) {
                    Ok(SearchOutcome::Justified) => {}
                    Ok(SearchOutcome::Endless(path)) => {
                        let endless = EndlessLoop::new(unit, header, loop_end, path);
                        debug!(%header, %loop_end, trace = %endless.trace, "endless loop found");
                        return Err(endless.into());
                    }
                    Err(fault) => {
                        debug!(%header, %loop_end, %fault, "search invariant broken");
                        return Err(fault.into());
                    }
                }
            }
        }

        Ok(())
    }
}
