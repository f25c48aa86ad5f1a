use loopcheck_ir::{BlockId, NodeId};
use thiserror::Error;

use crate::diagnostic::{Diagnostic, DiagnosticCode, Location};

/// A broken internal invariant. Faults point at a bug in a pass or in the schedule and loop
/// structure handed to it, never at the verified unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("{block} visited twice on one backward path from loop end {loop_end}")]
    BlockRevisited {
        block: BlockId,
        loop_end: NodeId,
        /// The path up to, but excluding, the repeated visit.
        path: Vec<BlockId>,
    },

    #[error("merge {merge} has {found} operand(s) but its header {header} has {expected} incoming edge(s)")]
    MergeArityMismatch {
        merge: NodeId,
        header: NodeId,
        expected: usize,
        found: usize,
    },

    #[error("{node} is not scheduled in any block")]
    UnscheduledNode { node: NodeId },

    #[error("loop header {header} does not open {block}")]
    MisplacedLoopHeader { header: NodeId, block: BlockId },

    #[error("pass `{pass}` gave different results on identical input")]
    NondeterministicPass { pass: &'static str },
}

impl Fault {
    pub fn code(&self) -> DiagnosticCode {
        match self {
            Self::BlockRevisited { .. } => DiagnosticCode::BlockRevisited,
            Self::MergeArityMismatch { .. } => DiagnosticCode::MergeArityMismatch,
            Self::UnscheduledNode { .. } => DiagnosticCode::UnscheduledNode,
            Self::MisplacedLoopHeader { .. } => DiagnosticCode::MisplacedLoopHeader,
            Self::NondeterministicPass { .. } => DiagnosticCode::NondeterministicPass,
        }
    }

    pub fn location(&self) -> Location {
        match *self {
            Self::BlockRevisited { block, .. } => Location::Block(block),
            Self::MergeArityMismatch { merge, .. } => Location::Node(merge),
            Self::UnscheduledNode { node } => Location::Node(node),
            Self::MisplacedLoopHeader { block, .. } => Location::Block(block),
            Self::NondeterministicPass { pass } => Location::Pass(pass),
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.code(), self.to_string(), self.location());
        match self {
            Self::BlockRevisited { path, .. } => {
                let path = path
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" -> ");
                diag.with_note(format!("path so far: {path}"))
            }
            _ => diag,
        }
    }
}
