//! Failure kinds of a verification run.
//!
//! A run fails either because a loop of the verified unit is endless ([`VerifyError::Violation`])
//! or because a pass found its inputs or its own traversal in a state that should be impossible
//! ([`VerifyError::Fault`]). The two never overlap.
mod fault;

pub use fault::Fault;

use thiserror::Error;

use crate::{diagnostic::Diagnostic, progress::EndlessLoop};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("{0}")]
    Violation(Box<EndlessLoop>),
    #[error("internal consistency fault: {0}")]
    Fault(#[from] Fault),
}

impl VerifyError {
    pub fn is_violation(&self) -> bool {
        matches!(self, Self::Violation(_))
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault(_))
    }

    pub fn as_violation(&self) -> Option<&EndlessLoop> {
        match self {
            Self::Violation(endless) => Some(endless),
            Self::Fault(_) => None,
        }
    }

    pub fn as_fault(&self) -> Option<&Fault> {
        match self {
            Self::Violation(_) => None,
            Self::Fault(fault) => Some(fault),
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Violation(endless) => endless.to_diagnostic(),
            Self::Fault(fault) => fault.to_diagnostic(),
        }
    }
}

impl From<EndlessLoop> for VerifyError {
    fn from(endless: EndlessLoop) -> Self {
        Self::Violation(Box::new(endless))
    }
}
