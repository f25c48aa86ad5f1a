mod config;
mod ctx;
mod diagnostic;
mod error;
mod pass;
mod pipeline;
pub mod progress;
mod report;

pub use config::{VerificationLevel, VerifierConfig};
pub use ctx::VerificationCtx;
pub use diagnostic::{Diagnostic, DiagnosticCode, Location, Note, Severity};
pub use error::{Fault, VerifyError};
pub use pass::VerificationPass;
pub use pipeline::{verify_unit, verify_unit_or_panic, verify_units, Pipeline};
pub use progress::{EndlessLoop, EndlessLoopCheck};
pub use report::VerificationReport;

#[macro_export]
macro_rules! debug_verify_unit {
    ($unit:expr) => {{
        if cfg!(debug_assertions) || cfg!(feature = "verify-ir") {
            let cfg = $crate::VerifierConfig::for_level($crate::VerificationLevel::Full);
            $crate::verify_unit_or_panic($unit, &cfg);
        }
    }};
}
