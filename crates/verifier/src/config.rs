#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationLevel {
    Fast,
    Standard,
    Full,
}

#[derive(Debug, Clone)]
pub struct VerifierConfig {
    pub level: VerificationLevel,
    pub max_diagnostics: usize,
    /// Reject merge nodes whose operand count differs from the header in-degree.
    pub check_merge_arity: bool,
    /// Reject loop headers and loop ends that are not placed where the schedule expects them.
    pub check_scheduling: bool,
    /// Run the shared contract step for passes that take part in it.
    pub check_contracts: bool,
}

impl VerifierConfig {
    pub fn for_level(level: VerificationLevel) -> Self {
        match level {
            VerificationLevel::Fast => Self {
                level,
                max_diagnostics: 200,
                check_merge_arity: false,
                check_scheduling: false,
                check_contracts: false,
            },
            VerificationLevel::Standard => Self {
                level,
                max_diagnostics: 200,
                check_merge_arity: true,
                check_scheduling: false,
                check_contracts: false,
            },
            VerificationLevel::Full => Self {
                level,
                max_diagnostics: 500,
                check_merge_arity: true,
                check_scheduling: true,
                check_contracts: true,
            },
        }
    }

    pub fn should_check_merge_arity(&self) -> bool {
        self.check_merge_arity || matches!(self.level, VerificationLevel::Full)
    }

    pub fn should_check_scheduling(&self) -> bool {
        self.check_scheduling || matches!(self.level, VerificationLevel::Full)
    }

    pub fn should_check_contracts(&self) -> bool {
        self.check_contracts || matches!(self.level, VerificationLevel::Full)
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self::for_level(VerificationLevel::Standard)
    }
}
