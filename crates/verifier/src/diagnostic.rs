use std::fmt;

use loopcheck_ir::{BlockId, NodeId, SourcePosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    EndlessLoop,
    BlockRevisited,
    MergeArityMismatch,
    UnscheduledNode,
    MisplacedLoopHeader,
    NondeterministicPass,
}

impl DiagnosticCode {
    pub const fn as_u16(self) -> u16 {
        match self {
            Self::EndlessLoop => 100,
            Self::BlockRevisited => 900,
            Self::MergeArityMismatch => 901,
            Self::UnscheduledNode => 902,
            Self::MisplacedLoopHeader => 903,
            Self::NondeterministicPass => 904,
        }
    }

    pub fn as_str(self) -> String {
        format!("LP{:04}", self.as_u16())
    }

    /// Internal consistency faults are numbered from 900.
    pub const fn is_fault(self) -> bool {
        self.as_u16() >= 900
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Loop {
        header: NodeId,
        position: SourcePosition,
    },
    Block(BlockId),
    Node(NodeId),
    Pass(&'static str),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loop { header, position } => write!(f, "loop {header} ({position})"),
            Self::Block(block) => write!(f, "{block}"),
            Self::Node(node) => write!(f, "{node}"),
            Self::Pass(name) => write!(f, "pass `{name}`"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    pub primary: Location,
    pub notes: Vec<Note>,
    /// Identity of the unit the diagnostic belongs to.
    pub unit: Option<String>,
    pub snippet: Option<String>,
}

impl Diagnostic {
    pub fn new(
        code: DiagnosticCode,
        severity: Severity,
        message: impl Into<String>,
        primary: Location,
    ) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            primary,
            notes: Vec::new(),
            unit: None,
            snippet: None,
        }
    }

    pub fn error(code: DiagnosticCode, message: impl Into<String>, primary: Location) -> Self {
        Self::new(code, Severity::Error, message, primary)
    }

    pub fn with_note(mut self, message: impl Into<String>) -> Self {
        self.notes.push(Note {
            message: message.into(),
        });
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_snippet(mut self, snippet: Option<String>) -> Self {
        self.snippet = snippet;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_fault(&self) -> bool {
        self.code.is_fault()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {} @ {}",
            self.severity, self.code, self.message, self.primary
        )?;

        if let Some(unit) = &self.unit {
            write!(f, " ({unit})")?;
        }

        writeln!(f)?;

        for note in &self.notes {
            writeln!(f, "  note: {}", note.message)?;
        }

        if let Some(snippet) = &self.snippet {
            write!(f, "{snippet}")?;
        }

        Ok(())
    }
}
