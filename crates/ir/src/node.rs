//! Operation nodes of the IR graph.
use std::fmt;

use cranelift_entity::entity_impl;
use smallvec::SmallVec;

/// An opaque reference to [`NodeData`].
#[derive(Clone, PartialEq, Eq, Copy, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);
entity_impl!(NodeId, "n");

/// Position of a node in the source unit, expressed as a bytecode index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourcePosition {
    pub bci: u32,
}

impl SourcePosition {
    pub fn new(bci: u32) -> Self {
        Self { bci }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bci {}", self.bci)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    pub kind: NodeKind,
}

impl NodeData {
    pub fn new(kind: NodeKind) -> Self {
        Self { kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Entry of the unit.
    Start,
    /// Pure computation.
    Op,
    /// Writes observable state (memory, globals, calls with effects).
    Mutation,
    /// Two-way conditional terminator.
    Branch,
    /// Forward jump; also the forward entry end of a loop header.
    Jump,
    /// Control merge that is not a loop header.
    Join,
    Return,
    LoopHeader(LoopHeaderData),
    /// Back-edge terminator of the loop headed by `header`.
    LoopEnd { header: NodeId },
    /// Exit from the loop headed by `header`.
    LoopExit { header: NodeId },
    /// Header-resident value selector.
    Merge(MergeData),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Op => "Op",
            Self::Mutation => "Mutation",
            Self::Branch => "Branch",
            Self::Jump => "Jump",
            Self::Join => "Join",
            Self::Return => "Return",
            Self::LoopHeader(_) => "LoopHeader",
            Self::LoopEnd { .. } => "LoopEnd",
            Self::LoopExit { .. } => "LoopExit",
            Self::Merge(_) => "Merge",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoopHeaderData {
    pub position: SourcePosition,
    /// Ends entering the loop from outside, in edge order.
    pub forward_ends: SmallVec<[NodeId; 2]>,
    /// Back-edge terminators, in edge order.
    pub loop_ends: SmallVec<[NodeId; 4]>,
    /// Merge nodes resident at this header, in creation order.
    pub merges: SmallVec<[NodeId; 2]>,
}

impl LoopHeaderData {
    pub fn new(position: SourcePosition) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Number of incoming control edges.
    pub fn in_degree(&self) -> usize {
        self.forward_ends.len() + self.loop_ends.len()
    }

    /// Returns the operand slot that `end` occupies in the merges of this header.
    pub fn edge_index(&self, end: NodeId) -> Option<usize> {
        if let Some(idx) = self.forward_ends.iter().position(|&e| e == end) {
            return Some(idx);
        }
        self.loop_ends
            .iter()
            .position(|&e| e == end)
            .map(|idx| self.forward_ends.len() + idx)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeData {
    pub header: NodeId,
    /// One operand per incoming edge of `header`. An operand equal to the merge
    /// itself means no new value flows on that edge.
    pub operands: SmallVec<[NodeId; 4]>,
}
