//! The node arena of one compiled unit.
use std::fmt;

use cranelift_entity::PrimaryMap;

use crate::node::{LoopHeaderData, MergeData, NodeData, NodeId, NodeKind, SourcePosition};

#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// Identity of the owning unit, e.g. `Counter.spin(int)`.
    pub name: String,
    nodes: PrimaryMap<NodeId, NodeData>,
}

impl Graph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: PrimaryMap::new(),
        }
    }

    pub fn make_node(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(NodeData::new(kind))
    }

    pub fn node_num(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.is_valid(node)
    }

    pub fn kind(&self, node: NodeId) -> &NodeKind {
        &self.nodes[node].kind
    }

    pub fn iter_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys()
    }

    pub fn is_state_mutation(&self, node: NodeId) -> bool {
        matches!(self.kind(node), NodeKind::Mutation)
    }

    pub fn is_loop_header(&self, node: NodeId) -> bool {
        matches!(self.kind(node), NodeKind::LoopHeader(_))
    }

    pub fn is_loop_end(&self, node: NodeId) -> bool {
        matches!(self.kind(node), NodeKind::LoopEnd { .. })
    }

    pub fn is_merge(&self, node: NodeId) -> bool {
        matches!(self.kind(node), NodeKind::Merge(_))
    }

    pub fn header_data(&self, header: NodeId) -> Option<&LoopHeaderData> {
        match self.kind(header) {
            NodeKind::LoopHeader(data) => Some(data),
            _ => None,
        }
    }

    pub fn merge_data(&self, merge: NodeId) -> Option<&MergeData> {
        match self.kind(merge) {
            NodeKind::Merge(data) => Some(data),
            _ => None,
        }
    }

    /// Returns the header a loop end jumps back to.
    pub fn loop_end_header(&self, node: NodeId) -> Option<NodeId> {
        match *self.kind(node) {
            NodeKind::LoopEnd { header } => Some(header),
            _ => None,
        }
    }

    /// Returns the header of the loop a loop exit leaves.
    pub fn loop_exit_header(&self, node: NodeId) -> Option<NodeId> {
        match *self.kind(node) {
            NodeKind::LoopExit { header } => Some(header),
            _ => None,
        }
    }

    pub fn position_of(&self, header: NodeId) -> Option<SourcePosition> {
        self.header_data(header).map(|data| data.position)
    }

    pub fn loop_ends_of(&self, header: NodeId) -> &[NodeId] {
        self.header_data(header)
            .map(|data| data.loop_ends.as_slice())
            .unwrap_or_default()
    }

    pub fn in_degree(&self, header: NodeId) -> usize {
        self.header_data(header)
            .map(LoopHeaderData::in_degree)
            .unwrap_or_default()
    }

    /// Returns the merge nodes attached to `header`, in creation order.
    pub fn merges_of(&self, header: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.header_data(header)
            .map(|data| data.merges.as_slice())
            .unwrap_or_default()
            .iter()
            .copied()
    }

    /// Returns the operand `merge` selects when control arrives through `end`.
    pub fn merge_operand_at(&self, merge: NodeId, end: NodeId) -> Option<NodeId> {
        let data = self.merge_data(merge)?;
        let idx = self.header_data(data.header)?.edge_index(end)?;
        data.operands.get(idx).copied()
    }

    pub(crate) fn header_data_mut(&mut self, header: NodeId) -> Option<&mut LoopHeaderData> {
        match &mut self.nodes[header].kind {
            NodeKind::LoopHeader(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn merge_data_mut(&mut self, merge: NodeId) -> Option<&mut MergeData> {
        match &mut self.nodes[merge].kind {
            NodeKind::Merge(data) => Some(data),
            _ => None,
        }
    }

    pub fn display_node(&self, node: NodeId) -> DisplayNode<'_> {
        DisplayNode { graph: self, node }
    }
}

/// Renders a node as `n<idx>|<Kind>`.
pub struct DisplayNode<'a> {
    graph: &'a Graph,
    node: NodeId,
}

impl fmt::Display for DisplayNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.node, self.graph.kind(self.node).name())
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use super::*;

    #[test]
    fn merge_operand_follows_header_edge_order() {
        let mut graph = Graph::new("test");
        let entry = graph.make_node(NodeKind::Jump);
        let header = graph.make_node(NodeKind::LoopHeader(LoopHeaderData::new(
            SourcePosition::new(0),
        )));
        let end = graph.make_node(NodeKind::LoopEnd { header });
        let data = graph.header_data_mut(header).unwrap();
        data.forward_ends.push(entry);
        data.loop_ends.push(end);

        let init = graph.make_node(NodeKind::Op);
        let merge = graph.make_node(NodeKind::Merge(MergeData {
            header,
            operands: smallvec![init],
        }));
        graph.merge_data_mut(merge).unwrap().operands.push(merge);
        graph.header_data_mut(header).unwrap().merges.push(merge);

        // A merge of another header is not listed here.
        let other = graph.make_node(NodeKind::LoopHeader(LoopHeaderData::new(
            SourcePosition::new(8),
        )));
        graph.make_node(NodeKind::Merge(MergeData {
            header: other,
            operands: smallvec![init, init],
        }));

        assert_eq!(graph.merge_operand_at(merge, entry), Some(init));
        assert_eq!(graph.merge_operand_at(merge, end), Some(merge));
        assert_eq!(graph.merges_of(header).collect::<Vec<_>>(), vec![merge]);
        assert_eq!(graph.merges_of(other).count(), 0);
        assert_eq!(graph.display_node(end).to_string(), "n2|LoopEnd");
    }
}
